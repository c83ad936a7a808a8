//! Ephemeral GNAT project descriptor for proof runs

use std::path::Path;

/// Directory the prover leaves its analysis state in, under the project directory
pub const PROVER_WORK_DIR: &str = "gnatprove";

/// Project name derived from the project file stem.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, and a leading digit or
/// underscore gets a `P_` prefix so the result is a valid Ada identifier.
pub fn project_name(project_file: &Path) -> String {
    let stem = project_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        name.insert_str(0, "P_");
    }
    name
}

/// Project declaring `source` as both its only source file and its main
pub fn render_descriptor(project_file: &Path, source: &Path) -> String {
    let name = project_name(project_file);
    let file = source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        "project {name} is\n   \
         for Source_Files use (\"{file}\");\n   \
         for Main use (\"{file}\");\n\
         end {name};\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_names_one_source() {
        let text = render_descriptor(
            Path::new("/tmp/ab/ada_gpr_000003.gpr"),
            Path::new("/tmp/ab/ada-src-000003.adb"),
        );
        assert_eq!(
            text,
            "project ada_gpr_000003 is\n   \
             for Source_Files use (\"ada-src-000003.adb\");\n   \
             for Main use (\"ada-src-000003.adb\");\n\
             end ada_gpr_000003;\n"
        );
    }

    #[test]
    fn test_project_name_is_an_identifier() {
        assert_eq!(project_name(Path::new("hello.gpr")), "hello");
        assert_eq!(project_name(Path::new("my-unit.gpr")), "my_unit");
        assert_eq!(project_name(Path::new("2fast.gpr")), "P_2fast");
    }
}
