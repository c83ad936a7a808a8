//! Command-line construction for the compiler, the produced binary and the prover

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::params::{BlockParams, Version};

/// A program plus its arguments, never passed through a shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        CommandLine {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Split a configured base command such as `"gnatmake -q"` into program and leading args
    pub fn from_base(base: &str) -> Result<Self> {
        let mut words = base.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| Error::Config("empty tool command".into()))?;
        Ok(CommandLine {
            program: program.to_string(),
            args: words.map(str::to_string).collect(),
        })
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(&mut self, path: &Path) -> &mut Self {
        self.arg(path.to_string_lossy())
    }

    pub fn contains(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> String {
    if !word.is_empty() && !word.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// The external tools and their global settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compile_cmd: String,
    pub prove_cmd: String,
    pub assertions_flag: String,
    /// Used when a block leaves `:version` unset; `None` emits no version flag
    pub default_version: Option<Version>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            compile_cmd: "gnatmake".into(),
            prove_cmd: "gnatprove".into(),
            assertions_flag: "-gnata".into(),
            default_version: Some(Version::Ada2012),
        }
    }
}

impl Toolchain {
    /// `<compile> [-gnat<version>] [<assertions>] -o <binary> <source>`
    pub fn compile_command(
        &self,
        params: &BlockParams,
        source: &Path,
        binary: &Path,
    ) -> Result<CommandLine> {
        let mut cmd = CommandLine::from_base(&self.compile_cmd)?;
        if let Some(version) = Version::effective(params.version, self.default_version) {
            cmd.arg(version.compiler_flag());
        }
        if params.assertions && !self.assertions_flag.is_empty() {
            cmd.arg(self.assertions_flag.clone());
        }
        cmd.arg("-o").path_arg(binary).path_arg(source);
        Ok(cmd)
    }

    /// The produced binary, run with no arguments
    pub fn run_command(&self, binary: &Path) -> CommandLine {
        CommandLine::new(binary.to_string_lossy())
    }

    /// `<prove> -P<project> [flags...] -u <source file>`
    ///
    /// `level`, `mode` and `report` always resolve to a value and are always
    /// passed; the prover's own defaults differ from the block defaults.
    pub fn prove_command(
        &self,
        params: &BlockParams,
        project: &Path,
        source: &Path,
    ) -> Result<CommandLine> {
        let mut cmd = CommandLine::from_base(&self.prove_cmd)?;
        cmd.arg(format!("-P{}", project.display()));
        if params.assumptions {
            cmd.arg("--assumptions");
        }
        // level, mode and report are always pinned, defaults included
        cmd.arg(format!("--level={}", params.level));
        cmd.arg(format!("--mode={}", params.mode));
        if params.pedantic {
            cmd.arg("--pedantic");
        }
        cmd.arg(format!("--report={}", params.report));
        if let Some(warnings) = params.warnings {
            cmd.arg(format!("--warnings={warnings}"));
        }

        let unit_file = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string_lossy().into_owned());
        cmd.arg("-u").arg(unit_file);
        Ok(cmd)
    }
}
