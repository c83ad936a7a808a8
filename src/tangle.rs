//! Tangle hooks
//!
//! Exporting a block to a standalone source file writes a file header chosen
//! by [`TangleSettings::header`]. Around an export the hooks swap that
//! setting for the generated-file banner and put the previous value back
//! afterwards. The backup is one deep: exports do not nest.

use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::error::{Error, Result};

const RULE: &str =
    "-------------------------------------------------------------------------------";

/// What goes at the top of a tangled file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileHeader {
    #[default]
    None,
    /// Free text, each line written as an Ada comment
    Comment(String),
    /// The "generated, do not edit" banner naming the origin document
    GeneratedBanner,
}

impl FileHeader {
    pub fn render(&self, origin: &str, at: NaiveDateTime) -> String {
        match self {
            FileHeader::None => String::new(),
            FileHeader::Comment(text) => text
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        "--\n".to_string()
                    } else {
                        format!("--  {line}\n")
                    }
                })
                .collect(),
            FileHeader::GeneratedBanner => format!(
                "{RULE}\n\
                 --  Generated from {origin} on {}\n\
                 --  DO NOT EDIT: changes are overwritten the next time the document is tangled.\n\
                 {RULE}\n",
                at.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
}

/// Export configuration touched by the hooks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TangleSettings {
    pub header: FileHeader,
}

/// Save/restore state for the header setting
#[derive(Debug, Default)]
pub struct TangleHooks {
    backup: Option<FileHeader>,
}

impl TangleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self) -> bool {
        self.backup.is_some()
    }

    /// Install the banner, remembering the current header
    pub fn before_tangle(&mut self, settings: &mut TangleSettings) -> Result<()> {
        if self.backup.is_some() {
            return Err(Error::TangleInProgress);
        }
        let previous = std::mem::replace(&mut settings.header, FileHeader::GeneratedBanner);
        debug!(?previous, "installed generated-file banner");
        self.backup = Some(previous);
        Ok(())
    }

    /// Restore the header saved by `before_tangle`; no-op without one
    pub fn after_tangle(&mut self, settings: &mut TangleSettings) {
        if let Some(previous) = self.backup.take() {
            debug!(?previous, "restored file header");
            settings.header = previous;
        }
    }

    /// Bracket a scope with both hooks; the header is restored on drop
    pub fn guard<'a>(&'a mut self, settings: &'a mut TangleSettings) -> Result<TangleGuard<'a>> {
        self.before_tangle(settings)?;
        Ok(TangleGuard {
            hooks: self,
            settings,
        })
    }
}

/// Scope in which the banner is installed
pub struct TangleGuard<'a> {
    hooks: &'a mut TangleHooks,
    settings: &'a mut TangleSettings,
}

impl TangleGuard<'_> {
    pub fn settings(&self) -> &TangleSettings {
        &*self.settings
    }
}

impl Drop for TangleGuard<'_> {
    fn drop(&mut self) {
        self.hooks.after_tangle(&mut *self.settings);
    }
}

/// Write `body` to `target` under the header the settings currently select
pub fn tangle_block(settings: &TangleSettings, origin: &str, body: &str, target: &Path) -> Result<()> {
    tangle_block_at(settings, origin, body, target, Local::now().naive_local())
}

pub fn tangle_block_at(
    settings: &TangleSettings,
    origin: &str,
    body: &str,
    target: &Path,
    at: NaiveDateTime,
) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut text = settings.header.render(origin, at);
    text.push_str(body);
    if !text.ends_with('\n') {
        text.push('\n');
    }
    fs::write(target, text).map_err(|e| Error::io(target, e))?;
    debug!(path = %target.display(), origin, "tangled block");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_hooks_restore_previous_header() {
        let original = FileHeader::Comment("Copyright ACME".into());
        let mut settings = TangleSettings {
            header: original.clone(),
        };
        let mut hooks = TangleHooks::new();

        hooks.before_tangle(&mut settings).unwrap();
        assert_eq!(settings.header, FileHeader::GeneratedBanner);
        assert!(hooks.in_progress());

        hooks.after_tangle(&mut settings);
        assert_eq!(settings.header, original);
        assert!(!hooks.in_progress());
    }

    #[test]
    fn test_nested_before_refused() {
        let mut settings = TangleSettings::default();
        let mut hooks = TangleHooks::new();
        hooks.before_tangle(&mut settings).unwrap();
        assert!(matches!(hooks.before_tangle(&mut settings), Err(Error::TangleInProgress)));

        hooks.after_tangle(&mut settings);
        assert_eq!(settings.header, FileHeader::None);
        hooks.after_tangle(&mut settings);
        assert_eq!(settings.header, FileHeader::None);
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let mut settings = TangleSettings {
            header: FileHeader::Comment("keep".into()),
        };
        let mut hooks = TangleHooks::new();
        {
            let guard = hooks.guard(&mut settings).unwrap();
            assert_eq!(guard.settings().header, FileHeader::GeneratedBanner);
        }
        assert_eq!(settings.header, FileHeader::Comment("keep".into()));
        assert!(!hooks.in_progress());
    }

    #[test]
    fn test_banner_format() {
        let text = FileHeader::GeneratedBanner.render("notes/sorting.org", noon());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], RULE);
        assert_eq!(lines[1], "--  Generated from notes/sorting.org on 2024-03-01 12:00:00");
        assert!(lines[2].contains("DO NOT EDIT"));
        assert_eq!(lines[3], RULE);
    }

    #[test]
    fn test_tangle_block_writes_header_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("src").join("hello.adb");
        let mut settings = TangleSettings::default();
        let mut hooks = TangleHooks::new();

        {
            let guard = hooks.guard(&mut settings).unwrap();
            tangle_block_at(guard.settings(), "doc.org", "procedure Hello is begin null; end;", &target, noon())
                .unwrap();
        }

        let text = fs::read_to_string(&target).unwrap();
        assert!(text.starts_with(RULE));
        assert!(text.contains("Generated from doc.org"));
        assert!(text.ends_with("procedure Hello is begin null; end;\n"));
        assert_eq!(settings.header, FileHeader::None);
    }

    #[test]
    fn test_comment_header() {
        let header = FileHeader::Comment("line one\n\nline two".into());
        assert_eq!(header.render("x", noon()), "--  line one\n--\n--  line two\n");
    }
}
