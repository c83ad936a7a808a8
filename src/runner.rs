//! Synchronous external tool invocation
//!
//! A block evaluation runs at most two tools in sequence. Each run blocks
//! until the tool exits; there is no timeout and no retry.

use std::path::Path;
use std::process::Command;

use serde::Serialize;
use tracing::info;

use crate::command::CommandLine;
use crate::error::{Error, Result};

/// Exit status and both output streams of one tool run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapturedOutput {
    /// `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        CapturedOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        CapturedOutput {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Non-zero or missing exit status, or anything on stderr
    pub fn reported_problems(&self) -> bool {
        self.status != Some(0) || !self.stderr.trim().is_empty()
    }

    /// Standard output followed by standard error
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let mut text = self.stdout.clone();
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&self.stderr);
                text
            }
        }
    }
}

/// Seam between the orchestrator and process spawning
pub trait ToolRunner {
    /// Run `command` in `working_dir` and wait for it.
    ///
    /// Returns `Err` only when the tool could not be started.
    fn run(&mut self, command: &CommandLine, working_dir: &Path) -> Result<CapturedOutput>;
}

/// Runs tools as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, command: &CommandLine, working_dir: &Path) -> Result<CapturedOutput> {
        info!(command = %command, dir = %working_dir.display(), "running tool");
        let output = Command::new(&command.program)
            .args(&command.args)
            .current_dir(working_dir)
            .output()
            .map_err(|source| Error::Spawn {
                program: command.program.clone(),
                source,
            })?;

        Ok(CapturedOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
