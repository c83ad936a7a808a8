//! Error types for Ada Babel
//!
//! External tool diagnostics are not errors: they come back as
//! [`Evaluation::ToolReported`](crate::Evaluation::ToolReported). Everything
//! here stops an evaluation before or instead of running a tool.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or running a block
#[derive(Debug, Error)]
pub enum Error {
    /// A recognized option carried a value outside its domain
    #[error("invalid value `{value}` for `:{key}` (expected {expected})")]
    InvalidParameter {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// Ada blocks are evaluated one shot at a time
    #[error("Ada/SPARK blocks do not support sessions (requested session `{0}`)")]
    SessionUnsupported(String),

    /// The block asked for a template nobody registered
    #[error("no template registered under `{0}`")]
    UnknownTemplate(String),

    /// A configured template failed validation
    #[error("invalid template `{name}`: {reason}")]
    InvalidTemplate { name: String, reason: String },

    /// `before_tangle` called again before `after_tangle`
    #[error("a tangle is already in progress; its header backup would be lost")]
    TangleInProgress,

    /// Bad configuration file or override
    #[error("configuration error: {0}")]
    Config(String),

    /// The external tool could not be started at all
    #[error("failed to invoke `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem failure on a temp artifact or tangle target
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
