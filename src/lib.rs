//! # ada-babel
//!
//! Evaluate Ada/SPARK source blocks embedded in literate documents.
//!
//! This crate provides:
//! - Header argument parsing and resolution against documented defaults
//! - Variable substitution and template wrapping of block bodies
//! - Temp artifact naming keyed by unit name or a per-context counter
//! - Compile-and-run through `gnatmake`, or proof through `gnatprove`
//! - Tangle hooks that stamp exported files with a "do not edit" banner
//! - CLI tool (`ada-babel`) for editor integrations to shell out to
//!
//! ## Usage
//!
//! ```no_run
//! use ada_babel::{Config, Orchestrator, RawOptions, SystemRunner};
//!
//! # fn main() -> ada_babel::Result<()> {
//! let config = Config::default();
//! let mut orch = Orchestrator::from_config(&config, false, SystemRunner)?;
//!
//! let raw = RawOptions::parse_header_args(":template proc_main :var N=3")?;
//! let result = orch.evaluate("   Put_Line (Integer'Image (N * 14));", &raw)?;
//! print!("{}", result.output());
//! # Ok(())
//! # }
//! ```
//!
//! External tool diagnostics never become `Err`: a compiler error, a failing
//! program or an unproved check comes back as
//! [`Evaluation::ToolReported`] carrying the tool's output verbatim.

pub mod artifact;
pub mod command;
pub mod config;
pub mod error;
pub mod expand;
pub mod orchestrator;
pub mod params;
pub mod project;
pub mod runner;
pub mod tangle;

pub use artifact::{ArtifactNamer, TempRoot};
pub use command::{CommandLine, Toolchain};
pub use config::Config;
pub use error::{Error, Result};
pub use expand::{expand_body, substitute_vars, Template, TemplateRegistry};
pub use orchestrator::{Evaluation, ExecutePlan, Orchestrator, Plan, ProvePlan, Stage};
pub use params::{Binding, BlockParams, ProofMode, RawOptions, Report, Version, Warnings};
pub use runner::{CapturedOutput, SystemRunner, ToolRunner};
pub use tangle::{tangle_block, FileHeader, TangleGuard, TangleHooks, TangleSettings};
