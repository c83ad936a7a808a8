//! Block input and option flags
//!
//! Options come from an org-style `--header` string and from individual
//! flags; a flag wins over the same key in the header string.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use ada_babel::RawOptions;

/// Flags shared by every block-evaluating subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct BlockArgs {
    /// Block source file (`-` or absent reads standard input)
    pub block: Option<PathBuf>,

    /// Header arguments, e.g. ":unit hello :var N=3"
    #[arg(long = "header")]
    pub header: Option<String>,

    /// Ada unit name used for artifact file names
    #[arg(long)]
    pub unit: Option<String>,

    /// Ada language version (0, 83, 95, 2005, 2012, 2022)
    #[arg(long = "version")]
    pub ada_version: Option<String>,

    /// Enable assertions (yes/no)
    #[arg(long)]
    pub assertions: Option<String>,

    /// Template wrapping the block body
    #[arg(long)]
    pub template: Option<String>,

    /// Space separated units to `with` and `use`
    #[arg(long = "with")]
    pub with_units: Option<String>,

    /// Variable binding NAME=value
    #[arg(long = "var", action = clap::ArgAction::Append)]
    pub vars: Vec<String>,

    /// Evaluate in a remote working context
    #[arg(long)]
    pub remote: bool,
}

/// Prover flags
#[derive(Args, Debug, Clone, Default)]
pub struct ProofArgs {
    /// Proof level (0-4)
    #[arg(long)]
    pub level: Option<String>,

    /// Analysis mode (check, check_all, flow, prove, all)
    #[arg(long)]
    pub mode: Option<String>,

    /// Report mode (fail, all, provers, statistics)
    #[arg(long)]
    pub report: Option<String>,

    /// Warnings policy (off, continue, error)
    #[arg(long)]
    pub warnings: Option<String>,

    /// Output assumptions
    #[arg(long)]
    pub assumptions: bool,

    /// Pedantic warnings
    #[arg(long)]
    pub pedantic: bool,
}

impl BlockArgs {
    /// Merge the header string and flags into raw options.
    ///
    /// `force_prove` pins the `:prove` option for subcommands that imply it.
    pub fn raw_options(
        &self,
        proof: Option<&ProofArgs>,
        force_prove: Option<bool>,
    ) -> anyhow::Result<RawOptions> {
        let mut raw = match &self.header {
            Some(header) => RawOptions::parse_header_args(header)
                .with_context(|| format!("invalid header arguments `{}`", header))?,
            None => RawOptions::new(),
        };

        let flags = [
            ("unit", &self.unit),
            ("version", &self.ada_version),
            ("assertions", &self.assertions),
            ("template", &self.template),
            ("with", &self.with_units),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                raw.insert(key, value.clone());
            }
        }
        for var in &self.vars {
            raw.insert("var", var.clone());
        }

        if let Some(proof) = proof {
            let flags = [
                ("level", &proof.level),
                ("mode", &proof.mode),
                ("report", &proof.report),
                ("warnings", &proof.warnings),
            ];
            for (key, value) in flags {
                if let Some(value) = value {
                    raw.insert(key, value.clone());
                }
            }
            if proof.assumptions {
                raw.insert("assumptions", "yes");
            }
            if proof.pedantic {
                raw.insert("pedantic", "yes");
            }
        }

        if let Some(prove) = force_prove {
            raw.insert("prove", if prove { "yes" } else { "no" });
        }

        Ok(raw)
    }

    /// Read the block body from the file argument or standard input
    pub fn read_body(&self) -> anyhow::Result<String> {
        match self.block.as_ref().filter(|p| p.as_os_str() != "-") {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read block from {}", path.display())),
            None => {
                let mut body = String::new();
                std::io::stdin()
                    .read_to_string(&mut body)
                    .context("failed to read block from standard input")?;
                Ok(body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_babel::{BlockParams, ProofMode};

    #[test]
    fn test_flags_override_header() {
        let args = BlockArgs {
            header: Some(":unit from_header :level 1 :var A=1".into()),
            unit: Some("from_flag".into()),
            vars: vec!["B=2".into()],
            ..BlockArgs::default()
        };
        let proof = ProofArgs {
            level: Some("3".into()),
            mode: Some("flow".into()),
            pedantic: true,
            ..ProofArgs::default()
        };

        let raw = args.raw_options(Some(&proof), Some(true)).unwrap();
        let params = BlockParams::resolve(&raw).unwrap();
        assert_eq!(params.unit.as_deref(), Some("from_flag"));
        assert_eq!(params.level, 3);
        assert_eq!(params.mode, ProofMode::Flow);
        assert!(params.pedantic);
        assert!(params.prove);
        assert_eq!(params.vars.len(), 2);
    }

    #[test]
    fn test_execute_pins_prove_off() {
        let args = BlockArgs {
            header: Some(":prove yes".into()),
            ..BlockArgs::default()
        };
        let raw = args.raw_options(None, Some(false)).unwrap();
        assert!(!BlockParams::resolve(&raw).unwrap().prove);
    }

    #[test]
    fn test_read_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.adb");
        std::fs::write(&path, "null;\n").unwrap();
        let args = BlockArgs {
            block: Some(path),
            ..BlockArgs::default()
        };
        assert_eq!(args.read_body().unwrap(), "null;\n");
    }
}
