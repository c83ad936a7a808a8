//! Configuration
//!
//! Loaded from an optional TOML file; every key falls back to its default.
//!
//! ```toml
//! compile_cmd = "gnatmake"
//! prove_cmd = "gnatprove"
//! assertions_flag = "-gnata"
//! default_version = 2012
//! temp_dir = "/tmp/ada-babel"
//! remote_temp_dir = "/mnt/build/tmp"
//! tangle_header = "Copyright (C) ACME"
//!
//! [templates.pkg_main]
//! text = "{imports}\nprocedure {unit} is\nbegin\n{body}\nend {unit};\n"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::artifact::TempRoot;
use crate::command::Toolchain;
use crate::error::{Error, Result};
use crate::expand::TemplateRegistry;
use crate::params::Version;
use crate::tangle::{FileHeader, TangleSettings};

/// A template declared in the configuration file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TemplateConfig {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub compile_cmd: String,
    pub prove_cmd: String,
    pub assertions_flag: String,
    /// Language version for blocks that leave `:version` unset; 0 disables the flag
    pub default_version: u16,
    pub temp_dir: PathBuf,
    pub remote_temp_dir: Option<PathBuf>,
    /// Header used by tangles outside the banner hooks
    pub tangle_header: Option<String>,
    pub templates: BTreeMap<String, TemplateConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let toolchain = Toolchain::default();
        Config {
            compile_cmd: toolchain.compile_cmd,
            prove_cmd: toolchain.prove_cmd,
            assertions_flag: toolchain.assertions_flag,
            default_version: Version::Ada2012.year(),
            temp_dir: std::env::temp_dir().join("ada-babel"),
            remote_temp_dir: None,
            tangle_header: None,
            templates: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn toolchain(&self) -> Result<Toolchain> {
        let default_version = Version::from_year(self.default_version).ok_or_else(|| {
            Error::Config(format!(
                "default_version {} is not one of 0, 83, 95, 2005, 2012, 2022",
                self.default_version
            ))
        })?;
        for (key, value) in [("compile_cmd", &self.compile_cmd), ("prove_cmd", &self.prove_cmd)] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{key} must not be empty")));
            }
        }

        Ok(Toolchain {
            compile_cmd: self.compile_cmd.clone(),
            prove_cmd: self.prove_cmd.clone(),
            assertions_flag: self.assertions_flag.clone(),
            default_version,
        })
    }

    pub fn temp_root(&self) -> TempRoot {
        TempRoot {
            local: self.temp_dir.clone(),
            remote: self.remote_temp_dir.clone(),
        }
    }

    /// Built-in templates plus the configured ones, validated
    pub fn template_registry(&self) -> Result<TemplateRegistry> {
        TemplateRegistry::with_templates(
            self.templates
                .iter()
                .map(|(name, template)| (name.clone(), template.text.clone())),
        )
    }

    pub fn tangle_settings(&self) -> TangleSettings {
        TangleSettings {
            header: self
                .tangle_header
                .clone()
                .map(FileHeader::Comment)
                .unwrap_or_default(),
        }
    }
}
