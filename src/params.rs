//! Block parameter resolution
//!
//! Merges the options given on a source block with the documented defaults.
//! Options arrive as a raw `key -> value` mapping, either built directly or
//! parsed from an org-style header argument string such as
//! `":unit hello :level 2 :var N=3"`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Options exactly as written on the block, before resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    entries: BTreeMap<String, String>,
    vars: Vec<String>,
}

impl RawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option. `var` accumulates, every other key keeps the last value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let key = key.trim_start_matches(':').to_string();
        let value = value.into();
        if key == "var" {
            self.vars.push(value);
        } else {
            self.entries.insert(key, value);
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.vars.is_empty()
    }

    /// Parse a header argument string (`:key value :key value ...`).
    ///
    /// A boolean or unrecognized key with no value (`:pedantic`) reads as
    /// `yes`; a key that needs a value (`:unit`, `:with`, ...) is rejected
    /// without one. Values may span
    /// several words (`:with Ada.Text_IO Ada.Strings`) and double-quoted
    /// segments keep their quotes and inner spaces.
    pub fn parse_header_args(args: &str) -> Result<Self> {
        let mut raw = RawOptions::new();
        let mut key: Option<String> = None;
        let mut words: Vec<String> = Vec::new();

        for token in tokenize(args) {
            if let Some(name) = token.strip_prefix(':') {
                if let Some(prev) = key.take() {
                    let value = join_value(&prev, &words)?;
                    raw.insert(prev, value);
                }
                words.clear();
                if name.is_empty() {
                    return Err(Error::InvalidParameter {
                        key: String::new(),
                        value: token.clone(),
                        expected: "a `:key` name",
                    });
                }
                key = Some(name.to_string());
            } else if key.is_some() {
                words.push(token);
            } else {
                return Err(Error::InvalidParameter {
                    key: String::new(),
                    value: token,
                    expected: "header arguments starting with `:key`",
                });
            }
        }
        if let Some(prev) = key {
            let value = join_value(&prev, &words)?;
            raw.insert(prev, value);
        }

        Ok(raw)
    }
}

/// Keys whose bare form has no sensible meaning
const VALUE_KEYS: [&str; 9] = [
    "level", "mode", "report", "warnings", "version", "template", "unit", "with", "var",
];

fn join_value(key: &str, words: &[String]) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    if VALUE_KEYS.contains(&key) {
        return Err(Error::InvalidParameter {
            key: key.into(),
            value: String::new(),
            expected: "a value after the key",
        });
    }
    Ok("yes".to_string())
}

/// Whitespace split that leaves double-quoted runs intact
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Ada language revision passed to the compiler as `-gnat<year>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Version {
    Ada83,
    Ada95,
    Ada2005,
    Ada2012,
    Ada2022,
}

impl Version {
    pub const ALL: [Version; 5] = [
        Version::Ada83,
        Version::Ada95,
        Version::Ada2005,
        Version::Ada2012,
        Version::Ada2022,
    ];

    pub fn year(self) -> u16 {
        match self {
            Version::Ada83 => 83,
            Version::Ada95 => 95,
            Version::Ada2005 => 2005,
            Version::Ada2012 => 2012,
            Version::Ada2022 => 2022,
        }
    }

    /// `0` is the "unset" marker and maps to `None`
    pub fn from_year(year: u16) -> Option<Option<Version>> {
        if year == 0 {
            return Some(None);
        }
        Version::ALL.into_iter().find(|v| v.year() == year).map(Some)
    }

    /// Block version when set, otherwise the global default
    pub fn effective(block: Option<Version>, global: Option<Version>) -> Option<Version> {
        block.or(global)
    }

    pub fn compiler_flag(self) -> String {
        format!("-gnat{}", self.year())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.year())
    }
}

/// Parse a `:version` value; `0` means "use the global default"
pub fn parse_version(value: &str) -> Result<Option<Version>> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .and_then(Version::from_year)
        .ok_or_else(|| Error::InvalidParameter {
            key: "version".into(),
            value: value.into(),
            expected: "one of 0, 83, 95, 2005, 2012, 2022",
        })
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident, $key:literal, $expected:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidParameter {
                        key: $key.into(),
                        value: other.into(),
                        expected: $expected,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum!(
    /// Prover analysis mode (`--mode`)
    ProofMode, "mode", "one of check, check_all, flow, prove, all", {
        Check => "check",
        CheckAll => "check_all",
        Flow => "flow",
        Prove => "prove",
        All => "all",
    }
);

keyword_enum!(
    /// Prover report verbosity (`--report`)
    Report, "report", "one of fail, all, provers, statistics", {
        Fail => "fail",
        All => "all",
        Provers => "provers",
        Statistics => "statistics",
    }
);

keyword_enum!(
    /// Prover warnings policy (`--warnings`)
    Warnings, "warnings", "one of off, continue, error", {
        Off => "off",
        Continue => "continue",
        Error => "error",
    }
);

/// A `:var NAME=value` binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub name: String,
    pub value: String,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Binding {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

impl FromStr for Binding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(Binding::new(name.trim(), value.trim()))
            }
            _ => Err(Error::InvalidParameter {
                key: "var".into(),
                value: s.into(),
                expected: "NAME=value",
            }),
        }
    }
}

/// Fully resolved block parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockParams {
    pub assertions: bool,
    pub assumptions: bool,
    pub level: u8,
    pub mode: ProofMode,
    pub pedantic: bool,
    pub prove: bool,
    pub report: Report,
    pub warnings: Option<Warnings>,
    pub template: Option<String>,
    pub unit: Option<String>,
    /// `None` defers to the configured global default
    pub version: Option<Version>,
    pub with: Vec<String>,
    pub vars: Vec<Binding>,
    /// Unrecognized options, carried along untouched
    pub extra: BTreeMap<String, String>,
}

impl Default for BlockParams {
    fn default() -> Self {
        BlockParams {
            assertions: true,
            assumptions: false,
            level: 4,
            mode: ProofMode::All,
            pedantic: false,
            prove: false,
            report: Report::All,
            warnings: None,
            template: None,
            unit: None,
            version: None,
            with: Vec::new(),
            vars: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl BlockParams {
    /// Resolve raw options against the defaults
    pub fn resolve(raw: &RawOptions) -> Result<Self> {
        let mut params = BlockParams::default();

        for (key, value) in &raw.entries {
            match key.as_str() {
                "assertions" => params.assertions = parse_bool(key, value)?,
                "assumptions" => params.assumptions = parse_bool(key, value)?,
                "pedantic" => params.pedantic = parse_bool(key, value)?,
                "prove" => params.prove = parse_bool(key, value)?,
                "level" => params.level = parse_level(value)?,
                "mode" => params.mode = value.parse()?,
                "report" => params.report = value.parse()?,
                "warnings" => params.warnings = Some(value.parse()?),
                "version" => params.version = parse_version(value)?,
                "template" => params.template = non_empty(value),
                "unit" => params.unit = parse_unit(value)?,
                "with" => {
                    params.with = value.split_whitespace().map(str::to_string).collect();
                }
                "session" => {
                    let session = value.trim();
                    if !session.is_empty() && session != "none" {
                        return Err(Error::SessionUnsupported(session.to_string()));
                    }
                }
                _ => {
                    params.extra.insert(key.clone(), value.clone());
                }
            }
        }

        params.vars = raw
            .vars
            .iter()
            .map(|v| v.parse())
            .collect::<Result<Vec<Binding>>>()?;

        debug!(?params, "resolved block parameters");
        Ok(params)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "on" | "1" => Ok(true),
        "no" | "false" | "nil" | "off" | "0" => Ok(false),
        _ => Err(Error::InvalidParameter {
            key: key.into(),
            value: value.into(),
            expected: "yes/no, true/false, t/nil, on/off or 1/0",
        }),
    }
}

fn parse_level(value: &str) -> Result<u8> {
    match value.trim().parse::<u8>() {
        Ok(level) if level <= 4 => Ok(level),
        _ => Err(Error::InvalidParameter {
            key: "level".into(),
            value: value.into(),
            expected: "an integer from 0 to 4",
        }),
    }
}

fn parse_unit(value: &str) -> Result<Option<String>> {
    let unit = value.trim();
    if unit.contains(['/', '\\']) || unit == "." || unit == ".." {
        return Err(Error::InvalidParameter {
            key: "unit".into(),
            value: value.into(),
            expected: "an Ada unit name",
        });
    }
    Ok(non_empty(unit))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
