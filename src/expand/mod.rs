//! Body expansion
//!
//! This module contains:
//! - variable substitution over the raw block text
//! - `template`: the closed template registry used to wrap snippets into a
//!   complete compilable unit

pub mod template;

pub use template::{Template, TemplateRegistry, TemplateSlots};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::params::{BlockParams, Binding};

/// Unit name filled into a template when the block names none
pub const DEFAULT_UNIT: &str = "Main";

/// Replace every literal occurrence of each bound name with its value.
///
/// The text is scanned once, left to right. At each position the longest
/// bound name that matches wins, and inserted values are never rescanned.
/// When a name is bound twice the first binding wins.
pub fn substitute_vars(source: &str, bindings: &[Binding]) -> Result<String> {
    let mut names: Vec<&Binding> = Vec::with_capacity(bindings.len());
    for binding in bindings {
        if !binding.name.is_empty() && !names.iter().any(|b| b.name == binding.name) {
            names.push(binding);
        }
    }
    if names.is_empty() {
        return Ok(source.to_string());
    }

    let mut ordered = names.clone();
    ordered.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
    let pattern = ordered
        .iter()
        .map(|b| regex::escape(&b.name))
        .collect::<Vec<_>>()
        .join("|");
    let re = Regex::new(&pattern).map_err(|e| Error::InvalidParameter {
        key: "var".into(),
        value: e.to_string(),
        expected: "variable names usable as literal patterns",
    })?;

    let expanded = re.replace_all(source, |cap: &regex::Captures<'_>| {
        names
            .iter()
            .find(|b| b.name == cap[0])
            .map(|b| b.value.clone())
            .unwrap_or_else(|| cap[0].to_string())
    });

    Ok(expanded.into_owned())
}

/// Render a `with` list as context clauses, one `with X; use X;` per unit
pub fn render_imports(units: &[String]) -> String {
    units
        .iter()
        .map(|unit| format!("with {unit}; use {unit};"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute variables, then wrap in the block's template if it names one
pub fn expand_body(source: &str, params: &BlockParams, registry: &TemplateRegistry) -> Result<String> {
    let body = substitute_vars(source, &params.vars)?;

    let Some(name) = params.template.as_deref() else {
        if !params.with.is_empty() {
            warn!(units = ?params.with, "`:with` ignored: block has no template");
        }
        return Ok(body);
    };

    let template = registry.get(name)?;
    let imports = render_imports(&params.with);
    let unit = params.unit.as_deref().unwrap_or(DEFAULT_UNIT);
    debug!(template = name, unit, "wrapping body in template");

    Ok(template.render(&TemplateSlots {
        imports: &imports,
        body: &body,
        unit,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params_with_template(template: &str) -> BlockParams {
        BlockParams {
            template: Some(template.to_string()),
            ..BlockParams::default()
        }
    }

    #[test]
    fn test_substitution_replaces_every_occurrence() {
        let out = substitute_vars("X := X + 1;", &[Binding::new("X", 41)]).unwrap();
        assert_eq!(out, "41 := 41 + 1;");
    }

    #[test]
    fn test_longest_name_wins() {
        let bindings = [Binding::new("N", 1), Binding::new("N_MAX", 10)];
        let out = substitute_vars("for I in N .. N_MAX loop", &bindings).unwrap();
        assert_eq!(out, "for I in 1 .. 10 loop");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let bindings = [Binding::new("A", "B"), Binding::new("B", "C")];
        assert_eq!(substitute_vars("A B", &bindings).unwrap(), "B C");
    }

    #[test]
    fn test_first_binding_of_a_name_wins() {
        let bindings = [Binding::new("K", 1), Binding::new("K", 2)];
        assert_eq!(substitute_vars("K", &bindings).unwrap(), "1");
    }

    #[test]
    fn test_no_template_returns_substituted_body() {
        let params = BlockParams {
            vars: vec![Binding::new("MSG", "\"hi\"")],
            with: vec!["Ada.Strings".into()],
            ..BlockParams::default()
        };
        let out = expand_body("Put_Line (MSG);", &params, &TemplateRegistry::builtin()).unwrap();
        assert_eq!(out, "Put_Line (\"hi\");");
    }

    #[test]
    fn test_template_wraps_body_and_imports() {
        let mut params = params_with_template("proc_main");
        params.with = vec!["Ada.Strings.Fixed".into(), "Interfaces".into()];
        let out = expand_body("   Put_Line (\"ok\");", &params, &TemplateRegistry::builtin()).unwrap();

        assert!(out.starts_with("with Ada.Text_IO; use Ada.Text_IO;\n"));
        assert!(out.contains("with Ada.Strings.Fixed; use Ada.Strings.Fixed;\nwith Interfaces; use Interfaces;\n"));
        assert!(out.contains("procedure Main is\nbegin\n   Put_Line (\"ok\");\nend Main;"));
    }

    #[test]
    fn test_template_uses_unit_name() {
        let mut params = params_with_template("spark_main");
        params.unit = Some("Hello".into());
        let out = expand_body("null;", &params, &TemplateRegistry::builtin()).unwrap();
        assert!(out.starts_with("pragma SPARK_Mode (On);"));
        assert!(out.contains("procedure Hello is"));
        assert!(out.contains("end Hello;"));
    }

    #[test]
    fn test_unregistered_template_fails() {
        let params = params_with_template("task_main");
        assert!(matches!(
            expand_body("null;", &params, &TemplateRegistry::builtin()),
            Err(Error::UnknownTemplate(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_bound_name_disappears(
            name in "[A-Z][A-Z_]{2,8}",
            value in "[0-9]{1,6}",
            prefix in "[a-z ;:=]{0,12}",
            suffix in "[a-z ;:=]{0,12}",
        ) {
            let source = format!("{prefix}{name}{suffix}{name}");
            let out = substitute_vars(&source, &[Binding::new(name.clone(), value.clone())]).unwrap();
            prop_assert!(!out.contains(&name));
            prop_assert!(out.contains(&value));
        }
    }
}
