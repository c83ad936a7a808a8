//! Template registry
//!
//! A template is a text skeleton with named slots written `{imports}`,
//! `{body}` and `{unit}`. The registry is closed: it is filled once from the
//! built-ins and the configuration, every entry is validated on the way in,
//! and lookups of unknown names fail.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

/// Slots a template may reference
pub const SLOTS: [&str; 3] = ["imports", "body", "unit"];

/// Values poured into a template's slots
#[derive(Debug, Clone, Default)]
pub struct TemplateSlots<'a> {
    pub imports: &'a str,
    pub body: &'a str,
    pub unit: &'a str,
}

/// A validated template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    pub text: String,
}

impl Template {
    /// Validate and build a template
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let text = text.into();
        let invalid = |reason: String| Error::InvalidTemplate {
            name: name.clone(),
            reason,
        };

        let ident = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").map_err(|e| invalid(e.to_string()))?;
        if !ident.is_match(&name) {
            return Err(invalid("name must be an identifier".into()));
        }

        let slot = slot_regex().map_err(|e| invalid(e.to_string()))?;
        let mut has_body = false;
        for cap in slot.captures_iter(&text) {
            match &cap[1] {
                "body" => has_body = true,
                "imports" | "unit" => {}
                other => return Err(invalid(format!("unknown slot `{{{}}}`", other))),
            }
        }
        if !has_body {
            return Err(invalid("missing the `{body}` slot".into()));
        }

        Ok(Template { name, text })
    }

    /// Fill every slot occurrence
    pub fn render(&self, slots: &TemplateSlots<'_>) -> String {
        // Slot names were checked in `new`, so the pattern cannot fail here.
        let Ok(slot) = slot_regex() else {
            return self.text.clone();
        };
        slot.replace_all(&self.text, |cap: &regex::Captures<'_>| match &cap[1] {
            "imports" => slots.imports.to_string(),
            "body" => slots.body.to_string(),
            "unit" => slots.unit.to_string(),
            other => format!("{{{}}}", other),
        })
        .into_owned()
    }
}

fn slot_regex() -> std::result::Result<Regex, regex::Error> {
    Regex::new(r"\{([a-z_]+)\}")
}

/// Minimal main procedure with `Ada.Text_IO` in scope
const PROC_MAIN: &str = "\
with Ada.Text_IO; use Ada.Text_IO;
{imports}
procedure {unit} is
begin
{body}
end {unit};
";

/// Same skeleton with SPARK analysis switched on
const SPARK_MAIN: &str = "\
pragma SPARK_Mode (On);
with Ada.Text_IO; use Ada.Text_IO;
{imports}
procedure {unit} is
begin
{body}
end {unit};
";

/// Closed mapping from template identifier to template
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
}

impl TemplateRegistry {
    /// Registry holding only the built-in templates
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        for (name, text) in [("proc_main", PROC_MAIN), ("spark_main", SPARK_MAIN)] {
            templates.insert(
                name.to_string(),
                Template {
                    name: name.to_string(),
                    text: text.to_string(),
                },
            );
        }
        TemplateRegistry { templates }
    }

    /// Built-ins plus user templates; user entries replace built-ins of the same name
    pub fn with_templates<I, N, T>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut registry = Self::builtin();
        for (name, text) in extra {
            let template = Template::new(name, text)?;
            registry.templates.insert(template.name.clone(), template);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<&Template> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::UnknownTemplate(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_validate() {
        let registry = TemplateRegistry::builtin();
        for template in registry.iter() {
            Template::new(template.name.clone(), template.text.clone()).unwrap();
        }
        assert_eq!(registry.names().collect::<Vec<_>>(), ["proc_main", "spark_main"]);
    }

    #[test]
    fn test_render_fills_every_slot() {
        let template = Template::new("t", "{imports}|{unit}|{body}|{unit}").unwrap();
        let text = template.render(&TemplateSlots {
            imports: "with X; use X;",
            body: "null;",
            unit: "Hello",
        });
        assert_eq!(text, "with X; use X;|Hello|null;|Hello");
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            Template::new("no_body", "procedure Main is begin null; end;"),
            Err(Error::InvalidTemplate { .. })
        ));
        assert!(matches!(
            Template::new("bad_slot", "{body}{footer}"),
            Err(Error::InvalidTemplate { reason, .. }) if reason.contains("footer")
        ));
        assert!(matches!(
            Template::new("1st", "{body}"),
            Err(Error::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let registry = TemplateRegistry::builtin();
        assert!(matches!(
            registry.get("pkg_body"),
            Err(Error::UnknownTemplate(name)) if name == "pkg_body"
        ));
    }

    #[test]
    fn test_user_templates_override_builtins() {
        let registry =
            TemplateRegistry::with_templates([("proc_main", "procedure {unit} is begin {body} end;")])
                .unwrap();
        assert!(registry.get("proc_main").unwrap().text.starts_with("procedure"));
    }
}
