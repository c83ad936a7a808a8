//! Output formatting for evaluation results
//!
//! Human format prints the tool output verbatim so the editor can insert it
//! into the document as is. JSON carries the status and stage alongside it.

use ada_babel::{Evaluation, Plan, TemplateRegistry};
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Expected: human, json", s)),
        }
    }
}

/// Format a block result
pub fn format_evaluation(result: &Evaluation, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => result.output().to_string(),
        OutputFormat::Json => to_json_line(result),
    }
}

/// Format a prepared plan
pub fn format_plan(plan: &Plan, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => {
            let mut output = String::new();
            match plan {
                Plan::Execute(plan) => {
                    output.push_str(&format!("source:  {}\n", plan.source.display()));
                    output.push_str(&format!("binary:  {}\n", plan.binary.display()));
                    for path in &plan.removed {
                        output.push_str(&format!("removed: {}\n", path.display()));
                    }
                    output.push_str(&format!("compile: {}\n", plan.compile));
                    output.push_str(&format!("run:     {}\n", plan.run));
                }
                Plan::Prove(plan) => {
                    output.push_str(&format!("source:  {}\n", plan.source.display()));
                    output.push_str(&format!("project: {}\n", plan.project.display()));
                    output.push_str(&format!("prove:   {}\n", plan.prove));
                }
            }
            output
        }
        OutputFormat::Json => to_json_line(plan),
    }
}

/// Format the registered templates
pub fn format_templates(registry: &TemplateRegistry, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => {
            let mut output = String::new();
            for template in registry.iter() {
                output.push_str(&format!("{}:\n", template.name));
                for line in template.text.lines() {
                    output.push_str(&format!("    {}\n", line));
                }
            }
            output
        }
        OutputFormat::Json => {
            let templates: Vec<_> = registry
                .iter()
                .map(|t| json!({ "name": t.name, "text": t.text }))
                .collect();
            to_json_line(&templates)
        }
    }
}

fn to_json_line<T: serde::Serialize>(value: &T) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    text.push('\n');
    text
}
