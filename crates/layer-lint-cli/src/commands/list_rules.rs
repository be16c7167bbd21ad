//! List rules command implementation.

use anyhow::Result;
use layer_lint_rules::{catalogue, RuleSummary};
use serde::Serialize;

use crate::ListFormat;

#[derive(Serialize)]
struct RuleRow {
    code: &'static str,
    name: &'static str,
    severity: String,
    kind: &'static str,
    enabled_by_default: bool,
    description: &'static str,
}

impl From<&RuleSummary> for RuleRow {
    fn from(rule: &RuleSummary) -> Self {
        Self {
            code: rule.code,
            name: rule.name,
            severity: rule.severity.to_string(),
            kind: rule.kind.as_str(),
            enabled_by_default: rule.enabled_by_default,
            description: rule.description,
        }
    }
}

/// Runs the list-rules command.
pub fn run(format: ListFormat) -> Result<()> {
    let rules = catalogue();
    match format {
        ListFormat::Json => {
            let rows: Vec<RuleRow> = rules.iter().map(RuleRow::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        ListFormat::Text => print_table(&rules),
    }
    Ok(())
}

fn print_table(rules: &[RuleSummary]) {
    println!("Available rules:\n");
    println!(
        "{:<7} {:<27} {:<8} {:<9} Description",
        "Code", "Name", "Kind", "Severity"
    );
    println!("{}", "-".repeat(96));

    for rule in rules {
        let opt_in = if rule.enabled_by_default { "" } else { " (opt-in)" };
        println!(
            "{:<7} {:<27} {:<8} {:<9} {}{}",
            rule.code,
            rule.name,
            rule.kind.as_str(),
            rule.severity,
            rule.description,
            opt_in
        );
    }

    println!("\nUse --rules to run specific rules, e.g.:");
    println!("  layer-lint check --rules layer-dependency,pass-through");
    println!("  layer-lint check --rules CA001,CA104,CA111");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_serialize_with_lowercase_severity() {
        let rows: Vec<RuleRow> = catalogue().iter().map(RuleRow::from).collect();
        let json = serde_json::to_value(&rows).unwrap();
        let first = &json[0];
        assert_eq!(first["code"], "CA001");
        assert_eq!(first["kind"], "graph");
        assert_eq!(first["severity"], "error");
    }
}
