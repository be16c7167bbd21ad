//! Shared output formatting for lint results.

use anyhow::Result;
use layer_lint_core::{LintResult, MietteDiagnostic, Severity, SourceFile};
use miette::{NamedSource, Report};

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat, sources: &[SourceFile]) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Pretty => print_pretty(result, sources),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    for diagnostic in &result.diagnostics {
        let severity_indicator = match diagnostic.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };
        let formatted = diagnostic.format();
        let body = formatted.replacen(
            &format!("  {}:", diagnostic.severity),
            &format!("  {severity_indicator}:"),
            1,
        );
        println!("{body}");
    }
    println!("{}", summary_line(result));
}

fn summary_line(result: &LintResult) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    let excluded = if result.files_excluded > 0 {
        format!(" ({} excluded)", result.files_excluded)
    } else {
        String::new()
    };
    format!(
        "{color}Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s){excluded}\x1b[0m",
        result.files_checked
    )
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for diagnostic in &result.diagnostics {
        println!("{diagnostic}");
    }
}

fn print_pretty(result: &LintResult, sources: &[SourceFile]) {
    for diagnostic in &result.diagnostics {
        let report = Report::new(MietteDiagnostic::from(diagnostic));
        let content = sources
            .iter()
            .find(|s| s.path == diagnostic.location.file)
            .map(|s| s.content.clone());
        let report = match content {
            Some(content) => report.with_source_code(NamedSource::new(
                diagnostic.location.file.to_string_lossy(),
                content,
            )),
            None => report,
        };
        println!("{report:?}");
    }
    println!("{}", summary_line(result));
}
