//! Check command implementation.

use anyhow::{bail, Context, Result};
use layer_lint_core::utils::normalize;
use layer_lint_core::{
    AnalyzerConfig, Engine, FsMetadata, LintResult, Severity, SourceFile, SourceParser,
};
use layer_lint_dart::DartParser;
use layer_lint_rules::{build_rules, known_rule_ids, restrict_to};
use std::path::Path;

use crate::config_resolver;
use crate::OutputFormat;

/// Flags of the `check` subcommand.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule ids or codes to run instead of the configured set.
    pub rules: Option<String>,
    /// Extra exclusion globs.
    pub exclude: Vec<String>,
    /// Lowest severity that fails the run.
    pub fail_on: Severity,
}

/// Runs the check command.
///
/// Returns `true` when a diagnostic at or above the failure threshold was
/// reported.
pub fn run(path: &Path, explicit_config: Option<&Path>, options: &CheckOptions) -> Result<bool> {
    let (result, sources) = analyze(path, explicit_config, options)?;
    super::output::print(&result, options.format, &sources)?;
    Ok(result.has_diagnostics_at(options.fail_on))
}

/// Loads configuration, discovers sources and runs one analysis pass.
pub fn analyze(
    path: &Path,
    explicit_config: Option<&Path>,
    options: &CheckOptions,
) -> Result<(LintResult, Vec<SourceFile>)> {
    let mut config = config_resolver::resolve(path, explicit_config).load()?;
    config
        .analyzer
        .exclude
        .extend(options.exclude.iter().cloned());
    config
        .validate(&known_rule_ids())
        .context("Invalid configuration")?;

    if let Some(filter) = &options.rules {
        let wanted: Vec<String> = filter
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        restrict_to(&mut config, &wanted)?;
    }

    let rules = build_rules(&config)?;
    let parser = DartParser::new();
    let root = path.join(&config.analyzer.root);
    let sources = discover_files(&root, &config.analyzer, parser.extensions())?;
    let metadata = FsMetadata::scan(&root, &config.analyzer);

    let engine = Engine::builder()
        .config(config)
        .parser(parser)
        .rules(rules)
        .metadata(metadata)
        .build()
        .context("Failed to build engine")?;

    tracing::info!(
        "Analyzing {} ({} files) with {} rules",
        root.display(),
        sources.len(),
        engine.rule_count()
    );

    let result = engine.analyze(&sources).context("Analysis failed")?;
    Ok((result, sources))
}

/// Collects source files under `root`, keyed by their `/`-separated path
/// relative to it. Exclusion globs are left to the engine so excluded files
/// are counted.
fn discover_files(
    root: &Path,
    analyzer: &AnalyzerConfig,
    extensions: &[&str],
) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }

    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(analyzer.respect_gitignore)
        .git_exclude(analyzer.respect_gitignore)
        .require_git(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping entry: {e}");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let name = path.to_string_lossy();
        if !extensions.iter().any(|ext| name.ends_with(ext)) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        match std::fs::read_to_string(path) {
            Ok(content) => files.push(SourceFile::new(normalize(relative), content)),
            Err(e) => tracing::warn!("Skipping {}: {e}", path.display()),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!("Discovered {} source files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> CheckOptions {
        CheckOptions {
            format: OutputFormat::Compact,
            rules: None,
            exclude: Vec::new(),
            fail_on: Severity::Error,
        }
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "lib/domain/entities/user.dart",
            "import '../../data/models/user_model.dart';\n\nclass User {\n  final String id;\n}\n",
        );
        write(
            tmp.path(),
            "lib/data/models/user_model.dart",
            "import '../../domain/entities/user.dart';\n\nclass UserModel extends User {}\n",
        );
        write(tmp.path(), "lib/generated/api.g.dart", "class Api {}\n");
        write(tmp.path(), "README.md", "# app\n");
        tmp
    }

    #[test]
    fn reports_layer_violations_and_counts_excluded_files() {
        let tmp = project();
        let (result, sources) = analyze(tmp.path(), None, &options()).unwrap();

        assert_eq!(sources.len(), 3);
        assert!(sources.iter().all(|s| !s.path.to_string_lossy().contains('\\')));
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.files_excluded, 1);
        assert!(!result.by_rule("layer-dependency").is_empty());
        assert!(result.has_diagnostics_at(Severity::Error));
    }

    #[test]
    fn rules_flag_limits_the_pass() {
        let tmp = project();
        let opts = CheckOptions {
            rules: Some("circular-dependency".into()),
            ..options()
        };
        let (result, _) = analyze(tmp.path(), None, &opts).unwrap();

        assert!(!result.diagnostics.is_empty());
        assert!(result
            .diagnostics
            .iter()
            .all(|d| d.rule == "circular-dependency"));
    }

    #[test]
    fn unknown_rule_in_flag_is_an_error() {
        let tmp = project();
        let opts = CheckOptions {
            rules: Some("no-such-rule".into()),
            ..options()
        };
        let err = analyze(tmp.path(), None, &opts).unwrap_err();
        assert!(err.to_string().contains("no-such-rule"));
    }

    #[test]
    fn exclude_flag_extends_config() {
        let tmp = project();
        let opts = CheckOptions {
            exclude: vec!["lib/data/**".into()],
            ..options()
        };
        let (result, _) = analyze(tmp.path(), None, &opts).unwrap();
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.files_excluded, 2);
    }

    #[test]
    fn project_config_disables_rules() {
        let tmp = project();
        write(
            tmp.path(),
            "layer-lint.toml",
            "[rules.layer-dependency]\nenabled = false\n\n[rules.circular-dependency]\nenabled = false\n",
        );
        let (result, _) = analyze(tmp.path(), None, &options()).unwrap();
        assert!(result.by_rule("layer-dependency").is_empty());
        assert!(result.by_rule("circular-dependency").is_empty());
    }

    #[test]
    fn unknown_rule_section_is_rejected() {
        let tmp = project();
        write(tmp.path(), "layer-lint.toml", "[rules.bogus]\nenabled = true\n");
        let err = analyze(tmp.path(), None, &options()).unwrap_err();
        assert!(format!("{err:#}").contains("bogus"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(analyze(&missing, None, &options()).is_err());
    }

    #[test]
    fn clean_project_passes_the_threshold() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "lib/domain/entities/user.dart",
            "class User {\n  const User(this.id);\n  final String id;\n}\n",
        );
        assert!(!run(tmp.path(), None, &options()).unwrap());
    }
}
