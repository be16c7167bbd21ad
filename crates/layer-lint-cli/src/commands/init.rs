//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const CONFIG_FILE: &str = "layer-lint.toml";

const DEFAULT_CONFIG: &str = r#"# layer-lint configuration

[analyzer]
# Project root, relative to the checked directory
# root = "."
source_root = "lib"
test_root = "test"

# Glob patterns to exclude from analysis
exclude = [
    "**/*.g.dart",
    "**/*.freezed.dart",
    "**/*.mocks.dart",
    "**/generated/**",
    "test/**",
    "integration_test/**",
    "build/**",
    ".dart_tool/**",
]

# Respect .gitignore files
respect_gitignore = true

# Per-rule time budget in milliseconds (0 disables the budget)
# rule_budget_ms = 250

[layers]
# Directory that groups feature modules
feature_marker = "features"

# Layer folders; setting any entry replaces the built-in table
# [[layers.taxonomy]]
# layer = "data"
# segments = ["api"]
# specificity = 1

# Thrown types allowed per layer; `{Feature}` expands to the feature prefix.
# Setting the table replaces the built-in one.
# [exceptions.allowed]
# domain = ["{Feature}*Exception", "ArgumentError", "StateError"]
# data = ["{Feature}*Exception", "ServerException", "CacheException"]
# presentation = []
# cross-cutting = ["*"]

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.role-placement]
# allow_suffixes = ["Presenter"]

[rules.pass-through]
# severity = "warning"

[rules.exception-naming]
# allow = ["ServerException", "CacheException"]

[rules.test-coverage]
enabled = false
# layers = ["domain", "data"]
"#;

/// Runs the init command.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to configure layers and rules");
    println!("  2. Run: layer-lint check");

    Ok(())
}
