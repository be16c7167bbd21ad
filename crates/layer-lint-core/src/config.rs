//! Configuration types for layer-lint.
//!
//! Everything the engine treats as convention data (layer folders, naming
//! suffixes, error-union type names, allowed exception types) lives here and is
//! loaded once per process from `layer-lint.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::layer::Layer;
use crate::types::Severity;
use crate::utils::paths::PathGlob;

/// Top-level configuration for layer-lint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Layer taxonomy and dependency policy.
    #[serde(default)]
    pub layers: LayersConfig,

    /// Naming and type-shape conventions.
    #[serde(default)]
    pub patterns: PatternsConfig,

    /// Exception type taxonomy.
    #[serde(default)]
    pub exceptions: ExceptionsConfig,

    /// Per-rule configurations keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is enabled, falling back to the rule's own default.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str, enabled_by_default: bool) -> bool {
        self.rules
            .get(rule_id)
            .and_then(|c| c.enabled)
            .unwrap_or(enabled_by_default)
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|c| c.severity)
    }

    /// Gets the rule-specific configuration block.
    #[must_use]
    pub fn rule_config(&self, rule_id: &str) -> Option<&RuleConfig> {
        self.rules.get(rule_id)
    }

    /// Validates the configuration against the set of known rule ids.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: unknown rule ids, invalid globs,
    /// empty taxonomy entries or unusable exception patterns.
    pub fn validate(&self, known_rules: &[&str]) -> Result<(), ConfigError> {
        for rule_id in self.rules.keys() {
            if !known_rules.contains(&rule_id.as_str()) {
                return Err(ConfigError::UnknownRule {
                    rule: rule_id.clone(),
                });
            }
        }

        for pattern in &self.analyzer.exclude {
            PathGlob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        if self.layers.feature_marker.trim().is_empty() {
            return Err(ConfigError::InvalidTaxonomy(
                "layers.feature_marker must not be empty".into(),
            ));
        }

        if self.patterns.error_union_types.is_empty() {
            return Err(ConfigError::InvalidTaxonomy(
                "patterns.error_union_types must name at least one type".into(),
            ));
        }

        // Constructing the runtime objects runs their own checks.
        crate::layer::LayerClassifier::new(self)?;
        crate::layer::DependencyPolicy::new(self)?;
        crate::taxonomy::ExceptionTypeTaxonomy::new(&self.exceptions)?;
        Ok(())
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Source root that `package:` imports resolve against.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Directory holding companion tests.
    #[serde(default = "default_test_root")]
    pub test_root: String,

    /// Package name of the analyzed project, for `package:` import resolution.
    #[serde(default)]
    pub package: Option<String>,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Maximum number of parallel file analyses.
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Soft time budget per rule per file, in milliseconds.
    #[serde(default = "default_rule_budget_ms")]
    pub rule_budget_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            source_root: default_source_root(),
            test_root: default_test_root(),
            package: None,
            exclude: default_excludes(),
            respect_gitignore: true,
            parallelism: None,
            rule_budget_ms: default_rule_budget_ms(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_source_root() -> String {
    "lib".to_string()
}

fn default_test_root() -> String {
    "test".to_string()
}

fn default_excludes() -> Vec<String> {
    [
        "**/*.g.dart",
        "**/*.freezed.dart",
        "**/*.mocks.dart",
        "**/generated/**",
        "test/**",
        "integration_test/**",
        "build/**",
        ".dart_tool/**",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_rule_budget_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

/// One taxonomy entry: folder names that place a file in a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEntry {
    /// Target layer.
    pub layer: Layer,
    /// Directory names matched case-insensitively.
    pub segments: Vec<String>,
    /// Higher values outrank lower ones regardless of position.
    #[serde(default)]
    pub specificity: u8,
}

impl LayerEntry {
    fn new(layer: Layer, specificity: u8, segments: &[&str]) -> Self {
        Self {
            layer,
            segments: segments.iter().map(|s| (*s).to_string()).collect(),
            specificity,
        }
    }
}

/// A disallowed import direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenDependency {
    /// Importing layer.
    pub from: Layer,
    /// Imported layer.
    pub to: Layer,
}

/// Layer taxonomy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayersConfig {
    /// Path segment that precedes feature folders.
    #[serde(default = "default_feature_marker")]
    pub feature_marker: String,

    /// Folder-name taxonomy.
    #[serde(default = "default_taxonomy")]
    pub taxonomy: Vec<LayerEntry>,

    /// Disallowed import directions.
    #[serde(default = "default_forbidden")]
    pub forbidden: Vec<ForbiddenDependency>,
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            feature_marker: default_feature_marker(),
            taxonomy: default_taxonomy(),
            forbidden: default_forbidden(),
        }
    }
}

fn default_feature_marker() -> String {
    "features".to_string()
}

fn default_taxonomy() -> Vec<LayerEntry> {
    vec![
        LayerEntry::new(Layer::Domain, 0, &["domain"]),
        LayerEntry::new(
            Layer::Domain,
            1,
            &["entities", "usecases", "use_cases", "value_objects"],
        ),
        LayerEntry::new(Layer::Data, 0, &["data"]),
        LayerEntry::new(
            Layer::Data,
            1,
            &["datasources", "data_sources", "models", "dtos", "repositories_impl"],
        ),
        LayerEntry::new(Layer::Presentation, 0, &["presentation", "ui"]),
        LayerEntry::new(
            Layer::Presentation,
            1,
            &[
                "pages",
                "screens",
                "widgets",
                "providers",
                "controllers",
                "notifiers",
                "view_models",
                "states",
            ],
        ),
        LayerEntry::new(
            Layer::CrossCutting,
            0,
            &["core", "shared", "common", "utils", "di", "config"],
        ),
    ]
}

fn default_forbidden() -> Vec<ForbiddenDependency> {
    vec![
        ForbiddenDependency {
            from: Layer::Domain,
            to: Layer::Data,
        },
        ForbiddenDependency {
            from: Layer::Domain,
            to: Layer::Presentation,
        },
        ForbiddenDependency {
            from: Layer::Presentation,
            to: Layer::Data,
        },
    ]
}

/// Naming and type-shape conventions consumed by the pattern library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    /// Entity name suffixes (entities are usually unsuffixed).
    pub entity_suffixes: Vec<String>,
    /// Model name suffixes.
    pub model_suffixes: Vec<String>,
    /// Use case name suffixes.
    pub usecase_suffixes: Vec<String>,
    /// Repository name suffixes.
    pub repository_suffixes: Vec<String>,
    /// Implementation name suffixes (`UserRepositoryImpl`).
    pub implementation_suffixes: Vec<String>,
    /// Data source name suffixes.
    pub datasource_suffixes: Vec<String>,
    /// Exception type name suffixes.
    pub exception_suffixes: Vec<String>,
    /// Base types whose subclasses are value objects.
    pub value_object_bases: Vec<String>,
    /// Base types whose subclasses are exceptions.
    pub exception_bases: Vec<String>,
    /// Error-union wrapper type names (`Result`, `Either`).
    pub error_union_types: Vec<String>,
    /// Async wrappers peeled before looking for an error union.
    pub async_wrappers: Vec<String>,
    /// Use case entry point method names.
    pub usecase_entry_points: Vec<String>,
    /// Serialization member names that mark data models.
    pub serialization_members: Vec<String>,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        }
        Self {
            entity_suffixes: strings(&["Entity"]),
            model_suffixes: strings(&["Model", "Dto", "DTO"]),
            usecase_suffixes: strings(&["UseCase", "Usecase"]),
            repository_suffixes: strings(&["Repository"]),
            implementation_suffixes: strings(&["Impl", "Implementation"]),
            datasource_suffixes: strings(&["DataSource", "Datasource"]),
            exception_suffixes: strings(&["Exception"]),
            value_object_bases: strings(&["ValueObject"]),
            exception_bases: strings(&["Exception", "Error"]),
            error_union_types: strings(&["Result", "Either"]),
            async_wrappers: strings(&["Future", "FutureOr"]),
            usecase_entry_points: strings(&["call", "execute"]),
            serialization_members: strings(&["toJson", "fromJson", "toMap", "fromMap"]),
        }
    }
}

/// Exception type taxonomy configuration.
///
/// `allowed` maps a layer name to type-name patterns. Patterns support `*`
/// wildcards and the `{Feature}` placeholder, which expands to the PascalCase
/// feature prefix of the throwing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionsConfig {
    /// Taxonomy version, bumped when the table changes meaning.
    #[serde(default = "default_taxonomy_version")]
    pub version: u32,

    /// Allowed thrown type patterns per layer.
    #[serde(default = "default_allowed_exceptions")]
    pub allowed: BTreeMap<String, Vec<String>>,
}

impl Default for ExceptionsConfig {
    fn default() -> Self {
        Self {
            version: default_taxonomy_version(),
            allowed: default_allowed_exceptions(),
        }
    }
}

fn default_taxonomy_version() -> u32 {
    1
}

fn default_allowed_exceptions() -> BTreeMap<String, Vec<String>> {
    let mut allowed = BTreeMap::new();
    allowed.insert(
        "domain".to_string(),
        vec![
            "{Feature}*Exception".to_string(),
            "ArgumentError".to_string(),
            "StateError".to_string(),
            "UnimplementedError".to_string(),
        ],
    );
    allowed.insert(
        "data".to_string(),
        vec![
            "{Feature}*Exception".to_string(),
            "ServerException".to_string(),
            "CacheException".to_string(),
            "NetworkException".to_string(),
            "NotFoundException".to_string(),
            "UnauthorizedException".to_string(),
            "DatabaseException".to_string(),
            "DataSourceException".to_string(),
            "TimeoutException".to_string(),
            "FormatException".to_string(),
            "ArgumentError".to_string(),
            "StateError".to_string(),
            "UnimplementedError".to_string(),
        ],
    );
    allowed.insert("presentation".to_string(), Vec::new());
    allowed.insert("cross-cutting".to_string(), vec!["*".to_string()]);
    allowed
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: BTreeMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets a string array option.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Configuration errors. All of them are fatal before analysis starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A `[rules.<id>]` section names a rule that does not exist.
    #[error("Unknown rule '{rule}' in configuration")]
    UnknownRule {
        /// The unknown rule id.
        rule: String,
    },

    /// A glob pattern does not compile.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob {
        /// The pattern as written.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A layer name is not recognized.
    #[error("Unknown layer '{0}'")]
    UnknownLayer(String),

    /// Taxonomy or convention table is structurally invalid.
    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),
}
