//! Data-driven rule registry.
//!
//! Every built-in rule is one row of [`REGISTRY`]: its id and a factory
//! that reads the rule's `[rules.<id>]` options. Adding a rule means adding
//! a row; nothing else dispatches on rule ids.

use layer_lint_core::{
    Config, Rule, RuleBox, RuleConfig, RuleError, Severity, GRAPH_RULES, INTERNAL_RULES,
};
use thiserror::Error;

use crate::{
    datasource_shape, entity_purity, exception_layer, exception_naming, model_structure,
    pass_through, repository_implementation, repository_interface, role_placement,
    test_coverage, usecase_shape,
};
use crate::{
    DataSourceShape, EntityPurity, ExceptionLayer, ExceptionNaming, ModelStructure, PassThrough,
    RepositoryImplementation, RepositoryInterface, RolePlacement, TestCoverage, UseCaseShape,
};

/// Builds a rule from its optional configuration block.
pub type RuleFactory = fn(Option<&RuleConfig>) -> Result<RuleBox, RuleError>;

struct Entry {
    name: &'static str,
    factory: RuleFactory,
}

fn plain<R: Rule + Default + 'static>(_: Option<&RuleConfig>) -> Result<RuleBox, RuleError> {
    Ok(Box::new(R::default()))
}

fn configured_role_placement(config: Option<&RuleConfig>) -> Result<RuleBox, RuleError> {
    Ok(Box::new(RolePlacement::from_config(config)?))
}

fn configured_exception_naming(config: Option<&RuleConfig>) -> Result<RuleBox, RuleError> {
    Ok(Box::new(ExceptionNaming::from_config(config)?))
}

fn configured_test_coverage(config: Option<&RuleConfig>) -> Result<RuleBox, RuleError> {
    Ok(Box::new(TestCoverage::from_config(config)?))
}

static REGISTRY: &[Entry] = &[
    Entry {
        name: role_placement::NAME,
        factory: configured_role_placement,
    },
    Entry {
        name: repository_interface::NAME,
        factory: plain::<RepositoryInterface>,
    },
    Entry {
        name: repository_implementation::NAME,
        factory: plain::<RepositoryImplementation>,
    },
    Entry {
        name: pass_through::NAME,
        factory: plain::<PassThrough>,
    },
    Entry {
        name: usecase_shape::NAME,
        factory: plain::<UseCaseShape>,
    },
    Entry {
        name: model_structure::NAME,
        factory: plain::<ModelStructure>,
    },
    Entry {
        name: datasource_shape::NAME,
        factory: plain::<DataSourceShape>,
    },
    Entry {
        name: entity_purity::NAME,
        factory: plain::<EntityPurity>,
    },
    Entry {
        name: exception_naming::NAME,
        factory: configured_exception_naming,
    },
    Entry {
        name: exception_layer::NAME,
        factory: plain::<ExceptionLayer>,
    },
    Entry {
        name: test_coverage::NAME,
        factory: configured_test_coverage,
    },
];

/// Errors raised while instantiating rules from configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A rule rejected its options.
    #[error("rules.{rule}: {source}")]
    InvalidOptions {
        /// Rule id.
        rule: &'static str,
        /// What the rule rejected.
        #[source]
        source: RuleError,
    },

    /// A rule id was requested that no built-in rule has.
    #[error("unknown rule '{0}'")]
    UnknownRule(String),
}

/// Where a rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Per-file rule over declarations, methods, throws or imports.
    File,
    /// Whole-project check over the dependency graph.
    Graph,
    /// Emitted by the engine itself.
    Internal,
}

impl RuleKind {
    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Graph => "graph",
            Self::Internal => "internal",
        }
    }
}

/// One row of the rule catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    /// Rule code.
    pub code: &'static str,
    /// Rule id.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Default severity.
    pub severity: Severity,
    /// Runs without being enabled in configuration.
    pub enabled_by_default: bool,
    /// Where the rule runs.
    pub kind: RuleKind,
}

/// Every built-in file rule with default options.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    REGISTRY
        .iter()
        .filter_map(|entry| (entry.factory)(None).ok())
        .collect()
}

/// Instantiates every built-in file rule with its configured options.
///
/// Disabled rules are still built so their options are validated; the
/// engine drops them.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidOptions`] for the first rule that
/// rejects its options.
pub fn build_rules(config: &Config) -> Result<Vec<RuleBox>, RegistryError> {
    REGISTRY
        .iter()
        .map(|entry| {
            (entry.factory)(config.rule_config(entry.name)).map_err(|source| {
                RegistryError::InvalidOptions {
                    rule: entry.name,
                    source,
                }
            })
        })
        .collect()
}

/// Restricts `config` to the rules named in `wanted`, by id or by code.
///
/// Named file and graph rules are enabled, opt-in rules included; every
/// other file and graph rule is disabled. Internal diagnostics stay on.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownRule`] if an entry matches no rule.
pub fn restrict_to(config: &mut Config, wanted: &[String]) -> Result<(), RegistryError> {
    let selectable: Vec<RuleSummary> = catalogue()
        .into_iter()
        .filter(|r| r.kind != RuleKind::Internal)
        .collect();
    let is = |row: &RuleSummary, w: &str| row.name == w || row.code.eq_ignore_ascii_case(w);

    if let Some(unknown) = wanted
        .iter()
        .find(|w| !selectable.iter().any(|row| is(row, w.as_str())))
    {
        return Err(RegistryError::UnknownRule(unknown.clone()));
    }

    for row in &selectable {
        let picked = wanted.iter().any(|w| is(row, w.as_str()));
        config.rules.entry(row.name.to_string()).or_default().enabled = Some(picked);
    }
    Ok(())
}

/// Every rule id configuration may mention.
#[must_use]
pub fn known_rule_ids() -> Vec<&'static str> {
    REGISTRY
        .iter()
        .map(|e| e.name)
        .chain(GRAPH_RULES.iter().map(|r| r.name))
        .chain(INTERNAL_RULES.iter().map(|r| r.name))
        .collect()
}

/// All rules, file, graph and internal, sorted by code.
#[must_use]
pub fn catalogue() -> Vec<RuleSummary> {
    let mut rows: Vec<RuleSummary> = all_rules()
        .iter()
        .map(|rule| RuleSummary {
            code: rule.code(),
            name: rule.name(),
            description: rule.description(),
            severity: rule.default_severity(),
            enabled_by_default: rule.enabled_by_default(),
            kind: RuleKind::File,
        })
        .collect();
    for (infos, kind) in [
        (&GRAPH_RULES[..], RuleKind::Graph),
        (&INTERNAL_RULES[..], RuleKind::Internal),
    ] {
        rows.extend(infos.iter().map(|info| RuleSummary {
            code: info.code,
            name: info.name,
            description: info.description,
            severity: info.severity,
            enabled_by_default: true,
            kind,
        }));
    }
    rows.sort_by_key(|r| r.code);
    rows
}
