//! Opt-in rule requiring a companion test for domain and data files.
//!
//! `lib/features/todo/domain/usecases/get_todos.dart` is covered by
//! `test/features/todo/domain/usecases/get_todos_test.dart`. Files that only
//! declare abstract contracts, enums or extensions need no test.
//!
//! The rule needs project metadata; without it every file passes.
//!
//! # Configuration
//!
//! - `layers`: layers to check (default `["domain", "data"]`)

use layer_lint_core::{
    companion_test_path, DeclKind, Diagnostic, Layer, Node, NodeKind, Rule, RuleConfig,
    RuleContext, RuleError, Severity, Suggestion,
};
use tracing::trace;

use crate::support::{classes, layers};

/// Rule code for test-coverage.
pub const CODE: &str = "CA111";

/// Rule name for test-coverage.
pub const NAME: &str = "test-coverage";

/// Requires a companion test file for concrete classes in selected layers.
#[derive(Debug, Clone)]
pub struct TestCoverage {
    /// Severity level.
    pub severity: Severity,
    /// Layers to check.
    pub layers: Vec<Layer>,
}

impl Default for TestCoverage {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCoverage {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Info,
            layers: vec![Layer::Domain, Layer::Data],
        }
    }

    /// Builds the rule from its `[rules.test-coverage]` section.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidOption`] for malformed options.
    pub fn from_config(config: Option<&RuleConfig>) -> Result<Self, RuleError> {
        let mut rule = Self::new();
        let configured = layers(config, "layers")?;
        if !configured.is_empty() {
            rule.layers = configured;
        }
        Ok(rule)
    }
}

impl Rule for TestCoverage {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Concrete domain and data classes have a companion test file"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn enabled_by_default(&self) -> bool {
        false
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let Some(metadata) = ctx.metadata else {
            trace!("{NAME}: no project metadata for {}", ctx.unit.path.display());
            return Ok(Vec::new());
        };
        if !self.layers.contains(&ctx.layer()) {
            return Ok(Vec::new());
        }
        let Some((_, first)) = classes(nodes)
            .find(|(_, decl)| decl.kind == DeclKind::Class && !decl.is_abstract_like())
        else {
            return Ok(Vec::new());
        };
        ctx.check_budget()?;
        if metadata.has_companion_test(&ctx.unit.path) {
            return Ok(Vec::new());
        }

        let analyzer = &ctx.config.analyzer;
        let expected = companion_test_path(
            &ctx.unit.path_str(),
            &analyzer.source_root,
            &analyzer.test_root,
        );
        Ok(vec![self
            .diagnostic(
                ctx,
                first.name_span,
                format!("No test found for '{}'", ctx.unit.path_str()),
            )
            .with_suggestion(Suggestion::new(format!("Add '{expected}'")))])
    }
}
