//! Rule requiring declarations to live in the layer their role belongs to.
//!
//! # Rationale
//!
//! Entities, use cases and repository contracts are domain concepts; models,
//! data sources and repository implementations are data concerns. A use case
//! under `data/` or a model under `domain/` blurs the boundary the layer
//! graph is supposed to enforce.
//!
//! Roles decided only by the folder heuristic are skipped, since they agree
//! with the folder by construction.
//!
//! # Configuration
//!
//! - `allow_suffixes`: extra name suffixes exempt from the check (defaults
//!   exempt `ViewModel`, `UiModel` and `State`, which are presentation types
//!   despite their `Model`-like names)

use layer_lint_core::patterns::Evidence;
use layer_lint_core::utils::naming::ends_with_any;
use layer_lint_core::{
    Diagnostic, Node, NodeKind, Rule, RuleConfig, RuleContext, RuleError, Severity, Suggestion,
};

use crate::support::{classes, is_placed, str_array};

/// Rule code for role-placement.
pub const CODE: &str = "CA101";

/// Rule name for role-placement.
pub const NAME: &str = "role-placement";

/// Requires each role to be declared in its home layer.
#[derive(Debug, Clone)]
pub struct RolePlacement {
    /// Severity level.
    pub severity: Severity,
    /// Name suffixes exempt from the check.
    pub allowed_suffixes: Vec<String>,
}

impl Default for RolePlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl RolePlacement {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
            allowed_suffixes: vec!["ViewModel".into(), "UiModel".into(), "State".into()],
        }
    }

    /// Builds the rule from its `[rules.role-placement]` section.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidOption`] for malformed options.
    pub fn from_config(config: Option<&RuleConfig>) -> Result<Self, RuleError> {
        let mut rule = Self::new();
        rule.allowed_suffixes
            .extend(str_array(config, "allow_suffixes")?);
        Ok(rule)
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for RolePlacement {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Declarations must live in the layer their role belongs to"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let layer = ctx.layer();
        if !is_placed(layer) {
            return Ok(Vec::new());
        }

        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            if ends_with_any(&decl.name, &self.allowed_suffixes) {
                continue;
            }
            let resolved = ctx.role(index);
            if matches!(resolved.evidence, Evidence::LayerHeuristic | Evidence::None) {
                continue;
            }
            let Some(home) = resolved.role.home_layer() else {
                continue;
            };
            if home == layer {
                continue;
            }
            diagnostics.push(
                self.diagnostic(
                    ctx,
                    decl.name_span,
                    format!(
                        "{} '{}' belongs in the {home} layer but is declared in the {layer} layer",
                        capitalize(resolved.role.as_str()),
                        decl.name
                    ),
                )
                .with_suggestion(Suggestion::new(format!(
                    "Move '{}' under a {home} folder",
                    decl.name
                ))),
            );
        }
        Ok(diagnostics)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
