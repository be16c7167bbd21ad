//! Rule checking thrown types against the layer's exception taxonomy.
//!
//! # Rationale
//!
//! Each layer has a vocabulary of failures: the domain throws feature
//! exceptions, the data layer adds infrastructure exceptions such as
//! `ServerException`, and presentation code reports errors through state
//! instead of throwing. The allowed names come from the `[exceptions]`
//! taxonomy, where `{Feature}` stands for the feature prefix.
//!
//! Only constructor throws (`throw TodoNotFoundException(id)`) are checked;
//! rethrowing a caught value names no type.

use layer_lint_core::{Diagnostic, Node, NodeKind, Rule, RuleContext, RuleError, Severity, Suggestion};

/// Rule code for exception-layer.
pub const CODE: &str = "CA110";

/// Rule name for exception-layer.
pub const NAME: &str = "exception-layer";

/// Restricts thrown types per layer.
#[derive(Debug, Clone)]
pub struct ExceptionLayer {
    /// Severity level.
    pub severity: Severity,
}

impl Default for ExceptionLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionLayer {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }
}

impl Rule for ExceptionLayer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Thrown types must be allowed by the layer's exception taxonomy"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Throw]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let layer = ctx.layer();
        if !ctx.taxonomy.restricts(layer) {
            return Ok(Vec::new());
        }
        let prefix = ctx.feature_prefix.as_deref();
        let allowed: Vec<String> = ctx
            .taxonomy
            .allowed_patterns(layer)
            .into_iter()
            .map(|p| match prefix {
                Some(prefix) => p.replace("{Feature}", prefix),
                None => p.to_string(),
            })
            .collect();

        let mut diagnostics = Vec::new();
        for node in nodes {
            ctx.check_budget()?;
            let Node::Throw(throw) = node else {
                continue;
            };
            let Some(thrown) = throw.thrown.as_deref() else {
                continue;
            };
            if ctx.taxonomy.allows(layer, thrown, prefix) {
                continue;
            }

            let suggestion = if allowed.is_empty() {
                format!("The {layer} layer should not throw; surface the failure through state")
            } else {
                format!("Throw one of: {}", allowed.join(", "))
            };
            diagnostics.push(
                self.diagnostic(
                    ctx,
                    throw.span,
                    format!("'{thrown}' must not be thrown in the {layer} layer"),
                )
                .with_suggestion(Suggestion::new(suggestion)),
            );
        }
        Ok(diagnostics)
    }
}
