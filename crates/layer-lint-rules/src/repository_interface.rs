//! Rule requiring domain repositories to be abstract contracts.
//!
//! # Rationale
//!
//! The domain layer declares what it needs from storage; the data layer
//! decides how. A concrete repository class in `domain/` either drags
//! implementation details into the domain or hides the missing contract.

use layer_lint_core::patterns::DeclarationRole;
use layer_lint_core::{
    Diagnostic, Layer, Node, NodeKind, Replacement, Rule, RuleContext, RuleError, Severity, Span,
    Suggestion,
};

use crate::support::classes;

/// Rule code for repository-interface.
pub const CODE: &str = "CA102";

/// Rule name for repository-interface.
pub const NAME: &str = "repository-interface";

/// Requires repositories in the domain layer to be `abstract`.
#[derive(Debug, Clone)]
pub struct RepositoryInterface {
    /// Severity level.
    pub severity: Severity,
}

impl Default for RepositoryInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryInterface {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }
}

impl Rule for RepositoryInterface {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Domain repositories must be abstract contracts"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        if ctx.layer() != Layer::Domain {
            return Ok(Vec::new());
        }

        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            if ctx.role(index).role != DeclarationRole::RepositoryInterface
                || decl.is_abstract_like()
            {
                continue;
            }
            diagnostics.push(
                self.diagnostic(
                    ctx,
                    decl.name_span,
                    format!(
                        "Repository '{}' in the domain layer must be abstract",
                        decl.name
                    ),
                )
                .with_suggestion(Suggestion::with_fix(
                    "Declare it as an abstract class and move the implementation to the data layer",
                    Replacement::new(Span::new(decl.span.offset, 0), "abstract "),
                )),
            );
        }
        Ok(diagnostics)
    }
}
