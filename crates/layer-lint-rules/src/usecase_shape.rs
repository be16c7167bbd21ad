//! Rule checking that use cases expose a single entry point.
//!
//! # Rationale
//!
//! A use case is one business operation. Callers invoke it through `call`
//! (or `execute`); anything else public turns it into a service object.
//!
//! # Detected Patterns
//!
//! - A use case with no public entry-point method
//! - A use case with more than one public instance method
//!
//! Abstract use case bases (`abstract class UseCase<T, P>`) are skipped, as
//! are classes that look like use cases only because of their folder
//! (parameter objects such as `GetTodosParams`).

use layer_lint_core::patterns::{DeclarationRole, Evidence};
use layer_lint_core::{Diagnostic, Node, NodeKind, Rule, RuleContext, RuleError, Severity, Suggestion};

use crate::support::classes;

/// Rule code for usecase-shape.
pub const CODE: &str = "CA105";

/// Rule name for usecase-shape.
pub const NAME: &str = "usecase-shape";

/// Requires use cases to expose exactly one entry point.
#[derive(Debug, Clone)]
pub struct UseCaseShape {
    /// Severity level.
    pub severity: Severity,
}

impl Default for UseCaseShape {
    fn default() -> Self {
        Self::new()
    }
}

impl UseCaseShape {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }
}

impl Rule for UseCaseShape {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Use cases expose a single public entry point"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let entry = ctx
            .config
            .patterns
            .usecase_entry_points
            .first()
            .map_or("call", String::as_str);

        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            let resolved = ctx.role(index);
            if resolved.role != DeclarationRole::UseCase
                || resolved.is_abstract
                || resolved.evidence == Evidence::LayerHeuristic
            {
                continue;
            }
            let members = resolved.members;

            if members.entry_points == 0 {
                diagnostics.push(
                    self.diagnostic(
                        ctx,
                        decl.name_span,
                        format!("Use case '{}' has no '{entry}' entry point", decl.name),
                    )
                    .with_suggestion(Suggestion::new(format!(
                        "Expose the operation as a public '{entry}' method"
                    ))),
                );
            } else if members.public_methods > 1 {
                diagnostics.push(
                    self.diagnostic(
                        ctx,
                        decl.name_span,
                        format!(
                            "Use case '{}' exposes {} public methods; only '{entry}' should be public",
                            decl.name, members.public_methods
                        ),
                    )
                    .with_suggestion(Suggestion::new(
                        "Make helpers private or split the extra operations into their own use cases",
                    )),
                );
            }
        }
        Ok(diagnostics)
    }
}
