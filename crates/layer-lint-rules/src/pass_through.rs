//! Rule enforcing the pass-through error convention in data access.
//!
//! # Rationale
//!
//! Repositories and data sources let failures propagate as exceptions; the
//! use case decides how to fold them into an error union. A data-access
//! method returning `Future<Either<Failure, T>>` handles errors a layer too
//! early.
//!
//! # Detected Patterns
//!
//! Public instance methods of repository and data source classes (contracts
//! and implementations) whose declared return type is an error union, either
//! directly (`Result<T, E>`) or under async wrappers
//! (`Future<Result<T, E>>`). An error union nested anywhere else, for example
//! `Future<List<Result<T, E>>>`, is not a wrapped result and is not reported.

use layer_lint_core::{
    Diagnostic, Node, NodeKind, Rule, RuleContext, RuleError, Severity, Suggestion,
};

/// Rule code for pass-through.
pub const CODE: &str = "CA104";

/// Rule name for pass-through.
pub const NAME: &str = "pass-through";

/// Forbids error-union return types on repository and data source methods.
#[derive(Debug, Clone)]
pub struct PassThrough {
    /// Severity level.
    pub severity: Severity,
}

impl Default for PassThrough {
    fn default() -> Self {
        Self::new()
    }
}

impl PassThrough {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }
}

impl Rule for PassThrough {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Repositories and data sources must not wrap results in error unions"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Method]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let mut diagnostics = Vec::new();
        for node in nodes {
            ctx.check_budget()?;
            let Node::Method {
                owner,
                decl,
                method,
            } = *node
            else {
                continue;
            };
            if !method.is_public_instance_method() {
                continue;
            }
            let Some(return_type) = &method.return_type else {
                continue;
            };
            let Some(union) = ctx.patterns.error_union_return(method) else {
                continue;
            };
            let role = ctx.role(owner).role;
            if !role.is_data_access() {
                continue;
            }

            diagnostics.push(
                self.diagnostic(
                    ctx,
                    return_type.span,
                    format!(
                        "'{}.{}' returns '{return_type}'; a {role} should not wrap results in '{}'",
                        decl.name,
                        method.name,
                        union.simple_name()
                    ),
                )
                .with_suggestion(Suggestion::new(
                    "Return the success type and throw on failure; convert to an error union in the use case",
                )),
            );
        }
        Ok(diagnostics)
    }
}
