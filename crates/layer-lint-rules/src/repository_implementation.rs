//! Rule checking concrete repositories against their domain contract.
//!
//! # Detected Patterns
//!
//! - A repository implementation that implements no repository interface
//! - A repository implementation whose name lacks an implementation suffix
//!   (`TodoRepositoryImpl`), so it cannot be told apart from the contract

use layer_lint_core::patterns::DeclarationRole;
use layer_lint_core::{
    Diagnostic, Node, NodeKind, Replacement, Rule, RuleContext, RuleError, Severity, Suggestion,
};

use crate::support::classes;

/// Rule code for repository-implementation.
pub const CODE: &str = "CA103";

/// Rule name for repository-implementation.
pub const NAME: &str = "repository-implementation";

/// Requires repository implementations to implement a contract and say so in
/// their name.
#[derive(Debug, Clone)]
pub struct RepositoryImplementation {
    /// Severity level.
    pub severity: Severity,
}

impl Default for RepositoryImplementation {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryImplementation {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }
}

impl Rule for RepositoryImplementation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Repository implementations must implement a domain interface and carry the implementation suffix"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let patterns = ctx.patterns;
        let impl_suffix = ctx
            .config
            .patterns
            .implementation_suffixes
            .first()
            .map_or("Impl", String::as_str);

        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            if ctx.role(index).role != DeclarationRole::RepositoryImplementation {
                continue;
            }

            let contract = patterns.implements_repository.find(decl);
            if contract.is_none() {
                diagnostics.push(
                    self.diagnostic(
                        ctx,
                        decl.name_span,
                        format!(
                            "Repository implementation '{}' does not implement a repository interface",
                            decl.name
                        ),
                    )
                    .with_suggestion(Suggestion::new(
                        "Declare the contract in the domain layer and add an `implements` clause",
                    )),
                );
            }

            if !patterns.repository_impl_name.matches_name(&decl.name) {
                let expected = match contract {
                    Some(ty) => format!("{}{impl_suffix}", ty.simple_name()),
                    None => format!("{}{impl_suffix}", decl.name),
                };
                diagnostics.push(
                    self.diagnostic(
                        ctx,
                        decl.name_span,
                        format!(
                            "Repository implementation '{}' should be named with an implementation suffix",
                            decl.name
                        ),
                    )
                    .with_suggestion(Suggestion::with_fix(
                        format!("Rename to '{expected}'"),
                        Replacement::new(decl.name_span, expected.clone()),
                    )),
                );
            }
        }
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::testing::lint;

    const PATH: &str = "lib/features/todo/data/repositories/todo_repository_impl.dart";

    #[test]
    fn well_formed_implementation_passes() {
        let diags = lint(
            RepositoryImplementation::new(),
            &[(PATH, "class TodoRepositoryImpl implements TodoRepository {}\n")],
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn missing_contract() {
        let diags = lint(
            RepositoryImplementation::new(),
            &[(PATH, "class TodoRepositoryImpl {}\n")],
        );
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("does not implement"));
    }

    #[test]
    fn missing_suffix_suggests_contract_name() {
        let diags = lint(
            RepositoryImplementation::new(),
            &[(PATH, "class SqlTodoStore implements TodoRepository {}\n")],
        );
        assert_eq!(diags.len(), 1);
        let suggestion = diags[0].suggestion.as_ref().unwrap();
        assert_eq!(suggestion.message, "Rename to 'TodoRepositoryImpl'");
        assert_eq!(
            suggestion.replacement.as_ref().map(|r| r.new_text.as_str()),
            Some("TodoRepositoryImpl")
        );
    }

    #[test]
    fn concrete_repository_without_anything() {
        let diags = lint(
            RepositoryImplementation::new(),
            &[(
                "lib/features/todo/data/todo_repository.dart",
                "class TodoRepository {}\n",
            )],
        );
        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags[1].suggestion.as_ref().map(|s| s.message.as_str()),
            Some("Rename to 'TodoRepositoryImpl'")
        );
    }
}
