//! Rule requiring feature exceptions to carry the feature prefix.
//!
//! Exceptions declared under `lib/features/todos/` are named
//! `Todo...Exception`, so a stack trace or a `catch` clause tells which
//! feature failed. The prefix is the singular PascalCase form of the feature
//! folder.
//!
//! # Configuration
//!
//! - `allow`: exception names exempt from the check

use layer_lint_core::patterns::{prefixed_name, DeclarationRole};
use layer_lint_core::{
    Diagnostic, Node, NodeKind, Replacement, Rule, RuleConfig, RuleContext, RuleError, Severity,
    Suggestion,
};

use crate::support::{classes, str_array};

/// Rule code for exception-naming.
pub const CODE: &str = "CA109";

/// Rule name for exception-naming.
pub const NAME: &str = "exception-naming";

/// Requires exception types inside a feature to start with its prefix.
#[derive(Debug, Clone)]
pub struct ExceptionNaming {
    /// Severity level.
    pub severity: Severity,
    /// Exempt names.
    pub allow: Vec<String>,
}

impl Default for ExceptionNaming {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionNaming {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
            allow: Vec::new(),
        }
    }

    /// Builds the rule from its `[rules.exception-naming]` section.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidOption`] for malformed options.
    pub fn from_config(config: Option<&RuleConfig>) -> Result<Self, RuleError> {
        Ok(Self {
            allow: str_array(config, "allow")?,
            ..Self::new()
        })
    }
}

impl Rule for ExceptionNaming {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Exceptions declared in a feature carry the feature prefix"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let Some(prefix) = ctx.feature_prefix.as_deref() else {
            return Ok(Vec::new());
        };
        let feature = ctx.classification.feature.as_deref().unwrap_or(prefix);

        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            if ctx.role(index).role != DeclarationRole::ExceptionType
                || decl.name.starts_with(prefix)
                || self.allow.iter().any(|a| *a == decl.name)
            {
                continue;
            }
            let expected = prefixed_name(&decl.name, prefix);
            diagnostics.push(
                self.diagnostic(
                    ctx,
                    decl.name_span,
                    format!(
                        "Exception '{}' in feature '{feature}' should start with '{prefix}'",
                        decl.name
                    ),
                )
                .with_suggestion(Suggestion::with_fix(
                    format!("Rename to '{expected}'"),
                    Replacement::new(decl.name_span, expected.clone()),
                )),
            );
        }
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::testing::lint;

    const PATH: &str = "lib/features/todos/domain/exceptions/todo_exceptions.dart";

    #[test]
    fn unprefixed_exception_gets_rename_fix() {
        let src = "class NotFoundException implements Exception {\n  const NotFoundException(this.id);\n  final String id;\n}\n";
        let diags = lint(ExceptionNaming::new(), &[(PATH, src)]);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "Exception 'NotFoundException' in feature 'todos' should start with 'Todo'"
        );
        let fix = diags[0]
            .suggestion
            .as_ref()
            .and_then(|s| s.replacement.as_ref())
            .unwrap();
        assert_eq!(fix.new_text, "TodoNotFoundException");
        assert_eq!(&src[fix.span.offset..fix.span.offset + fix.span.length], "NotFoundException");
    }

    #[test]
    fn prefixed_and_non_feature_exceptions_pass() {
        let diags = lint(
            ExceptionNaming::new(),
            &[
                (PATH, "class TodoNotFoundException implements Exception {}\n"),
                ("lib/core/errors/exceptions.dart", "class ServerException implements Exception {}\n"),
            ],
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn allow_list_exempts_names() {
        let config = layer_lint_core::Config::parse(
            "[rules.exception-naming]\nallow = [\"ValidationException\"]\n",
        )
        .unwrap();
        let rule = ExceptionNaming::from_config(config.rule_config(NAME)).unwrap();
        let diags = lint(
            rule,
            &[(PATH, "class ValidationException implements Exception {}\n")],
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn plural_feature_folders_are_singularized() {
        let diags = lint(
            ExceptionNaming::new(),
            &[(
                "lib/features/categories/data/category_errors.dart",
                "class MissingError extends Error {}\n",
            )],
        );
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.ends_with("should start with 'Category'"));
    }
}
