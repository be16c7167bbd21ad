//! Rule requiring data models to be tied to a domain entity.
//!
//! A model is the data layer's serializable view of an entity. It either
//! extends (or implements) the entity, `TodoModel extends Todo`, or composes
//! it through an entity field. A model related to no entity usually means
//! domain data is being shaped in the data layer.
//!
//! Models recognized only by their folder are not checked.

use layer_lint_core::patterns::{DeclarationRole, Evidence, Pattern};
use layer_lint_core::{Diagnostic, Node, NodeKind, Rule, RuleContext, RuleError, Severity, Suggestion};

use crate::support::classes;

/// Rule code for model-structure.
pub const CODE: &str = "CA106";

/// Rule name for model-structure.
pub const NAME: &str = "model-structure";

/// Requires models to extend or compose an entity.
#[derive(Debug, Clone)]
pub struct ModelStructure {
    /// Severity level.
    pub severity: Severity,
}

impl Default for ModelStructure {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStructure {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }
}

impl Rule for ModelStructure {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Models extend or compose a domain entity"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let patterns = ctx.patterns;
        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            let resolved = ctx.role(index);
            if resolved.role != DeclarationRole::Model
                || resolved.evidence == Evidence::LayerHeuristic
            {
                continue;
            }

            let stem = patterns.model_name.stem(&decl.name);
            let extends_entity = resolved.supertypes.iter().any(|name| {
                Some(name.as_str()) == stem || patterns.entity_name.matches_name(name)
            });
            if extends_entity || patterns.has_entity_field.matches(decl) {
                continue;
            }

            let entity = stem.map_or_else(|| "the entity".to_string(), |s| format!("'{s}'"));
            diagnostics.push(
                self.diagnostic(
                    ctx,
                    decl.name_span,
                    format!("Model '{}' neither extends nor composes an entity", decl.name),
                )
                .with_suggestion(Suggestion::new(format!(
                    "Extend {entity} or hold it in an entity field"
                ))),
            );
        }
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::testing::lint;

    const PATH: &str = "lib/features/todo/data/models/todo_model.dart";

    #[test]
    fn extending_the_entity_passes() {
        let diags = lint(
            ModelStructure::new(),
            &[
                (
                    PATH,
                    "class TodoModel extends Todo {\n  const TodoModel({required super.id});\n  Map<String, dynamic> toJson() => {'id': id};\n}\n",
                ),
                (
                    "lib/features/user/data/models/user_dto.dart",
                    "class UserDto implements UserEntity {}\n",
                ),
            ],
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn composing_the_entity_passes() {
        let diags = lint(
            ModelStructure::new(),
            &[(
                PATH,
                "class TodoModel {\n  TodoModel(this.entity);\n  final Todo entity;\n}\n",
            )],
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn unrelated_model_is_reported() {
        let diags = lint(
            ModelStructure::new(),
            &[(
                PATH,
                "class TodoModel {\n  final String title;\n  Map<String, dynamic> toJson() => {};\n}\n",
            )],
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Model 'TodoModel' neither extends nor composes an entity");
        assert_eq!(
            diags[0].suggestion.as_ref().map(|s| s.message.as_str()),
            Some("Extend 'Todo' or hold it in an entity field")
        );
    }

    #[test]
    fn folder_only_models_are_skipped() {
        let diags = lint(
            ModelStructure::new(),
            &[(PATH, "class TodoResponse {\n  final int page;\n}\n")],
        );
        assert!(diags.is_empty(), "{diags:?}");
    }
}
