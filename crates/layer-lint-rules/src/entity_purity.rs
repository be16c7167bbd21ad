//! Rule keeping entities free of data-layer concerns.
//!
//! # Rationale
//!
//! Entities describe the business; how they are stored or sent over the wire
//! is the model's job. Serialization members and model-typed fields on an
//! entity couple the domain to a data format.
//!
//! # Detected Patterns
//!
//! - Serialization members (`toJson`, `fromJson`, `toMap`, `fromMap`),
//!   including factory constructors such as `Todo.fromJson`
//! - Fields whose type mentions a model type (`TodoModel`, `List<UserDto>`)

use layer_lint_core::patterns::DeclarationRole;
use layer_lint_core::{
    Diagnostic, Node, NodeKind, Rule, RuleContext, RuleError, Severity, Suggestion, TypeRef,
};

use crate::support::classes;

/// Rule code for entity-purity.
pub const CODE: &str = "CA108";

/// Rule name for entity-purity.
pub const NAME: &str = "entity-purity";

/// Forbids serialization and model types on entities.
#[derive(Debug, Clone)]
pub struct EntityPurity {
    /// Severity level.
    pub severity: Severity,
}

impl Default for EntityPurity {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityPurity {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }
}

impl Rule for EntityPurity {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Entities carry no serialization members or model types"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let serialization = &ctx.config.patterns.serialization_members;
        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            if ctx.role(index).role != DeclarationRole::Entity {
                continue;
            }

            for method in decl
                .methods
                .iter()
                .filter(|m| serialization.iter().any(|s| *s == m.name))
            {
                diagnostics.push(
                    self.diagnostic(
                        ctx,
                        method.name_span,
                        format!(
                            "Entity '{}' declares serialization member '{}'",
                            decl.name, method.name
                        ),
                    )
                    .with_suggestion(Suggestion::new(
                        "Move serialization to a model in the data layer",
                    )),
                );
            }

            for field in decl.fields.iter().filter(|f| !f.is_static) {
                let Some(model) = field
                    .ty
                    .as_ref()
                    .and_then(|ty| find_type(ty, &|t| ctx.patterns.model_name.matches_name(t.simple_name())))
                else {
                    continue;
                };
                diagnostics.push(
                    self.diagnostic(
                        ctx,
                        field.span,
                        format!(
                            "Entity '{}' field '{}' uses model type '{}'",
                            decl.name,
                            field.name,
                            model.simple_name()
                        ),
                    )
                    .with_suggestion(Suggestion::new(
                        "Use the corresponding entity type and map in the data layer",
                    )),
                );
            }
        }
        Ok(diagnostics)
    }
}

/// First type in `ty` or its arguments, depth first, satisfying `pred`.
fn find_type<'t>(ty: &'t TypeRef, pred: &dyn Fn(&TypeRef) -> bool) -> Option<&'t TypeRef> {
    if pred(ty) {
        return Some(ty);
    }
    ty.args.iter().find_map(|arg| find_type(arg, pred))
}
