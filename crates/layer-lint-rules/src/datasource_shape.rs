//! Rule pairing data source contracts with their implementations.
//!
//! # Detected Patterns
//!
//! - A concrete data source that implements no data source contract
//! - A data source contract with concrete public methods (reported per method)

use layer_lint_core::patterns::DeclarationRole;
use layer_lint_core::{Diagnostic, Node, NodeKind, Rule, RuleContext, RuleError, Severity, Suggestion};

use crate::support::classes;

/// Rule code for datasource-shape.
pub const CODE: &str = "CA107";

/// Rule name for datasource-shape.
pub const NAME: &str = "datasource-shape";

/// Requires data sources to come as an abstract contract plus implementation.
#[derive(Debug, Clone)]
pub struct DataSourceShape {
    /// Severity level.
    pub severity: Severity,
}

impl Default for DataSourceShape {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSourceShape {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }
}

impl Rule for DataSourceShape {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Data sources are split into an abstract contract and an implementation"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }

    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        let mut diagnostics = Vec::new();
        for (index, decl) in classes(nodes) {
            ctx.check_budget()?;
            match ctx.role(index).role {
                DeclarationRole::DataSourceImplementation => {
                    if ctx.patterns.implements_datasource.find(decl).is_some() {
                        continue;
                    }
                    diagnostics.push(
                        self.diagnostic(
                            ctx,
                            decl.name_span,
                            format!(
                                "Data source '{}' does not implement a data source interface",
                                decl.name
                            ),
                        )
                        .with_suggestion(Suggestion::new(
                            "Declare an abstract data source and implement it, so repositories depend on the contract",
                        )),
                    );
                }
                DeclarationRole::DataSourceInterface => {
                    for method in decl.public_methods().filter(|m| !m.is_abstract) {
                        diagnostics.push(
                            self.diagnostic(
                                ctx,
                                method.name_span,
                                format!(
                                    "Data source interface '{}' declares concrete method '{}'",
                                    decl.name, method.name
                                ),
                            )
                            .with_suggestion(Suggestion::new(
                                "Leave the method abstract and implement it in the concrete data source",
                            )),
                        );
                    }
                }
                _ => {}
            }
        }
        Ok(diagnostics)
    }
}
