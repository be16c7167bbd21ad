//! Rule trait and the per-file evaluation context.

use std::cell::{Cell, OnceCell};
use std::time::Instant;

use crate::config::{Config, RuleConfig};
use crate::layer::{Classification, Layer};
use crate::metadata::ProjectMetadata;
use crate::patterns::{PatternLibrary, ResolvedRole};
use crate::source::{ClassDecl, ImportDecl, MethodDecl, SourceUnit, ThrowExpr};
use crate::taxonomy::ExceptionTypeTaxonomy;
use crate::types::{Diagnostic, Location, Severity, Span};

/// Node kinds a rule can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// Class-like declarations.
    Class,
    /// Members of class-like declarations.
    Method,
    /// `throw` expressions.
    Throw,
    /// Import, export and part directives.
    Import,
}

impl NodeKind {
    /// All kinds, in traversal order.
    pub const ALL: [Self; 4] = [Self::Class, Self::Method, Self::Throw, Self::Import];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Class => 0,
            Self::Method => 1,
            Self::Throw => 2,
            Self::Import => 3,
        }
    }
}

/// One node handed to a rule.
///
/// `Class` and `Method` carry the index of their declaration in
/// [`SourceUnit::declarations`] so rules can ask for its memoized role.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// A class-like declaration.
    Class {
        /// Index into the unit's declarations.
        index: usize,
        /// The declaration.
        decl: &'a ClassDecl,
    },
    /// A member of a class-like declaration.
    Method {
        /// Index of the owning declaration.
        owner: usize,
        /// The owning declaration.
        decl: &'a ClassDecl,
        /// The member.
        method: &'a MethodDecl,
    },
    /// A throw site.
    Throw(&'a ThrowExpr),
    /// A directive.
    Import(&'a ImportDecl),
}

impl Node<'_> {
    /// The node's kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Class { .. } => NodeKind::Class,
            Self::Method { .. } => NodeKind::Method,
            Self::Throw(_) => NodeKind::Throw,
            Self::Import(_) => NodeKind::Import,
        }
    }

    /// Start offset, used to keep merged node lists in source order.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Class { decl, .. } => decl.span.offset,
            Self::Method { method, .. } => method.span.offset,
            Self::Throw(t) => t.span.offset,
            Self::Import(i) => i.span.offset,
        }
    }
}

/// Error returned by a rule that cannot evaluate a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// A rule option in configuration has an unusable value.
    #[error("invalid option '{key}': {reason}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Any other evaluation failure.
    #[error("{0}")]
    Failed(String),

    /// The rule stopped early because its time budget ran out.
    #[error("time budget exhausted")]
    BudgetExhausted,
}

/// Static description of a rule id the engine itself emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    /// Kebab-case id.
    pub name: &'static str,
    /// Code (e.g., "CA001").
    pub code: &'static str,
    /// Default severity.
    pub severity: Severity,
    /// One-line description.
    pub description: &'static str,
}

/// A per-file rule evaluated over pre-collected nodes.
///
/// # Example
///
/// ```ignore
/// use layer_lint_core::{Node, NodeKind, Rule, RuleContext, RuleError, Diagnostic};
///
/// pub struct NoPartDirectives;
///
/// impl Rule for NoPartDirectives {
///     fn name(&self) -> &'static str { "no-part-directives" }
///     fn code(&self) -> &'static str { "X001" }
///     fn subscriptions(&self) -> &'static [NodeKind] { &[NodeKind::Import] }
///
///     fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
///         Ok(nodes.iter().filter_map(|n| match n {
///             Node::Import(i) if i.kind == DirectiveKind::Part => {
///                 Some(self.diagnostic(ctx, i.span, "part directives are not allowed"))
///             }
///             _ => None,
///         }).collect())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case id of this rule (e.g., "pass-through").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "CA104").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for diagnostics from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Whether the rule runs when configuration does not mention it.
    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Node kinds this rule wants to see.
    fn subscriptions(&self) -> &'static [NodeKind];

    /// Checks one file.
    ///
    /// `nodes` holds exactly the subscribed kinds, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when the rule cannot evaluate this file; the
    /// engine reports it as a `rule-failure` and carries on.
    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>])
        -> Result<Vec<Diagnostic>, RuleError>;

    /// Builds a diagnostic from this rule at `span` of the current file.
    fn diagnostic(&self, ctx: &RuleContext<'_>, span: Span, message: impl Into<String>) -> Diagnostic
    where
        Self: Sized,
    {
        Diagnostic::new(
            self.code(),
            self.name(),
            self.default_severity(),
            ctx.location(span),
            message,
        )
    }
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

/// Everything a rule may look at for one file.
///
/// Built once per file by the engine and shared by every rule evaluated on
/// that file. Declaration roles are resolved lazily and at most once.
pub struct RuleContext<'a> {
    /// The parsed file.
    pub unit: &'a SourceUnit,
    /// Layer classification of the file.
    pub classification: &'a Classification,
    /// PascalCase feature prefix, when the file is inside a feature folder.
    pub feature_prefix: Option<String>,
    /// Shared pattern library.
    pub patterns: &'a PatternLibrary,
    /// Shared exception taxonomy.
    pub taxonomy: &'a ExceptionTypeTaxonomy,
    /// Full configuration, for rule options.
    pub config: &'a Config,
    /// Optional project metadata.
    pub metadata: Option<&'a dyn ProjectMetadata>,
    roles: Vec<OnceCell<ResolvedRole>>,
    resolutions: Cell<usize>,
    deadline: Cell<Option<Instant>>,
}

impl<'a> RuleContext<'a> {
    /// Creates a context for one file.
    #[must_use]
    pub fn new(
        unit: &'a SourceUnit,
        classification: &'a Classification,
        patterns: &'a PatternLibrary,
        taxonomy: &'a ExceptionTypeTaxonomy,
        config: &'a Config,
    ) -> Self {
        let feature_prefix =
            crate::patterns::extract_feature_prefix(&unit.path, &config.layers.feature_marker);
        Self {
            unit,
            classification,
            feature_prefix,
            patterns,
            taxonomy,
            config,
            metadata: None,
            roles: (0..unit.declarations.len()).map(|_| OnceCell::new()).collect(),
            resolutions: Cell::new(0),
            deadline: Cell::new(None),
        }
    }

    /// Attaches a metadata provider.
    #[must_use]
    pub fn with_metadata(mut self, metadata: &'a dyn ProjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Layer of the file.
    #[must_use]
    pub fn layer(&self) -> Layer {
        self.classification.layer
    }

    /// Role of the declaration at `index`, resolved on first use.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a declaration index of this unit.
    #[must_use]
    pub fn role(&self, index: usize) -> &ResolvedRole {
        self.roles[index].get_or_init(|| {
            self.resolutions.set(self.resolutions.get() + 1);
            self.patterns
                .resolve_role(&self.unit.declarations[index], self.classification)
        })
    }

    /// How many roles were actually resolved so far.
    #[must_use]
    pub fn roles_resolved(&self) -> usize {
        self.resolutions.get()
    }

    /// Configuration block for a rule id, if present.
    #[must_use]
    pub fn rule_config(&self, rule: &str) -> Option<&'a RuleConfig> {
        self.config.rule_config(rule)
    }

    /// Location of `span` in this file.
    #[must_use]
    pub fn location(&self, span: Span) -> Location {
        self.unit.location(span)
    }

    /// Whether the current rule has used up its time budget.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.deadline.get().is_some_and(|d| Instant::now() >= d)
    }

    /// Per-node budget poll for rule loops: `ctx.check_budget()?;`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::BudgetExhausted`] once the deadline has passed.
    /// The engine reports it as `rule-timeout` and drops the rule's output
    /// for the file.
    pub fn check_budget(&self) -> Result<(), RuleError> {
        if self.budget_exhausted() {
            Err(RuleError::BudgetExhausted)
        } else {
            Ok(())
        }
    }

    pub(crate) fn arm_deadline(&self, deadline: Option<Instant>) {
        self.deadline.set(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct TestRule;

    impl Rule for TestRule {
        fn name(&self) -> &'static str {
            "test-rule"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn subscriptions(&self) -> &'static [NodeKind] {
            &[NodeKind::Class]
        }
        fn check(
            &self,
            ctx: &RuleContext<'_>,
            nodes: &[Node<'_>],
        ) -> Result<Vec<Diagnostic>, RuleError> {
            Ok(nodes
                .iter()
                .map(|n| self.diagnostic(ctx, Span::new(n.offset(), 1), "Test violation"))
                .collect())
        }
    }

    fn unit() -> SourceUnit {
        let mut unit = SourceUnit::new(
            Path::new("lib/features/todos/domain/a.dart"),
            "class A {}\nclass B {}\n",
        );
        let mut a = ClassDecl::new("A");
        a.span = Span::new(0, 10);
        let mut b = ClassDecl::new("B");
        b.span = Span::new(11, 10);
        unit.declarations = vec![a, b];
        unit
    }

    #[test]
    fn test_rule_trait_defaults() {
        let rule = TestRule;
        assert_eq!(rule.name(), "test-rule");
        assert_eq!(rule.default_severity(), Severity::Error);
        assert!(rule.enabled_by_default());
    }

    #[test]
    fn roles_are_memoized() {
        let unit = unit();
        let config = Config::default();
        let classification = Classification {
            layer: Layer::Domain,
            feature: Some("todos".into()),
            segment: Some("domain".into()),
        };
        let patterns = PatternLibrary::default();
        let taxonomy = ExceptionTypeTaxonomy::new(&config.exceptions).unwrap();
        let ctx = RuleContext::new(&unit, &classification, &patterns, &taxonomy, &config);

        assert_eq!(ctx.feature_prefix.as_deref(), Some("Todo"));
        let _ = ctx.role(0);
        let _ = ctx.role(0);
        let _ = ctx.role(1);
        assert_eq!(ctx.roles_resolved(), 2);
    }

    #[test]
    fn diagnostics_carry_line_and_column() {
        let unit = unit();
        let config = Config::default();
        let classification = Classification {
            layer: Layer::Domain,
            feature: None,
            segment: None,
        };
        let patterns = PatternLibrary::default();
        let taxonomy = ExceptionTypeTaxonomy::new(&config.exceptions).unwrap();
        let ctx = RuleContext::new(&unit, &classification, &patterns, &taxonomy, &config);

        let nodes: Vec<Node<'_>> = unit
            .declarations
            .iter()
            .enumerate()
            .map(|(index, decl)| Node::Class { index, decl })
            .collect();
        let diags = TestRule.check(&ctx, &nodes).unwrap();
        assert_eq!(diags.len(), 2);
        assert_eq!((diags[1].location.line, diags[1].location.column), (2, 1));
        assert_eq!(diags[1].location.offset, 11);
    }

    #[test]
    fn budget_is_unarmed_by_default() {
        let unit = unit();
        let config = Config::default();
        let classification = Classification {
            layer: Layer::Domain,
            feature: None,
            segment: None,
        };
        let patterns = PatternLibrary::default();
        let taxonomy = ExceptionTypeTaxonomy::new(&config.exceptions).unwrap();
        let ctx = RuleContext::new(&unit, &classification, &patterns, &taxonomy, &config);
        assert!(!ctx.budget_exhausted());
        assert!(ctx.check_budget().is_ok());
        ctx.arm_deadline(Some(Instant::now()));
        assert!(ctx.budget_exhausted());
        assert!(matches!(ctx.check_budget(), Err(RuleError::BudgetExhausted)));
    }
}
