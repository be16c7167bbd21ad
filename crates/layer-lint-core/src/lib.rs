//! # layer-lint-core
//!
//! Core engine for linting layered (clean-architecture) codebases.
//!
//! This crate provides the language-agnostic building blocks:
//!
//! - [`LayerClassifier`] mapping file paths to [`Layer`]s
//! - [`patterns`] with declaration predicates, role resolution and the
//!   error-union type-shape walker
//! - [`Rule`] trait and the [`Engine`] that runs rules once per file
//! - [`graph`] for forbidden layer edges and import cycles
//! - [`Reporter`] merging everything into a deterministic [`LintResult`]
//!
//! Source files are turned into [`SourceUnit`]s by a [`SourceParser`]
//! implementation supplied by the caller.
//!
//! ## Example
//!
//! ```ignore
//! use layer_lint_core::{Config, Engine, SourceFile};
//!
//! let engine = Engine::builder()
//!     .config(Config::default())
//!     .parser(DartParser::new())
//!     .rules(layer_lint_rules::all_rules())
//!     .build()?;
//!
//! let result = engine.analyze(&[SourceFile::new("lib/domain/user.dart", source)])?;
//! for d in &result.diagnostics {
//!     println!("{d}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod layer;
mod metadata;
mod report;
mod rule;
mod source;
mod taxonomy;
mod types;

/// Dependency graph construction and cycle detection.
pub mod graph;
/// Declaration predicates, role resolution and type-shape matching.
pub mod patterns;
/// Utility modules for rule implementations.
pub mod utils;

pub use config::{
    AnalyzerConfig, Config, ConfigError, ExceptionsConfig, ForbiddenDependency, LayerEntry,
    LayersConfig, PatternsConfig, RuleConfig,
};
pub use engine::{
    CancellationToken, Engine, EngineBuilder, EngineError, FILE_PARSE_ERROR, INTERNAL_RULES,
    RULE_FAILURE, RULE_TIMEOUT,
};
pub use graph::{DependencyEdge, DependencyGraph, GRAPH_RULES};
pub use layer::{Classification, DependencyPolicy, Layer, LayerClassifier};
pub use metadata::{companion_test_path, FsMetadata, InMemoryMetadata, ProjectMetadata};
pub use patterns::{DeclarationRole, PatternLibrary, ResolvedRole};
pub use report::Reporter;
pub use rule::{Node, NodeKind, Rule, RuleBox, RuleContext, RuleError, RuleInfo};
pub use source::{
    ClassDecl, DeclKind, DirectiveKind, FieldDecl, ImportDecl, LineIndex, MethodDecl,
    MethodKind, ParamDecl, ParseError, SourceFile, SourceParser, SourceUnit, ThrowExpr, TypeRef,
};
pub use taxonomy::ExceptionTypeTaxonomy;
pub use types::{
    Diagnostic, Label, LintResult, Location, MietteDiagnostic, Replacement, Severity, Span,
    Suggestion, Summary,
};
