//! # layer-lint-rules
//!
//! Built-in clean-architecture rules for layer-lint.
//!
//! Each rule is a small, stateless [`Rule`] that subscribes to the node kinds
//! it needs and composes the predicates of [`layer_lint_core::patterns`].
//! Rules never look at paths or names directly when a capability function
//! exists for the question.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | CA101 | `role-placement` | Declarations live in the layer their role belongs to |
//! | CA102 | `repository-interface` | Domain repositories are abstract |
//! | CA103 | `repository-implementation` | Repository implementations implement a contract and carry the `Impl` suffix |
//! | CA104 | `pass-through` | Repositories and data sources do not return error unions |
//! | CA105 | `usecase-shape` | Use cases expose a single `call` entry point |
//! | CA106 | `model-structure` | Models extend or compose an entity |
//! | CA107 | `datasource-shape` | Data sources pair an abstract contract with an implementation |
//! | CA108 | `entity-purity` | Entities carry no serialization members or model types |
//! | CA109 | `exception-naming` | Feature exceptions carry the feature prefix |
//! | CA110 | `exception-layer` | Thrown types are allowed by the layer's taxonomy |
//! | CA111 | `test-coverage` | Companion test exists (opt-in) |
//!
//! Graph rules (CA001-CA004) and internal diagnostics (CA900-CA902) are
//! emitted by the engine; [`registry::catalogue`] lists them alongside.
//!
//! ## Usage
//!
//! ```ignore
//! use layer_lint_core::Engine;
//! use layer_lint_dart::DartParser;
//!
//! let rules = layer_lint_rules::registry::build_rules(&config)?;
//! let engine = Engine::builder()
//!     .config(config)
//!     .parser(DartParser::new())
//!     .rules(rules)
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod datasource_shape;
mod entity_purity;
mod exception_layer;
mod exception_naming;
mod model_structure;
mod pass_through;
pub mod registry;
mod repository_implementation;
mod repository_interface;
mod role_placement;
mod support;
mod test_coverage;
mod usecase_shape;

pub use datasource_shape::DataSourceShape;
pub use entity_purity::EntityPurity;
pub use exception_layer::ExceptionLayer;
pub use exception_naming::ExceptionNaming;
pub use model_structure::ModelStructure;
pub use pass_through::PassThrough;
pub use registry::{
    all_rules, build_rules, catalogue, known_rule_ids, restrict_to, RegistryError, RuleKind,
    RuleSummary,
};
pub use repository_implementation::RepositoryImplementation;
pub use repository_interface::RepositoryInterface;
pub use role_placement::RolePlacement;
pub use test_coverage::TestCoverage;
pub use usecase_shape::UseCaseShape;

/// Re-export core types for convenience.
pub use layer_lint_core::{Diagnostic, Rule, Severity};
