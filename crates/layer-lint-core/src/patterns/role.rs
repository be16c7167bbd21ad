//! Declaration role resolution.

use std::fmt;

use serde::Serialize;

use super::predicates::Pattern;
use super::PatternLibrary;
use crate::layer::{Classification, Layer};
use crate::source::{ClassDecl, DeclKind};

/// Architectural purpose of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclarationRole {
    /// Identity-bearing business object.
    Entity,
    /// Immutable value type.
    ValueObject,
    /// Single business operation.
    UseCase,
    /// Abstract repository contract.
    RepositoryInterface,
    /// Concrete repository.
    RepositoryImplementation,
    /// Abstract data source contract.
    DataSourceInterface,
    /// Concrete data source.
    DataSourceImplementation,
    /// Serializable data model.
    Model,
    /// Exception or error type.
    ExceptionType,
    /// Success-or-failure wrapper type.
    ErrorUnionWrapper,
    /// Nothing matched.
    Unknown,
}

impl DeclarationRole {
    /// Human-readable name used in messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::ValueObject => "value object",
            Self::UseCase => "use case",
            Self::RepositoryInterface => "repository interface",
            Self::RepositoryImplementation => "repository implementation",
            Self::DataSourceInterface => "data source interface",
            Self::DataSourceImplementation => "data source implementation",
            Self::Model => "model",
            Self::ExceptionType => "exception type",
            Self::ErrorUnionWrapper => "error-union wrapper",
            Self::Unknown => "unknown",
        }
    }

    /// The layer this role belongs to, if it is pinned to one.
    #[must_use]
    pub fn home_layer(self) -> Option<Layer> {
        match self {
            Self::Entity | Self::ValueObject | Self::UseCase | Self::RepositoryInterface => {
                Some(Layer::Domain)
            }
            Self::RepositoryImplementation
            | Self::DataSourceInterface
            | Self::DataSourceImplementation
            | Self::Model => Some(Layer::Data),
            Self::ExceptionType | Self::ErrorUnionWrapper | Self::Unknown => None,
        }
    }

    /// Repository or data source, interface or implementation.
    #[must_use]
    pub fn is_data_access(self) -> bool {
        matches!(
            self,
            Self::RepositoryInterface
                | Self::RepositoryImplementation
                | Self::DataSourceInterface
                | Self::DataSourceImplementation
        )
    }
}

impl fmt::Display for DeclarationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of evidence decided a role, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Evidence {
    /// An `implements`/`extends` clause.
    Implementation,
    /// Member shape (single entry point, entity field, abstractness).
    Structure,
    /// Name suffix.
    Naming,
    /// The folder the file lives in.
    LayerHeuristic,
    /// Nothing; the role is [`DeclarationRole::Unknown`].
    None,
}

/// Member counts of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    /// Non-static fields.
    pub fields: usize,
    /// Public instance methods.
    pub public_methods: usize,
    /// Public instance methods without a body.
    pub abstract_methods: usize,
    /// Public entry-point methods (`call`, `execute`).
    pub entry_points: usize,
    /// Declares a serialization member (`toJson`, `fromJson`).
    pub has_serialization: bool,
}

/// A role together with the facts it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRole {
    /// Resolved role.
    pub role: DeclarationRole,
    /// Evidence tier that decided it.
    pub evidence: Evidence,
    /// Declaration name.
    pub name: String,
    /// Simple names of all supertypes.
    pub supertypes: Vec<String>,
    /// `abstract` or `sealed`.
    pub is_abstract: bool,
    /// Member counts.
    pub members: MemberSummary,
}

// Folder names that imply a role when nothing stronger applies.
const SEGMENT_ROLES: &[(&str, DeclarationRole)] = &[
    ("entities", DeclarationRole::Entity),
    ("value_objects", DeclarationRole::ValueObject),
    ("usecases", DeclarationRole::UseCase),
    ("use_cases", DeclarationRole::UseCase),
    ("models", DeclarationRole::Model),
    ("dtos", DeclarationRole::Model),
];

impl PatternLibrary {
    /// Resolves the role of one declaration.
    ///
    /// Precedence: supertype evidence, then structure, then naming, then the
    /// folder heuristic. Only plain classes get a role; mixins, enums and
    /// extensions are [`DeclarationRole::Unknown`].
    #[must_use]
    pub fn resolve_role(&self, decl: &ClassDecl, classification: &Classification) -> ResolvedRole {
        let (role, evidence) = if decl.kind == DeclKind::Class {
            self.decide(decl, classification)
        } else {
            (DeclarationRole::Unknown, Evidence::None)
        };
        ResolvedRole {
            role,
            evidence,
            name: decl.name.clone(),
            supertypes: decl.supertypes().map(|t| t.simple_name().to_string()).collect(),
            is_abstract: decl.is_abstract_like(),
            members: self.summarize(decl),
        }
    }

    fn summarize(&self, decl: &ClassDecl) -> MemberSummary {
        MemberSummary {
            fields: decl.fields.iter().filter(|f| !f.is_static).count(),
            public_methods: decl.public_methods().count(),
            abstract_methods: decl.public_methods().filter(|m| m.is_abstract).count(),
            entry_points: self.single_call.entry_point_count(decl),
            has_serialization: self.serialization.matches(decl),
        }
    }

    fn decide(
        &self,
        decl: &ClassDecl,
        classification: &Classification,
    ) -> (DeclarationRole, Evidence) {
        use DeclarationRole as R;

        let abstract_like = decl.is_abstract_like();

        if self.extends_error_union.matches(decl) {
            return (R::ErrorUnionWrapper, Evidence::Implementation);
        }
        if self.extends_exception.matches(decl) {
            return (R::ExceptionType, Evidence::Implementation);
        }
        if self.implements_repository.matches(decl) {
            let role = if abstract_like {
                R::RepositoryInterface
            } else {
                R::RepositoryImplementation
            };
            return (role, Evidence::Implementation);
        }
        if self.implements_datasource.matches(decl) {
            let role = if abstract_like {
                R::DataSourceInterface
            } else {
                R::DataSourceImplementation
            };
            return (role, Evidence::Implementation);
        }
        if self.extends_value_object.matches(decl) {
            return (R::ValueObject, Evidence::Implementation);
        }

        if abstract_like && self.repository_name.matches(decl) {
            return (R::RepositoryInterface, Evidence::Structure);
        }
        if abstract_like && self.datasource_name.matches(decl) {
            return (R::DataSourceInterface, Evidence::Structure);
        }
        if !abstract_like && self.single_call.matches(decl) {
            return (R::UseCase, Evidence::Structure);
        }
        if !abstract_like && self.has_entity_field.matches(decl) {
            return (R::Model, Evidence::Structure);
        }

        if self.exception_name.matches(decl) {
            return (R::ExceptionType, Evidence::Naming);
        }
        if self.repository_impl_name.matches(decl) {
            return (R::RepositoryImplementation, Evidence::Naming);
        }
        if self.repository_name.matches(decl) {
            // A concrete repository in the domain is still meant as the contract.
            let role = if classification.layer == Layer::Domain {
                R::RepositoryInterface
            } else {
                R::RepositoryImplementation
            };
            return (role, Evidence::Naming);
        }
        if self.datasource_name.matches(decl) || self.datasource_impl_name.matches(decl) {
            return (R::DataSourceImplementation, Evidence::Naming);
        }
        if self.usecase_name.matches(decl) {
            return (R::UseCase, Evidence::Naming);
        }
        if self.model_name.matches(decl) {
            return (R::Model, Evidence::Naming);
        }
        if self.entity_name.matches(decl) {
            return (R::Entity, Evidence::Naming);
        }

        if let Some(segment) = classification.segment.as_deref() {
            let lowered = segment.to_lowercase();
            if let Some((_, role)) = SEGMENT_ROLES.iter().find(|(s, _)| *s == lowered) {
                return (*role, Evidence::LayerHeuristic);
            }
        }
        if classification.layer == Layer::Data && self.serialization.matches(decl) {
            return (R::Model, Evidence::LayerHeuristic);
        }

        (R::Unknown, Evidence::None)
    }
}
