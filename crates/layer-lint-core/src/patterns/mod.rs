//! Pattern matcher library.
//!
//! Small, stateless predicates over declarations plus the capability
//! functions rules compose: role resolution, error-union detection and
//! feature-prefix extraction. A [`PatternLibrary`] is built once from
//! [`PatternsConfig`] and shared read-only by every worker.

mod feature;
mod predicates;
mod role;
mod shape;

pub use feature::{extract_feature_prefix, prefixed_name};
pub use predicates::{
    Clause, HasEntityField, HasMemberNamed, HasSingleCallMethod, IsAbstract, NameMatcher,
    NameSuffix, Pattern, SupertypeMatches,
};
pub use role::{DeclarationRole, Evidence, MemberSummary, ResolvedRole};
pub use shape::TypeShape;

use crate::config::PatternsConfig;
use crate::source::{ClassDecl, MethodDecl, TypeRef};

/// Every predicate the built-in rules need, configured once.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    /// Entity naming.
    pub entity_name: NameSuffix,
    /// Model naming.
    pub model_name: NameSuffix,
    /// Use case naming.
    pub usecase_name: NameSuffix,
    /// Repository naming (interface form).
    pub repository_name: NameSuffix,
    /// Repository implementation naming (`UserRepositoryImpl`).
    pub repository_impl_name: NameSuffix,
    /// Data source naming (interface form).
    pub datasource_name: NameSuffix,
    /// Data source implementation naming.
    pub datasource_impl_name: NameSuffix,
    /// Exception naming.
    pub exception_name: NameSuffix,
    /// Implements or extends a repository contract.
    pub implements_repository: SupertypeMatches,
    /// Implements or extends a data source contract.
    pub implements_datasource: SupertypeMatches,
    /// Extends an exception base type.
    pub extends_exception: SupertypeMatches,
    /// Extends a value object base type.
    pub extends_value_object: SupertypeMatches,
    /// Extends an error-union type.
    pub extends_error_union: SupertypeMatches,
    /// Composes an entity.
    pub has_entity_field: HasEntityField,
    /// Single public entry point.
    pub single_call: HasSingleCallMethod,
    /// Declares serialization members.
    pub serialization: HasMemberNamed,
    /// Return type walker.
    pub shape: TypeShape,
}

impl PatternLibrary {
    /// Builds the library from naming conventions.
    #[must_use]
    pub fn new(config: &PatternsConfig) -> Self {
        let supertype_suffix = |clause, suffixes: &[String]| {
            SupertypeMatches::new(clause, NameMatcher::Suffix(suffixes.to_vec()))
        };
        Self {
            entity_name: NameSuffix::new(config.entity_suffixes.clone()),
            model_name: NameSuffix::new(config.model_suffixes.clone()),
            usecase_name: NameSuffix::new(config.usecase_suffixes.clone()),
            repository_name: NameSuffix::new(config.repository_suffixes.clone()),
            repository_impl_name: NameSuffix::combined(
                &config.repository_suffixes,
                &config.implementation_suffixes,
            ),
            datasource_name: NameSuffix::new(config.datasource_suffixes.clone()),
            datasource_impl_name: NameSuffix::combined(
                &config.datasource_suffixes,
                &config.implementation_suffixes,
            ),
            exception_name: NameSuffix::new(config.exception_suffixes.clone()),
            implements_repository: supertype_suffix(Clause::Any, &config.repository_suffixes),
            implements_datasource: supertype_suffix(Clause::Any, &config.datasource_suffixes),
            extends_exception: SupertypeMatches::new(
                Clause::Any,
                NameMatcher::ExactOrSuffix {
                    exact: config.exception_bases.clone(),
                    suffixes: config.exception_suffixes.clone(),
                },
            ),
            extends_value_object: SupertypeMatches::new(
                Clause::Any,
                NameMatcher::Exact(config.value_object_bases.clone()),
            ),
            extends_error_union: SupertypeMatches::new(
                Clause::Any,
                NameMatcher::Exact(config.error_union_types.clone()),
            ),
            has_entity_field: HasEntityField::new(config.entity_suffixes.clone()),
            single_call: HasSingleCallMethod::new(config.usecase_entry_points.clone()),
            serialization: HasMemberNamed::new(config.serialization_members.clone()),
            shape: TypeShape::new(
                config.error_union_types.clone(),
                config.async_wrappers.clone(),
            ),
        }
    }

    /// The error-union node a method's declared return type wraps, if any.
    #[must_use]
    pub fn error_union_return<'a>(&self, method: &'a MethodDecl) -> Option<&'a TypeRef> {
        method
            .return_type
            .as_ref()
            .and_then(|ty| self.shape.find_error_union(ty))
    }

    /// The repository or data source contract a declaration implements.
    #[must_use]
    pub fn implemented_contract<'a>(&self, decl: &'a ClassDecl) -> Option<&'a TypeRef> {
        self.implements_repository
            .find(decl)
            .or_else(|| self.implements_datasource.find(decl))
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new(&PatternsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MethodKind;
    use crate::types::Span;

    #[test]
    fn error_union_return_uses_the_shape_walker() {
        let lib = PatternLibrary::default();
        let method = MethodDecl {
            name: "getUser".into(),
            kind: MethodKind::Method,
            return_type: Some(TypeRef::named("Future").with_args(vec![TypeRef::named("Either")
                .with_args(vec![TypeRef::named("Failure"), TypeRef::named("User")])])),
            params: Vec::new(),
            is_abstract: false,
            is_static: false,
            name_span: Span::default(),
            span: Span::default(),
        };
        assert_eq!(lib.error_union_return(&method).map(|t| t.name.as_str()), Some("Either"));
    }

    #[test]
    fn implemented_contract_prefers_repositories() {
        let lib = PatternLibrary::default();
        let mut decl = ClassDecl::new("UserRepositoryImpl");
        decl.implements.push(TypeRef::named("UserRepository"));
        assert_eq!(
            lib.implemented_contract(&decl).map(|t| t.name.as_str()),
            Some("UserRepository")
        );
    }
}
