//! Independent, side-effect free declaration predicates.

use std::fmt;

use crate::source::{ClassDecl, TypeRef};
use crate::utils::naming::ends_with_any;

/// A predicate over a class-like declaration.
pub trait Pattern: Send + Sync + fmt::Debug {
    /// Whether the declaration satisfies this pattern.
    fn matches(&self, decl: &ClassDecl) -> bool;
}

/// How a type name is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatcher {
    /// Simple name equals one of these.
    Exact(Vec<String>),
    /// Simple name ends with one of these (and is longer than the suffix).
    Suffix(Vec<String>),
    /// Either of the above.
    ExactOrSuffix {
        /// Exact names.
        exact: Vec<String>,
        /// Name suffixes.
        suffixes: Vec<String>,
    },
}

impl NameMatcher {
    /// Tests a simple (unprefixed) name.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::Exact(names) => names.iter().any(|n| n == name),
            Self::Suffix(suffixes) => ends_with_any(name, suffixes),
            Self::ExactOrSuffix { exact, suffixes } => {
                exact.iter().any(|n| n == name) || ends_with_any(name, suffixes)
            }
        }
    }

    /// Tests a type reference by its simple name.
    #[must_use]
    pub fn matches_type(&self, ty: &TypeRef) -> bool {
        self.matches_name(ty.simple_name())
    }
}

/// Declaration name ends with one of the configured suffixes.
#[derive(Debug, Clone)]
pub struct NameSuffix {
    suffixes: Vec<String>,
}

impl NameSuffix {
    /// Creates the predicate.
    #[must_use]
    pub fn new(suffixes: Vec<String>) -> Self {
        Self { suffixes }
    }

    /// Suffix combinations, e.g. `Repository` × `Impl` → `RepositoryImpl`.
    #[must_use]
    pub fn combined(heads: &[String], tails: &[String]) -> Self {
        let suffixes = heads
            .iter()
            .flat_map(|h| tails.iter().map(move |t| format!("{h}{t}")))
            .collect();
        Self { suffixes }
    }

    /// Tests a bare name.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        ends_with_any(name, &self.suffixes)
    }

    /// Strips the first matching suffix (`UserRepository` → `User`).
    #[must_use]
    pub fn stem<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.suffixes
            .iter()
            .find_map(|s| name.strip_suffix(s.as_str()).filter(|stem| !stem.is_empty()))
    }

    /// The first configured suffix, used in suggestions.
    #[must_use]
    pub fn primary(&self) -> &str {
        self.suffixes.first().map_or("", String::as_str)
    }
}

impl Pattern for NameSuffix {
    fn matches(&self, decl: &ClassDecl) -> bool {
        self.matches_name(&decl.name)
    }
}

/// Declaration cannot be instantiated directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsAbstract;

impl Pattern for IsAbstract {
    fn matches(&self, decl: &ClassDecl) -> bool {
        decl.is_abstract_like()
    }
}

/// Which supertype clause a [`SupertypeMatches`] inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    /// `extends` only.
    Extends,
    /// `implements` only.
    Implements,
    /// `extends`, `with` and `implements`.
    Any,
}

/// A supertype clause contains a matching type name.
#[derive(Debug, Clone)]
pub struct SupertypeMatches {
    clause: Clause,
    names: NameMatcher,
}

impl SupertypeMatches {
    /// Creates the predicate.
    #[must_use]
    pub fn new(clause: Clause, names: NameMatcher) -> Self {
        Self { clause, names }
    }

    /// Returns the first matching supertype.
    #[must_use]
    pub fn find<'a>(&self, decl: &'a ClassDecl) -> Option<&'a TypeRef> {
        match self.clause {
            Clause::Extends => decl.extends.iter().find(|t| self.names.matches_type(t)),
            Clause::Implements => decl.implements.iter().find(|t| self.names.matches_type(t)),
            Clause::Any => decl.supertypes().find(|t| self.names.matches_type(t)),
        }
    }
}

impl Pattern for SupertypeMatches {
    fn matches(&self, decl: &ClassDecl) -> bool {
        self.find(decl).is_some()
    }
}

/// Composes an entity: a field named `entity` or typed by an entity-named type.
#[derive(Debug, Clone)]
pub struct HasEntityField {
    entity_types: NameMatcher,
}

impl HasEntityField {
    /// Creates the predicate from entity name suffixes.
    #[must_use]
    pub fn new(entity_suffixes: Vec<String>) -> Self {
        Self {
            entity_types: NameMatcher::Suffix(entity_suffixes),
        }
    }
}

impl Pattern for HasEntityField {
    fn matches(&self, decl: &ClassDecl) -> bool {
        decl.fields.iter().filter(|f| !f.is_static).any(|f| {
            f.name.trim_start_matches('_') == "entity"
                || f.ty.as_ref().is_some_and(|t| self.entity_types.matches_type(t))
        })
    }
}

/// Exposes exactly one public instance method, and it is an entry point.
#[derive(Debug, Clone)]
pub struct HasSingleCallMethod {
    entry_points: Vec<String>,
}

impl HasSingleCallMethod {
    /// Creates the predicate.
    #[must_use]
    pub fn new(entry_points: Vec<String>) -> Self {
        Self { entry_points }
    }

    /// Number of entry-point methods declared, regardless of other methods.
    #[must_use]
    pub fn entry_point_count(&self, decl: &ClassDecl) -> usize {
        decl.public_methods()
            .filter(|m| self.entry_points.iter().any(|e| *e == m.name))
            .count()
    }
}

impl Pattern for HasSingleCallMethod {
    fn matches(&self, decl: &ClassDecl) -> bool {
        let mut methods = decl.public_methods();
        match (methods.next(), methods.next()) {
            (Some(only), None) => self.entry_points.iter().any(|e| *e == only.name),
            _ => false,
        }
    }
}

/// Declares a member (method, constructor or field) with one of these names.
#[derive(Debug, Clone)]
pub struct HasMemberNamed {
    names: Vec<String>,
}

impl HasMemberNamed {
    /// Creates the predicate.
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Returns the first matching method.
    #[must_use]
    pub fn find<'a>(&self, decl: &'a ClassDecl) -> Option<&'a crate::source::MethodDecl> {
        decl.methods
            .iter()
            .find(|m| self.names.iter().any(|n| *n == m.name))
    }
}

impl Pattern for HasMemberNamed {
    fn matches(&self, decl: &ClassDecl) -> bool {
        self.find(decl).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FieldDecl, MethodDecl, MethodKind};
    use crate::types::Span;

    fn method(name: &str) -> MethodDecl {
        MethodDecl {
            name: name.into(),
            kind: MethodKind::Method,
            return_type: None,
            params: Vec::new(),
            is_abstract: false,
            is_static: false,
            name_span: Span::default(),
            span: Span::default(),
        }
    }

    #[test]
    fn name_suffix_and_stem() {
        let p = NameSuffix::new(vec!["Repository".into()]);
        assert!(p.matches(&ClassDecl::new("UserRepository")));
        assert!(!p.matches(&ClassDecl::new("Repository")));
        assert_eq!(p.stem("UserRepository"), Some("User"));
    }

    #[test]
    fn combined_suffixes() {
        let p = NameSuffix::combined(&["Repository".into()], &["Impl".into(), "Implementation".into()]);
        assert!(p.matches_name("UserRepositoryImpl"));
        assert!(p.matches_name("UserRepositoryImplementation"));
        assert!(!p.matches_name("UserRepository"));
    }

    #[test]
    fn supertype_clause_is_respected() {
        let mut decl = ClassDecl::new("UserRepositoryImpl");
        decl.implements.push(TypeRef::named("UserRepository"));
        let names = NameMatcher::Suffix(vec!["Repository".into()]);
        assert!(SupertypeMatches::new(Clause::Implements, names.clone()).matches(&decl));
        assert!(!SupertypeMatches::new(Clause::Extends, names.clone()).matches(&decl));
        assert!(SupertypeMatches::new(Clause::Any, names).matches(&decl));
    }

    #[test]
    fn entity_field_by_name_or_type() {
        let p = HasEntityField::new(vec!["Entity".into()]);
        let mut by_name = ClassDecl::new("UserModel");
        by_name.fields.push(FieldDecl {
            name: "entity".into(),
            ty: Some(TypeRef::named("User")),
            is_static: false,
            span: Span::default(),
        });
        assert!(p.matches(&by_name));

        let mut by_type = ClassDecl::new("UserModel");
        by_type.fields.push(FieldDecl {
            name: "user".into(),
            ty: Some(TypeRef::named("UserEntity")),
            is_static: false,
            span: Span::default(),
        });
        assert!(p.matches(&by_type));
        assert!(!p.matches(&ClassDecl::new("UserModel")));
    }

    #[test]
    fn single_call_method() {
        let p = HasSingleCallMethod::new(vec!["call".into()]);
        let mut decl = ClassDecl::new("GetUser");
        decl.methods.push(method("call"));
        assert!(p.matches(&decl));

        let mut private_helper = decl.clone();
        private_helper.methods.push(method("_validate"));
        assert!(p.matches(&private_helper));

        decl.methods.push(method("other"));
        assert!(!p.matches(&decl));
        assert_eq!(p.entry_point_count(&decl), 1);
    }
}
