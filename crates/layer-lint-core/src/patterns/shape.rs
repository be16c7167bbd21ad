//! Structural type-shape walker.
//!
//! Decides whether a return type wraps its value in an error union by walking
//! the [`TypeRef`] tree, never by looking at the text of the type.
//!
//! The policy is fixed: peel any number of async wrappers that carry exactly
//! one type argument, then the remaining type must itself be an error union.
//! Any other generic (collections, maps, streams unless configured) stops the
//! walk.

use crate::source::TypeRef;

/// Error-union detection over type reference trees.
#[derive(Debug, Clone)]
pub struct TypeShape {
    error_unions: Vec<String>,
    async_wrappers: Vec<String>,
}

impl TypeShape {
    /// Creates a walker from configured wrapper names.
    #[must_use]
    pub fn new(error_unions: Vec<String>, async_wrappers: Vec<String>) -> Self {
        Self {
            error_unions,
            async_wrappers,
        }
    }

    /// Whether the type itself is an error union (`Result<T, E>`).
    #[must_use]
    pub fn is_error_union(&self, ty: &TypeRef) -> bool {
        let name = ty.simple_name();
        self.error_unions.iter().any(|u| u == name)
    }

    /// Whether the type is an async wrapper with a single argument.
    #[must_use]
    pub fn is_async_wrapper(&self, ty: &TypeRef) -> bool {
        ty.args.len() == 1 && self.async_wrappers.iter().any(|w| w == ty.simple_name())
    }

    /// Peels async wrappers (`Future<FutureOr<T>>` → `T`).
    #[must_use]
    pub fn unwrap_async<'a>(&self, ty: &'a TypeRef) -> &'a TypeRef {
        let mut current = ty;
        while self.is_async_wrapper(current) {
            current = &current.args[0];
        }
        current
    }

    /// Returns the error-union node a return type wraps, if any.
    #[must_use]
    pub fn find_error_union<'a>(&self, ty: &'a TypeRef) -> Option<&'a TypeRef> {
        let inner = self.unwrap_async(ty);
        self.is_error_union(inner).then_some(inner)
    }

    /// Whether a return type wraps its result in an error union.
    #[must_use]
    pub fn wraps_error_union(&self, ty: &TypeRef) -> bool {
        self.find_error_union(ty).is_some()
    }
}
