//! Utility modules shared by the engine and rule implementations.

pub mod naming;
pub mod paths;

#[doc(inline)]
pub use naming::{pascal_case, singularize};
#[doc(inline)]
pub use paths::{normalize, PathGlob};
