//! Language-agnostic source model.
//!
//! A [`SourceParser`] turns file contents into a [`SourceUnit`]: the outline of
//! one file (directives, class-like declarations, members, throw sites) with
//! byte spans. The engine never looks at raw text again after this point.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{Location, Span};
use crate::utils::paths;

/// A file handed to the engine: project-relative path plus contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// Full file contents.
    pub content: String,
}

impl SourceFile {
    /// Creates a new source file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Maps byte offsets to 1-indexed line/column pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Builds the index for `content`.
    #[must_use]
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Returns `(line, column)` for a byte offset, both 1-indexed.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        (line + 1, offset - start + 1)
    }
}

/// Kind of a file-level directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `import '...';`
    Import,
    /// `export '...';`
    Export,
    /// `part '...';`
    Part,
}

/// An import-like directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// The URI exactly as written, without quotes.
    pub uri: String,
    /// Directive kind.
    pub kind: DirectiveKind,
    /// Span of the whole directive.
    pub span: Span,
}

/// A structural type reference: generic name plus type arguments.
///
/// `Future<Result<User, Failure>>` is `Future[Result[User, Failure]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Possibly prefixed name (`Future`, `dartz.Either`).
    pub name: String,
    /// Type arguments in declaration order.
    pub args: Vec<TypeRef>,
    /// Whether the type is marked nullable (`T?`).
    pub nullable: bool,
    /// Span of the whole type expression.
    pub span: Span,
}

impl TypeRef {
    /// Creates a non-generic type reference without a span.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            nullable: false,
            span: Span::default(),
        }
    }

    /// Adds type arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    /// Sets the span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Name without any import prefix (`dartz.Either` → `Either`).
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Whether this is `void` (or `Null`).
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self.simple_name(), "void" | "Null")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Kind of a class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// `class`, including `abstract`, `sealed`, `base`, `final`, `interface` variants.
    Class,
    /// `mixin` / `mixin class`.
    Mixin,
    /// `enum`.
    Enum,
    /// `extension`.
    Extension,
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Declared type, when written.
    pub ty: Option<TypeRef>,
    /// `static` member.
    pub is_static: bool,
    /// Span of the field name.
    pub span: Span,
}

/// Kind of a method-like member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Plain method.
    Method,
    /// `get` accessor.
    Getter,
    /// `set` accessor.
    Setter,
    /// Generative constructor.
    Constructor,
    /// `factory` constructor.
    Factory,
    /// `operator` overload.
    Operator,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Declared type, when written.
    pub ty: Option<TypeRef>,
}

/// A method, accessor or constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    /// Member name (`fromJson` for `User.fromJson`).
    pub name: String,
    /// Member kind.
    pub kind: MethodKind,
    /// Declared return type, when written.
    pub return_type: Option<TypeRef>,
    /// Parameters.
    pub params: Vec<ParamDecl>,
    /// No body (`;` terminated, non-external).
    pub is_abstract: bool,
    /// `static` member.
    pub is_static: bool,
    /// Span of the member name.
    pub name_span: Span,
    /// Span of the whole member.
    pub span: Span,
}

impl MethodDecl {
    /// Library-private member (leading underscore).
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    /// Public instance method (not an accessor, constructor or operator).
    #[must_use]
    pub fn is_public_instance_method(&self) -> bool {
        self.kind == MethodKind::Method && !self.is_static && !self.is_private()
    }
}

/// A class-like declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    /// Declared name.
    pub name: String,
    /// Declaration kind.
    pub kind: DeclKind,
    /// `abstract` modifier present.
    pub is_abstract: bool,
    /// `interface` modifier present.
    pub is_interface: bool,
    /// `sealed` modifier present.
    pub is_sealed: bool,
    /// `extends` clause.
    pub extends: Option<TypeRef>,
    /// `implements` clause.
    pub implements: Vec<TypeRef>,
    /// `with` clause.
    pub mixins: Vec<TypeRef>,
    /// Fields.
    pub fields: Vec<FieldDecl>,
    /// Methods, accessors and constructors.
    pub methods: Vec<MethodDecl>,
    /// Span of the declared name.
    pub name_span: Span,
    /// Span of the whole declaration.
    pub span: Span,
}

impl ClassDecl {
    /// Creates an empty concrete class; mostly useful in tests.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DeclKind::Class,
            is_abstract: false,
            is_interface: false,
            is_sealed: false,
            extends: None,
            implements: Vec::new(),
            mixins: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            name_span: Span::default(),
            span: Span::default(),
        }
    }

    /// All supertypes: `extends`, then `with`, then `implements`.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.extends
            .iter()
            .chain(self.mixins.iter())
            .chain(self.implements.iter())
    }

    /// Cannot be instantiated directly (`abstract` or `sealed`).
    #[must_use]
    pub fn is_abstract_like(&self) -> bool {
        self.is_abstract || self.is_sealed
    }

    /// Public instance methods.
    pub fn public_methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| m.is_public_instance_method())
    }
}

/// A `throw` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowExpr {
    /// Type/constructor name of the thrown value, when it is a constructor call.
    pub thrown: Option<String>,
    /// Index into [`SourceUnit::declarations`] of the enclosing class.
    pub enclosing: Option<usize>,
    /// Span of the throw expression.
    pub span: Span,
}

/// One parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Normalized project-relative path.
    pub path: PathBuf,
    /// Directives in source order.
    pub imports: Vec<ImportDecl>,
    /// Class-like declarations in source order.
    pub declarations: Vec<ClassDecl>,
    /// Throw sites in source order.
    pub throws: Vec<ThrowExpr>,
    /// Offset to line/column mapping.
    pub line_index: LineIndex,
}

impl SourceUnit {
    /// Creates an empty unit for `path` with the line index of `content`.
    #[must_use]
    pub fn new(path: &Path, content: &str) -> Self {
        Self {
            path: PathBuf::from(paths::normalize(path)),
            imports: Vec::new(),
            declarations: Vec::new(),
            throws: Vec::new(),
            line_index: LineIndex::new(content),
        }
    }

    /// The normalized path as a `/`-separated string.
    #[must_use]
    pub fn path_str(&self) -> String {
        paths::normalize(&self.path)
    }

    /// Resolves a span to a full [`Location`] in this file.
    #[must_use]
    pub fn location(&self, span: Span) -> Location {
        let (line, column) = self.line_index.line_col(span.offset);
        Location::new(self.path.clone(), line, column).with_span(span)
    }
}

/// Error returned when a file cannot be turned into a [`SourceUnit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// Byte offset where the problem was detected.
    pub offset: usize,
}

impl ParseError {
    /// Creates a parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Extension point turning source text into a [`SourceUnit`].
pub trait SourceParser: Send + Sync {
    /// Language identifier (e.g., `"dart"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this parser handles (e.g., `&[".dart"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Parses one file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the file is not well-formed enough to outline.
    fn parse(&self, path: &Path, content: &str) -> Result<SourceUnit, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_maps_offsets() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(1), (1, 2));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(6), (3, 1));
        assert_eq!(index.line_col(8), (4, 2));
    }

    #[test]
    fn type_ref_display_and_simple_name() {
        let ty = TypeRef::named("Future").with_args(vec![TypeRef::named("dartz.Either")
            .with_args(vec![TypeRef::named("Failure"), TypeRef::named("User")])]);
        assert_eq!(ty.to_string(), "Future<dartz.Either<Failure, User>>");
        assert_eq!(ty.args[0].simple_name(), "Either");
    }

    #[test]
    fn unit_location_resolves_line() {
        let unit = SourceUnit::new(Path::new("./lib\\a.dart"), "x\ny");
        let loc = unit.location(Span::new(2, 1));
        assert_eq!(loc.file, PathBuf::from("lib/a.dart"));
        assert_eq!((loc.line, loc.column), (2, 1));
    }
}
