//! # layer-lint-dart
//!
//! Dart front end for layer-lint.
//!
//! [`DartParser`] parses `.dart` files with the tree-sitter Dart grammar and
//! walks the syntax tree into the language-agnostic [`SourceUnit`] outline:
//! directives, class-like declarations with their supertypes and members, and
//! `throw` sites. A tree containing any error or missing node is reported as a
//! [`ParseError`] rather than outlined partially.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use std::path::Path;

use layer_lint_core::{ParseError, SourceParser, SourceUnit};
use tracing::trace;
use tree_sitter::{Language, Parser};

mod extractor;

/// Dart source parser backed by tree-sitter.
#[derive(Clone)]
pub struct DartParser {
    language: Language,
}

impl DartParser {
    /// Creates a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_dart::LANGUAGE.into(),
        }
    }
}

impl Default for DartParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DartParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DartParser").finish_non_exhaustive()
    }
}

impl SourceParser for DartParser {
    fn language_id(&self) -> &'static str {
        "dart"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".dart"]
    }

    fn parse(&self, path: &Path, content: &str) -> Result<SourceUnit, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::new(format!("Dart grammar unavailable: {e}"), 0))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ParseError::new("parser produced no syntax tree", 0))?;

        let mut unit = SourceUnit::new(path, content);
        let root = tree.root_node();
        extractor::outline(&root, content.as_bytes(), &mut unit)?;
        trace!(
            file = %unit.path_str(),
            nodes = root.descendant_count(),
            declarations = unit.declarations.len(),
            "outlined"
        );
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_lint_core::{DeclKind, DirectiveKind, MethodKind};

    fn parse(src: &str) -> SourceUnit {
        DartParser::new()
            .parse(Path::new("lib/a.dart"), src)
            .unwrap()
    }

    #[test]
    fn directives() {
        let unit = parse(
            "library foo;\nimport 'package:app/domain/user.dart';\nimport 'b.dart' as b show B;\nexport \"c.dart\";\npart 'a.g.dart';\npart of 'x.dart';\n",
        );
        let uris: Vec<_> = unit
            .imports
            .iter()
            .map(|i| (i.uri.as_str(), i.kind))
            .collect();
        assert_eq!(
            uris,
            vec![
                ("package:app/domain/user.dart", DirectiveKind::Import),
                ("b.dart", DirectiveKind::Import),
                ("c.dart", DirectiveKind::Export),
                ("a.g.dart", DirectiveKind::Part),
            ]
        );
        assert_eq!(unit.location(unit.imports[1].span).line, 3);
    }

    #[test]
    fn class_modifiers_and_clauses() {
        let unit = parse(
            "abstract interface class UserRepository implements Repo<User>, Disposable {}\n\
             sealed class Failure {}\n\
             class UserModel extends UserEntity with JsonMixin implements Serializable {}\n\
             mixin Logging on Object {}\n\
             enum Color { red, green }\n\
             extension on String {}\n",
        );
        let d = &unit.declarations;
        assert_eq!(d.len(), 6);
        assert!(d[0].is_abstract && d[0].is_interface);
        assert_eq!(d[0].implements[0].to_string(), "Repo<User>");
        assert_eq!(d[0].implements[1].name, "Disposable");
        assert!(d[1].is_sealed);
        assert_eq!(d[2].extends.as_ref().map(|t| t.name.as_str()), Some("UserEntity"));
        assert_eq!(d[2].mixins[0].name, "JsonMixin");
        assert_eq!(d[3].kind, DeclKind::Mixin);
        assert_eq!(d[4].kind, DeclKind::Enum);
        assert_eq!(d[5].kind, DeclKind::Extension);
    }

    #[test]
    fn members() {
        let unit = parse(
            r"
class UserRepositoryImpl implements UserRepository {
  static const tag = 'repo';
  final RemoteDataSource _remote;
  int a, b = 2;

  UserRepositoryImpl(this._remote);
  factory UserRepositoryImpl.create() => UserRepositoryImpl(Remote());

  @override
  Future<Either<Failure, User?>> getUser(String id, {int retries = 3}) async {
    return right(await _remote.fetch(id));
  }

  int get count => 0;
  set count(int value) {}
  bool operator ==(Object other) => false;
  T pick<T>(List<T> items) => items.first;
  Future<void> close();
}
",
        );
        let class = &unit.declarations[0];
        let fields: Vec<_> = class.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["tag", "_remote", "a", "b"]);
        assert!(class.fields[0].is_static);
        assert_eq!(class.fields[1].ty.as_ref().map(|t| t.name.as_str()), Some("RemoteDataSource"));
        assert_eq!(class.fields[3].ty.as_ref().map(|t| t.name.as_str()), Some("int"));

        let methods: Vec<_> = class
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m.kind))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("UserRepositoryImpl", MethodKind::Constructor),
                ("create", MethodKind::Factory),
                ("getUser", MethodKind::Method),
                ("count", MethodKind::Getter),
                ("count", MethodKind::Setter),
                ("operator==", MethodKind::Operator),
                ("pick", MethodKind::Method),
                ("close", MethodKind::Method),
            ]
        );

        let get_user = &class.methods[2];
        assert_eq!(
            get_user.return_type.as_ref().map(ToString::to_string).as_deref(),
            Some("Future<Either<Failure, User?>>")
        );
        let params: Vec<_> = get_user.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, vec!["id", "retries"]);
        assert!(!get_user.is_abstract);
        assert!(class.methods[7].is_abstract);
        assert_eq!(class.methods[6].return_type.as_ref().map(|t| t.name.as_str()), Some("T"));
    }

    #[test]
    fn return_type_span_covers_type() {
        let src = "abstract class R {\n  Future<Result<User>> load();\n}\n";
        let unit = parse(src);
        let ty = unit.declarations[0].methods[0].return_type.clone().unwrap();
        assert_eq!(&src[ty.span.offset..ty.span.end()], "Future<Result<User>>");
        assert_eq!(&src[ty.args[0].span.offset..ty.args[0].span.end()], "Result<User>");
    }

    #[test]
    fn throws_record_name_and_enclosing_class() {
        let unit = parse(
            "void top() { throw StateError('x'); }\n\
             class A {\n  void f() { if (x) throw const errors.NotFoundException('a'); throw e; }\n}\n",
        );
        let throws: Vec<_> = unit
            .throws
            .iter()
            .map(|t| (t.thrown.as_deref(), t.enclosing))
            .collect();
        assert_eq!(
            throws,
            vec![
                (Some("StateError"), None),
                (Some("NotFoundException"), Some(0)),
                (None, Some(0)),
            ]
        );
    }

    #[test]
    fn strings_and_comments_do_not_create_declarations() {
        let unit = parse(
            "// class Commented {}\nconst s = 'class InString {} throw X()';\n/* class Block {} */\nclass Real {}\n",
        );
        assert_eq!(unit.declarations.len(), 1);
        assert_eq!(unit.declarations[0].name, "Real");
        assert!(unit.throws.is_empty());
    }

    #[test]
    fn unbalanced_delimiters_fail() {
        let parser = DartParser::new();
        let err = parser
            .parse(Path::new("lib/a.dart"), "class A {\n  void f() {\n}\n")
            .unwrap_err();
        assert!(!err.message.is_empty());
        assert!(parser.parse(Path::new("lib/a.dart"), "class A { ) }").is_err());
    }

    #[test]
    fn unterminated_string_fails() {
        let src = "import 'a.dart;\n";
        let err = DartParser::new()
            .parse(Path::new("lib/a.dart"), src)
            .unwrap_err();
        assert!(err.offset <= src.len());
    }

    #[test]
    fn parser_is_reusable_across_files() {
        let parser = DartParser::default();
        for name in ["A", "B"] {
            let unit = parser
                .parse(Path::new("lib/a.dart"), &format!("class {name} {{}}\n"))
                .unwrap();
            assert_eq!(unit.declarations[0].name, name);
        }
    }
}
