//! Integration test: whole-pass properties of the engine.
//!
//! Uses a tiny line-based parser (`import 'uri';` and `class Name` lines) so
//! the engine can be exercised without a real language front end.

use layer_lint_core::{
    ClassDecl, Config, Diagnostic, DirectiveKind, Engine, ImportDecl, Node, NodeKind, ParseError,
    Rule, RuleContext, RuleError, SourceFile, SourceParser, SourceUnit, Span,
};
use std::path::Path;

struct LineParser;

impl SourceParser for LineParser {
    fn language_id(&self) -> &'static str {
        "lines"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".dart"]
    }

    fn parse(&self, path: &Path, content: &str) -> Result<SourceUnit, ParseError> {
        let mut unit = SourceUnit::new(path, content);
        let mut offset = 0;
        for line in content.split_inclusive('\n') {
            let text = line.trim_end();
            if let Some(uri) = text
                .strip_prefix("import '")
                .and_then(|rest| rest.strip_suffix("';"))
            {
                unit.imports.push(ImportDecl {
                    uri: uri.to_string(),
                    kind: DirectiveKind::Import,
                    span: Span::new(offset, text.len()),
                });
            } else if let Some(name) = text.strip_prefix("class ") {
                let mut decl = ClassDecl::new(name.trim());
                decl.span = Span::new(offset, text.len());
                decl.name_span = Span::new(offset + 6, name.trim().len());
                unit.declarations.push(decl);
            } else if !text.is_empty() {
                return Err(ParseError::new(format!("unexpected line '{text}'"), offset));
            }
            offset += line.len();
        }
        Ok(unit)
    }
}

/// Reports every class whose name starts with `Bad`.
struct BadNames;

impl Rule for BadNames {
    fn name(&self) -> &'static str {
        "bad-names"
    }
    fn code(&self) -> &'static str {
        "T100"
    }
    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class]
    }
    fn check(&self, ctx: &RuleContext<'_>, nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        Ok(nodes
            .iter()
            .filter_map(|n| match n {
                Node::Class { decl, .. } if decl.name.starts_with("Bad") => {
                    Some(self.diagnostic(ctx, decl.name_span, format!("bad name {}", decl.name)))
                }
                _ => None,
            })
            .collect())
    }
}

/// Always fails.
struct Broken;

impl Rule for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }
    fn code(&self) -> &'static str {
        "T101"
    }
    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Class, NodeKind::Import]
    }
    fn check(&self, _ctx: &RuleContext<'_>, _nodes: &[Node<'_>]) -> Result<Vec<Diagnostic>, RuleError> {
        Err(RuleError::Failed("cannot evaluate".into()))
    }
}

fn engine() -> Engine {
    Engine::builder()
        .config(Config::default())
        .parser(LineParser)
        .rule(BadNames)
        .build()
        .expect("engine should build")
}

fn project() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "lib/features/todo/domain/a.dart",
            "import '../data/b.dart';\nimport '../presentation/p.dart';\nclass BadA\n",
        ),
        SourceFile::new(
            "lib/features/todo/data/b.dart",
            "import '../domain/a.dart';\nclass BadB\nclass Fine\n",
        ),
        SourceFile::new(
            "lib/features/todo/presentation/p.dart",
            "import '../data/b.dart';\nimport '../domain/a.dart';\n",
        ),
        SourceFile::new("lib/core/x.dart", "import 'y.dart';\n"),
        SourceFile::new("lib/core/y.dart", "import 'z.dart';\n"),
        SourceFile::new("lib/core/z.dart", "import 'x.dart';\n"),
    ]
}

// ── P1: determinism ──

#[test]
fn repeated_runs_are_identical() {
    let engine = engine();
    let first = engine.analyze(&project()).expect("analysis should succeed");
    for _ in 0..5 {
        let again = engine.analyze(&project()).expect("analysis should succeed");
        assert_eq!(first.diagnostics, again.diagnostics);
    }

    let mut reversed = project();
    reversed.reverse();
    let shuffled = engine.analyze(&reversed).expect("analysis should succeed");
    assert_eq!(first.diagnostics, shuffled.diagnostics);

    assert_eq!(render(&first.diagnostics), render(&shuffled.diagnostics));
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

// ── P2: edge completeness ──

#[test]
fn every_forbidden_import_is_reported_once() {
    let result = engine().analyze(&project()).expect("analysis should succeed");
    let mut violations: Vec<(String, usize)> = result
        .by_rule("layer-dependency")
        .iter()
        .map(|d| (d.location.file.to_string_lossy().into_owned(), d.location.line))
        .collect();
    violations.sort();
    assert_eq!(
        violations,
        vec![
            ("lib/features/todo/domain/a.dart".to_string(), 1),
            ("lib/features/todo/domain/a.dart".to_string(), 2),
            ("lib/features/todo/presentation/p.dart".to_string(), 1),
        ]
    );
}

// ── P3: cycle dedup ──

#[test]
fn three_file_cycle_reported_once_from_any_start() {
    let result = engine().analyze(&project()).expect("analysis should succeed");
    let cycles: Vec<&Diagnostic> = result
        .by_rule("circular-dependency")
        .into_iter()
        .filter(|d| d.message.contains("lib/core/"))
        .collect();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0]
        .message
        .contains("lib/core/x.dart -> lib/core/y.dart -> lib/core/z.dart -> lib/core/x.dart"));

    let mut rotated = project();
    rotated.rotate_left(4);
    let again = engine().analyze(&rotated).expect("analysis should succeed");
    assert_eq!(result.by_rule("circular-dependency"), again.by_rule("circular-dependency"));
}

// ── P4: failure isolation ──

#[test]
fn broken_rule_does_not_hide_other_rules() {
    let engine = Engine::builder()
        .config(Config::default())
        .parser(LineParser)
        .rule(Broken)
        .rule(BadNames)
        .build()
        .expect("engine should build");
    let files = project();
    let result = engine.analyze(&files[..2]).expect("analysis should succeed");

    assert_eq!(result.by_rule("bad-names").len(), 2);
    let failures = result.by_rule("rule-failure");
    assert_eq!(failures.len(), 2, "one failure per file");
    assert!(failures.iter().all(|d| d.message.contains("'broken'")));
}

#[test]
fn unparsable_file_does_not_stop_the_pass() {
    let mut files = project();
    files.push(SourceFile::new("lib/core/bad.dart", "class BadC\n???\n"));
    let result = engine().analyze(&files).expect("analysis should succeed");
    assert_eq!(result.by_rule("file-parse-error").len(), 1);
    assert_eq!(result.by_rule("bad-names").len(), 2);
}

#[test]
fn imports_into_an_unparsable_file_are_still_layer_checked() {
    let files = vec![
        SourceFile::new(
            "lib/domain/usecases/a.dart",
            "import '../../data/b.dart';\nclass GetThing\n",
        ),
        SourceFile::new("lib/data/b.dart", "import 'unterminated;\n"),
    ];
    let result = engine().analyze(&files).expect("analysis should succeed");

    let parse_errors = result.by_rule("file-parse-error");
    assert_eq!(parse_errors.len(), 1);
    assert_eq!(parse_errors[0].location.file, Path::new("lib/data/b.dart"));

    let layer = result.by_rule("layer-dependency");
    assert_eq!(layer.len(), 1);
    assert_eq!(layer[0].location.file, Path::new("lib/domain/usecases/a.dart"));
    assert!(result.by_rule("unresolved-import").is_empty());
}

#[test]
fn unparsable_file_has_no_outgoing_edges() {
    // b.dart fails to parse, so it contributes a node but no edges.
    let files = vec![
        SourceFile::new("lib/core/a.dart", "import 'b.dart';\n"),
        SourceFile::new("lib/core/b.dart", "import 'a.dart\n"),
    ];
    let result = engine().analyze(&files).expect("analysis should succeed");
    assert_eq!(result.by_rule("file-parse-error").len(), 1);
    assert!(result.by_rule("unresolved-import").is_empty());
    assert!(result.by_rule("circular-dependency").is_empty());
}
