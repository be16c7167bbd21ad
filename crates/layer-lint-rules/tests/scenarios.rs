//! End-to-end scenarios: Dart sources through the parser, every built-in
//! rule and the graph checks.

use std::path::Path;
use std::time::{Duration, Instant};

use layer_lint_core::patterns::{DeclarationRole, Evidence};
use layer_lint_core::{
    Config, Engine, Layer, LintResult, PatternLibrary, SourceFile, SourceParser,
};
use layer_lint_dart::DartParser;
use layer_lint_rules::build_rules;

fn engine() -> Engine {
    let config = Config::default();
    let rules = build_rules(&config).unwrap();
    Engine::builder()
        .config(config)
        .parser(DartParser::new())
        .rules(rules)
        .build()
        .unwrap()
}

fn analyze(files: &[(&str, &str)]) -> LintResult {
    let sources: Vec<SourceFile> = files
        .iter()
        .map(|(path, content)| SourceFile::new(*path, *content))
        .collect();
    engine().analyze(&sources).unwrap()
}

const USER_REPOSITORY: &str = "lib/domain/repositories/user_repository.dart";
const USER_REPOSITORY_SRC: &str = r"import '../entities/user.dart';

abstract class UserRepository {
  Future<User> getUser(String id);
}
";

const USER_ENTITY: &str = "lib/domain/entities/user.dart";
const USER_ENTITY_SRC: &str = r"class User {
  const User(this.id);
  final String id;
}
";

#[test]
fn abstract_domain_repository_is_clean() {
    let result = analyze(&[
        (USER_REPOSITORY, USER_REPOSITORY_SRC),
        (USER_ENTITY, USER_ENTITY_SRC),
    ]);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.files_checked, 2);

    let engine = engine();
    let classification = engine
        .classifier()
        .classify_detailed(Path::new(USER_REPOSITORY));
    assert_eq!(classification.layer, Layer::Domain);

    let unit = DartParser::new()
        .parse(Path::new(USER_REPOSITORY), USER_REPOSITORY_SRC)
        .unwrap();
    let role = PatternLibrary::default().resolve_role(&unit.declarations[0], &classification);
    assert_eq!(role.role, DeclarationRole::RepositoryInterface);
    assert_eq!(role.evidence, Evidence::Structure);
}

#[test]
fn wrapped_result_in_repository_implementation() {
    let impl_src = r"import '../../domain/entities/user.dart';
import '../../domain/repositories/user_repository.dart';

class UserRepositoryImpl implements UserRepository {
  UserRepositoryImpl(this._api);
  final UserApi _api;

  @override
  Future<Result<User, Failure>> getUser(String id) async {
    return Result.ok(await _api.fetch(id));
  }
}
";
    let result = analyze(&[
        (USER_REPOSITORY, USER_REPOSITORY_SRC),
        (USER_ENTITY, USER_ENTITY_SRC),
        ("lib/data/repositories/user_repository_impl.dart", impl_src),
    ]);

    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    let d = &result.diagnostics[0];
    assert_eq!(d.rule, "pass-through");
    assert_eq!(d.code, "CA104");
    assert_eq!((d.location.line, d.location.column), (9, 3));
    assert_eq!(
        &impl_src[d.location.offset..d.location.offset + d.location.length],
        "Future<Result<User, Failure>>"
    );
}

#[test]
fn import_cycle_across_layers_is_reported_once() {
    let result = analyze(&[
        ("lib/domain/a.dart", "import '../data/b.dart';\n\nclass A {}\n"),
        ("lib/data/b.dart", "import '../domain/a.dart';\n\nclass B {}\n"),
    ]);

    let cycles = result.by_rule("circular-dependency");
    assert_eq!(cycles.len(), 1, "{:?}", result.diagnostics);
    assert_eq!(
        cycles[0].message,
        "Circular dependency between 2 files: lib/data/b.dart -> lib/domain/a.dart -> lib/data/b.dart"
    );
    // The domain -> data edge is a layer violation in its own right.
    assert_eq!(result.by_rule("layer-dependency").len(), 1);
}

#[test]
fn feature_exception_without_prefix() {
    let src = "class NotFoundException implements Exception {\n  const NotFoundException(this.id);\n  final String id;\n}\n";
    let result = analyze(&[("lib/features/todo/domain/exceptions/not_found_exception.dart", src)]);

    let naming = result.by_rule("exception-naming");
    assert_eq!(naming.len(), 1, "{:?}", result.diagnostics);
    let suggestion = naming[0].suggestion.as_ref().unwrap();
    assert_eq!(suggestion.message, "Rename to 'TodoNotFoundException'");
    assert_eq!(
        suggestion.replacement.as_ref().map(|r| r.new_text.as_str()),
        Some("TodoNotFoundException")
    );
}

fn independent_files(count: usize) -> Vec<SourceFile> {
    (0..count)
        .map(|i| {
            SourceFile::new(
                format!("lib/features/f{i}/domain/entities/item_{i}.dart"),
                format!(
                    "class Item{i} {{\n  const Item{i}(this.id, this.label);\n  final String id;\n  final String label;\n\n  Item{i} rename(String next) => Item{i}(id, next);\n}}\n"
                ),
            )
        })
        .collect()
}

fn time(engine: &Engine, files: &[SourceFile]) -> Duration {
    let start = Instant::now();
    let result = engine.analyze(files).unwrap();
    let elapsed = start.elapsed();
    assert_eq!(result.files_checked, files.len());
    assert!(result.diagnostics.is_empty(), "{:?}", &result.diagnostics[..1]);
    elapsed
}

#[test]
fn ten_thousand_independent_files_scale_linearly() {
    let engine = engine();
    let small = independent_files(2_000);
    let large = independent_files(10_000);

    // Warm up the worker pool.
    let _ = time(&engine, &small);
    let small_time = time(&engine, &small);
    let large_time = time(&engine, &large);

    // 5x the files: linear work lands near 5x, quadratic near 25x.
    let floor = small_time.max(Duration::from_millis(20));
    assert!(
        large_time < floor * 12,
        "2k files took {small_time:?}, 10k files took {large_time:?}"
    );
}

#[test]
fn clean_feature_produces_no_diagnostics() {
    let files = [
        (
            "lib/features/todos/domain/entities/todo.dart",
            r"class Todo {
  const Todo({required this.id, required this.title});
  final String id;
  final String title;
}
",
        ),
        (
            "lib/features/todos/domain/repositories/todo_repository.dart",
            r"import '../entities/todo.dart';

abstract class TodoRepository {
  Future<List<Todo>> getTodos();
  Future<Todo> getTodo(String id);
}
",
        ),
        (
            "lib/features/todos/domain/exceptions/todo_exceptions.dart",
            r"class TodoNotFoundException implements Exception {
  const TodoNotFoundException(this.message);
  final String message;
}
",
        ),
        (
            "lib/features/todos/domain/usecases/get_todos.dart",
            r"import 'package:dartz/dartz.dart';

import '../entities/todo.dart';
import '../exceptions/todo_exceptions.dart';
import '../repositories/todo_repository.dart';

class GetTodos {
  GetTodos(this._repository);
  final TodoRepository _repository;

  Future<Either<TodoFailure, List<Todo>>> call() async {
    try {
      return Right(await _repository.getTodos());
    } on TodoNotFoundException catch (e) {
      return Left(TodoFailure(e.message));
    }
  }
}
",
        ),
        (
            "lib/features/todos/data/models/todo_model.dart",
            r"import '../../domain/entities/todo.dart';

class TodoModel extends Todo {
  const TodoModel({required super.id, required super.title});

  factory TodoModel.fromJson(Map<String, dynamic> json) =>
      TodoModel(id: json['id'] as String, title: json['title'] as String);

  Map<String, dynamic> toJson() => {'id': id, 'title': title};
}
",
        ),
        (
            "lib/features/todos/data/datasources/todo_remote_data_source.dart",
            r"import '../models/todo_model.dart';

abstract class TodoRemoteDataSource {
  Future<List<TodoModel>> fetchTodos();
}

class TodoRemoteDataSourceImpl implements TodoRemoteDataSource {
  TodoRemoteDataSourceImpl(this._client);
  final HttpClient _client;

  @override
  Future<List<TodoModel>> fetchTodos() async {
    final response = await _client.get('/todos');
    if (response.statusCode != 200) {
      throw ServerException(response.statusCode);
    }
    return (response.data as List).map((e) => TodoModel.fromJson(e)).toList();
  }
}
",
        ),
        (
            "lib/features/todos/data/repositories/todo_repository_impl.dart",
            r"import '../../domain/entities/todo.dart';
import '../../domain/exceptions/todo_exceptions.dart';
import '../../domain/repositories/todo_repository.dart';
import '../datasources/todo_remote_data_source.dart';

class TodoRepositoryImpl implements TodoRepository {
  TodoRepositoryImpl(this._remote);
  final TodoRemoteDataSource _remote;

  @override
  Future<List<Todo>> getTodos() => _remote.fetchTodos();

  @override
  Future<Todo> getTodo(String id) async {
    final todos = await _remote.fetchTodos();
    return todos.firstWhere((t) => t.id == id, orElse: () => throw TodoNotFoundException(id));
  }
}
",
        ),
        (
            "lib/features/todos/presentation/pages/todo_page.dart",
            r"import '../../domain/usecases/get_todos.dart';

class TodoPage {
  TodoPage(this._getTodos);
  final GetTodos _getTodos;

  Future<String> render() async {
    final todos = await _getTodos();
    return todos.fold((failure) => 'error', (items) => '${items.length} todos');
  }
}
",
        ),
    ];

    let result = analyze(&files);
    assert_eq!(result.files_checked, files.len());
    assert!(result.diagnostics.is_empty(), "{:#?}", result.diagnostics);
}

#[test]
fn layered_violations_in_one_pass() {
    let result = analyze(&[
        (
            "lib/features/todos/domain/entities/todo.dart",
            "import '../../data/models/todo_model.dart';\n\nclass Todo {\n  final TodoModel raw;\n  Map<String, dynamic> toJson() => {};\n}\n",
        ),
        (
            "lib/features/todos/data/models/todo_model.dart",
            "class TodoModel {\n  final String id;\n}\n",
        ),
        (
            "lib/features/todos/presentation/todo_page.dart",
            "class TodoPage {\n  void onTap() {\n    throw Exception('unexpected');\n  }\n}\n",
        ),
    ]);

    let rules: Vec<&str> = result.diagnostics.iter().map(|d| d.rule.as_str()).collect();
    for expected in [
        "layer-dependency",
        "entity-purity",
        "model-structure",
        "exception-layer",
    ] {
        assert!(rules.contains(&expected), "missing {expected}: {rules:?}");
    }
    assert_eq!(result.by_rule("entity-purity").len(), 2);
    assert!(result.has_errors());
}
