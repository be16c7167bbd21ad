//! Read-only project metadata consumed by extension rules.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::AnalyzerConfig;
use crate::utils::paths;

/// Facts about the project beyond the analyzed sources.
pub trait ProjectMetadata: Send + Sync {
    /// Whether a companion test exists for the given source path.
    fn has_companion_test(&self, path: &Path) -> bool;
}

/// Maps a source path to the path of its companion test.
///
/// `lib/features/todo/get_todo.dart` → `test/features/todo/get_todo_test.dart`.
/// Paths outside the source root keep their directories under the test root.
#[must_use]
pub fn companion_test_path(source: &str, source_root: &str, test_root: &str) -> String {
    let normalized = paths::normalize_str(source);
    let source_root = paths::normalize_str(source_root);
    let relative = normalized
        .strip_prefix(&format!("{source_root}/"))
        .unwrap_or(&normalized);
    let (dir, file) = relative.rsplit_once('/').unwrap_or(("", relative));
    let test_file = match file.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_test.{ext}"),
        None => format!("{file}_test"),
    };
    let test_root = paths::normalize_str(test_root);
    [test_root.as_str(), dir, test_file.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Metadata backed by an explicit set of test paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    source_root: String,
    test_root: String,
    tests: BTreeSet<String>,
}

impl InMemoryMetadata {
    /// Creates an empty provider using the configured roots.
    #[must_use]
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            source_root: config.source_root.clone(),
            test_root: config.test_root.clone(),
            tests: BTreeSet::new(),
        }
    }

    /// Registers an existing test file.
    #[must_use]
    pub fn with_test(mut self, path: impl AsRef<Path>) -> Self {
        self.tests.insert(paths::normalize(path.as_ref()));
        self
    }
}

impl ProjectMetadata for InMemoryMetadata {
    fn has_companion_test(&self, path: &Path) -> bool {
        let expected = companion_test_path(
            &paths::normalize(path),
            &self.source_root,
            &self.test_root,
        );
        self.tests.contains(&expected)
    }
}

/// Metadata read from the file system once, at construction.
#[derive(Debug, Clone)]
pub struct FsMetadata {
    inner: InMemoryMetadata,
}

impl FsMetadata {
    /// Scans `<root>/<test_root>` for test files.
    ///
    /// A missing test directory yields a provider that reports no tests.
    #[must_use]
    pub fn scan(root: &Path, config: &AnalyzerConfig) -> Self {
        let mut inner = InMemoryMetadata::new(config);
        let test_dir: PathBuf = root.join(&config.test_root);
        for entry in WalkDir::new(&test_dir)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if let Ok(relative) = entry.path().strip_prefix(root) {
                inner.tests.insert(paths::normalize(relative));
            }
        }
        debug!(
            "Found {} test files under {}",
            inner.tests.len(),
            test_dir.display()
        );
        Self { inner }
    }
}

impl ProjectMetadata for FsMetadata {
    fn has_companion_test(&self, path: &Path) -> bool {
        self.inner.has_companion_test(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_path_mirrors_source_tree() {
        assert_eq!(
            companion_test_path("lib/features/todo/get_todo.dart", "lib", "test"),
            "test/features/todo/get_todo_test.dart"
        );
        assert_eq!(
            companion_test_path("bin/main.dart", "lib", "test"),
            "test/bin/main_test.dart"
        );
    }

    #[test]
    fn in_memory_lookup() {
        let meta = InMemoryMetadata::new(&AnalyzerConfig::default())
            .with_test("test/domain/user_test.dart");
        assert!(meta.has_companion_test(Path::new("lib/domain/user.dart")));
        assert!(!meta.has_companion_test(Path::new("lib/domain/order.dart")));
    }

    #[test]
    fn fs_scan_finds_tests() {
        let dir = tempfile::tempdir().unwrap();
        let test_dir = dir.path().join("test/domain");
        std::fs::create_dir_all(&test_dir).unwrap();
        std::fs::write(test_dir.join("user_test.dart"), "void main() {}").unwrap();

        let meta = FsMetadata::scan(dir.path(), &AnalyzerConfig::default());
        assert!(meta.has_companion_test(Path::new("lib/domain/user.dart")));
        assert!(!meta.has_companion_test(Path::new("lib/data/user.dart")));
    }

    #[test]
    fn fs_scan_without_test_dir() {
        let dir = tempfile::tempdir().unwrap();
        let meta = FsMetadata::scan(dir.path(), &AnalyzerConfig::default());
        assert!(!meta.has_companion_test(Path::new("lib/a.dart")));
    }
}
