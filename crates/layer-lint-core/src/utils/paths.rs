//! OS-independent path helpers.
//!
//! All paths inside the engine are project-relative and `/`-separated so that
//! classification and ordering do not depend on the host platform.

use std::path::Path;

/// Normalizes a path to a `/`-separated relative form.
///
/// Backslashes become slashes, `.` segments and empty segments are dropped and
/// `..` pops the previous segment when there is one.
///
/// ```ignore
/// assert_eq!(normalize(Path::new("./lib\\features//todo/./a.dart")), "lib/features/todo/a.dart");
/// ```
#[must_use]
pub fn normalize(path: &Path) -> String {
    normalize_str(&path.to_string_lossy())
}

/// String form of [`normalize`].
#[must_use]
pub fn normalize_str(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let mut out: Vec<&str> = Vec::new();
    for segment in replaced.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|s| *s != "..") {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

/// Splits a normalized path into its segments.
#[must_use]
pub fn segments(normalized: &str) -> Vec<&str> {
    normalized.split('/').filter(|s| !s.is_empty()).collect()
}

/// Directory part of a normalized path (`lib/a/b.dart` → `lib/a`).
#[must_use]
pub fn parent(normalized: &str) -> &str {
    normalized.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolves a relative URI against the file that contains it.
///
/// Returns `None` when the result would escape the project root.
#[must_use]
pub fn resolve_relative(from_file: &str, uri: &str) -> Option<String> {
    let dir = parent(from_file);
    let joined = if dir.is_empty() {
        uri.to_string()
    } else {
        format!("{dir}/{uri}")
    };
    let resolved = normalize_str(&joined);
    if resolved.starts_with("..") || resolved.is_empty() {
        None
    } else {
        Some(resolved)
    }
}

/// File stem of a normalized path (`lib/a/user_repo.dart` → `user_repo`).
#[must_use]
pub fn file_stem(normalized: &str) -> &str {
    let name = normalized.rsplit('/').next().unwrap_or(normalized);
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

/// A compiled glob matched against normalized relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGlob {
    raw: String,
    compiled: glob::Pattern,
    /// `rest` of a `**/rest` pattern, so `**/x/**` also matches at the root.
    rootless: Option<glob::Pattern>,
}

impl PathGlob {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns the underlying pattern error for invalid syntax.
    pub fn new(pattern: &str) -> Result<Self, glob::PatternError> {
        let compiled = glob::Pattern::new(&normalize_str(pattern))?;
        let rootless = pattern
            .strip_prefix("**/")
            .map(|rest| glob::Pattern::new(&normalize_str(rest)))
            .transpose()?;
        Ok(Self {
            raw: pattern.to_string(),
            compiled,
            rootless,
        })
    }

    /// Tests a normalized relative path.
    #[must_use]
    pub fn matches(&self, normalized: &str) -> bool {
        self.compiled.matches(normalized)
            || self
                .rootless
                .as_ref()
                .is_some_and(|p| p.matches(normalized))
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_separators_and_dots() {
        assert_eq!(
            normalize(Path::new("./lib\\features//todo/./a.dart")),
            "lib/features/todo/a.dart"
        );
        assert_eq!(normalize_str("lib/a/../b.dart"), "lib/b.dart");
        assert_eq!(normalize_str("/lib/a.dart"), "lib/a.dart");
    }

    #[test]
    fn resolve_relative_walks_up() {
        assert_eq!(
            resolve_relative("lib/data/repo.dart", "../domain/repo.dart").as_deref(),
            Some("lib/domain/repo.dart")
        );
        assert_eq!(
            resolve_relative("lib/a.dart", "b.dart").as_deref(),
            Some("lib/b.dart")
        );
        assert_eq!(resolve_relative("a.dart", "../../x.dart"), None);
    }

    #[test]
    fn file_stem_strips_all_extensions() {
        assert_eq!(file_stem("lib/user.g.dart"), "user");
        assert_eq!(file_stem("user_repository.dart"), "user_repository");
    }

    #[test]
    fn glob_matches_leading_double_star_at_root() {
        let g = PathGlob::new("**/test/**").unwrap();
        assert!(g.matches("test/widget_test.dart"));
        assert!(g.matches("packages/app/test/a.dart"));
        assert!(!g.matches("lib/testing/a.dart"));

        let generated = PathGlob::new("**/*.g.dart").unwrap();
        assert!(generated.matches("lib/models/user.g.dart"));
        assert!(generated.matches("user.g.dart"));
    }

    #[test]
    fn rootless_variant_is_compiled_up_front() {
        assert!(PathGlob::new("**/generated/**").unwrap().rootless.is_some());
        assert!(PathGlob::new("lib/**").unwrap().rootless.is_none());
        assert!(PathGlob::new("**/[").is_err());
    }
}
