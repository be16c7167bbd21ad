//! Feature-prefix extraction from path segments.

use std::path::Path;

use crate::utils::naming::{pascal_case, singularize};
use crate::utils::paths;

/// PascalCase type prefix derived from the feature folder of `path`.
///
/// The segment after `marker` is singularized and PascalCased:
/// `lib/features/todos/...` → `Todo`, `lib/features/user_profiles/...` →
/// `UserProfile`. Returns `None` when the path has no feature folder.
#[must_use]
pub fn extract_feature_prefix(path: &Path, marker: &str) -> Option<String> {
    let normalized = paths::normalize(path);
    let segments = paths::segments(&normalized);
    let dirs = &segments[..segments.len().saturating_sub(1)];
    let idx = dirs.iter().position(|s| *s == marker)?;
    let feature = dirs.get(idx + 1)?;
    let prefix = pascal_case(&singularize(feature));
    (!prefix.is_empty()).then_some(prefix)
}

/// `name` with `prefix` prepended, unless it already starts with it.
#[must_use]
pub fn prefixed_name(name: &str, prefix: &str) -> String {
    if name.starts_with(prefix) {
        name.to_string()
    } else {
        format!("{prefix}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_pascal_prefix() {
        let p = Path::new("lib/features/todos/domain/exceptions.dart");
        assert_eq!(extract_feature_prefix(p, "features").as_deref(), Some("Todo"));

        let p = Path::new("lib/features/user_profiles/data/models/x.dart");
        assert_eq!(
            extract_feature_prefix(p, "features").as_deref(),
            Some("UserProfile")
        );

        let p = Path::new("lib/features/categories/domain/x.dart");
        assert_eq!(extract_feature_prefix(p, "features").as_deref(), Some("Category"));
    }

    #[test]
    fn no_marker_or_no_feature_folder() {
        assert_eq!(
            extract_feature_prefix(Path::new("lib/domain/x.dart"), "features"),
            None
        );
        assert_eq!(
            extract_feature_prefix(Path::new("lib/features/x.dart"), "features"),
            None
        );
    }

    #[test]
    fn prefixed_name_is_idempotent() {
        assert_eq!(prefixed_name("NotFoundException", "Todo"), "TodoNotFoundException");
        assert_eq!(prefixed_name("TodoNotFoundException", "Todo"), "TodoNotFoundException");
    }
}
