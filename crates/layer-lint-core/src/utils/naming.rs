//! Identifier case helpers.

/// Singularizes an English plural the way folder names are usually written.
///
/// `-ies` becomes `-y`, a trailing `s` is stripped unless the word ends in `ss`.
#[must_use]
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Converts `snake_case`, `kebab-case` or `lower` words to `PascalCase`.
#[must_use]
pub fn pascal_case(word: &str) -> String {
    word.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Whether `name` ends with any of `suffixes`, compared case-sensitively.
#[must_use]
pub fn ends_with_any(name: &str, suffixes: &[String]) -> bool {
    suffixes
        .iter()
        .any(|s| !s.is_empty() && name.len() > s.len() && name.ends_with(s.as_str()))
}
