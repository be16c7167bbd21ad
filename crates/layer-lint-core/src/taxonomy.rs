//! Exception type taxonomy shared by every rule that reasons about throws.

use std::collections::BTreeMap;

use dashmap::DashMap;

use crate::config::{ConfigError, ExceptionsConfig};
use crate::layer::Layer;

const FEATURE_PLACEHOLDER: &str = "{Feature}";

#[derive(Debug, Clone)]
struct NamePattern {
    raw: String,
    compiled: Compiled,
}

#[derive(Debug, Clone)]
enum Compiled {
    Fixed(glob::Pattern),
    /// `{Feature}` patterns, compiled once per feature prefix on first use.
    PerFeature(DashMap<String, glob::Pattern>),
}

impl NamePattern {
    fn new(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |e: glob::PatternError| ConfigError::InvalidGlob {
            pattern: raw.to_string(),
            reason: e.to_string(),
        };
        let compiled = if raw.contains(FEATURE_PLACEHOLDER) {
            glob::Pattern::new(&raw.replace(FEATURE_PLACEHOLDER, "Feature")).map_err(invalid)?;
            Compiled::PerFeature(DashMap::new())
        } else {
            Compiled::Fixed(glob::Pattern::new(raw).map_err(invalid)?)
        };
        Ok(Self {
            raw: raw.to_string(),
            compiled,
        })
    }

    fn matches(&self, name: &str, feature_prefix: Option<&str>) -> bool {
        let (cache, prefix) = match (&self.compiled, feature_prefix) {
            (Compiled::Fixed(pattern), _) => return pattern.matches(name),
            (Compiled::PerFeature(_), None) => return false,
            (Compiled::PerFeature(cache), Some(prefix)) => (cache, prefix),
        };
        if let Some(pattern) = cache.get(prefix) {
            return pattern.matches(name);
        }
        let expanded = self
            .raw
            .replace(FEATURE_PLACEHOLDER, &glob::Pattern::escape(prefix));
        match glob::Pattern::new(&expanded) {
            Ok(pattern) => {
                let hit = pattern.matches(name);
                cache.insert(prefix.to_string(), pattern);
                hit
            }
            Err(_) => false,
        }
    }
}

/// Versioned table of exception types each layer may throw.
///
/// Built once from configuration and shared read-only across worker threads.
#[derive(Debug, Clone)]
pub struct ExceptionTypeTaxonomy {
    version: u32,
    allowed: BTreeMap<Layer, Vec<NamePattern>>,
}

impl ExceptionTypeTaxonomy {
    /// Builds the taxonomy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unknown layer names or invalid patterns.
    pub fn new(config: &ExceptionsConfig) -> Result<Self, ConfigError> {
        let mut allowed = BTreeMap::new();
        for (layer_name, patterns) in &config.allowed {
            let layer: Layer = layer_name.parse()?;
            if !layer.is_architectural() {
                return Err(ConfigError::InvalidTaxonomy(format!(
                    "exception taxonomy cannot target '{layer}'"
                )));
            }
            let compiled = patterns
                .iter()
                .map(|p| NamePattern::new(p))
                .collect::<Result<Vec<_>, _>>()?;
            allowed.insert(layer, compiled);
        }
        Ok(Self {
            version: config.version,
            allowed,
        })
    }

    /// Taxonomy version from configuration.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether the layer has an entry at all. Layers without one are unrestricted.
    #[must_use]
    pub fn restricts(&self, layer: Layer) -> bool {
        self.allowed.contains_key(&layer)
    }

    /// Whether `type_name` may be thrown from `layer`.
    ///
    /// `feature_prefix` expands `{Feature}` placeholders; patterns that need it
    /// never match outside a feature folder.
    #[must_use]
    pub fn allows(&self, layer: Layer, type_name: &str, feature_prefix: Option<&str>) -> bool {
        match self.allowed.get(&layer) {
            Some(patterns) => patterns.iter().any(|p| p.matches(type_name, feature_prefix)),
            None => true,
        }
    }

    /// Patterns allowed for a layer, as written in configuration.
    #[must_use]
    pub fn allowed_patterns(&self, layer: Layer) -> Vec<&str> {
        self.allowed
            .get(&layer)
            .map(|ps| ps.iter().map(|p| p.raw.as_str()).collect())
            .unwrap_or_default()
    }
}
