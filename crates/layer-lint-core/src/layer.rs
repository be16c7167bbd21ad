//! Layer resolution: maps file paths to architecture layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::{Config, ConfigError};
use crate::utils::paths::{self, PathGlob};

/// Architectural layer of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    /// Business rules: entities, use cases, repository interfaces.
    Domain,
    /// Repository implementations, data sources, models.
    Data,
    /// UI, state management.
    Presentation,
    /// Shared infrastructure usable from every layer.
    CrossCutting,
    /// Matched an exclusion glob; skipped entirely.
    Excluded,
    /// No taxonomy entry matched.
    Unclassified,
}

impl Layer {
    /// Layers that take part in dependency checks.
    #[must_use]
    pub fn is_architectural(self) -> bool {
        matches!(
            self,
            Self::Domain | Self::Data | Self::Presentation | Self::CrossCutting
        )
    }

    /// Stable lowercase name used in configuration and messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Data => "data",
            Self::Presentation => "presentation",
            Self::CrossCutting => "cross-cutting",
            Self::Excluded => "excluded",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Layer {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domain" => Ok(Self::Domain),
            "data" => Ok(Self::Data),
            "presentation" => Ok(Self::Presentation),
            "cross-cutting" | "cross_cutting" => Ok(Self::CrossCutting),
            "excluded" => Ok(Self::Excluded),
            "unclassified" => Ok(Self::Unclassified),
            other => Err(ConfigError::UnknownLayer(other.to_string())),
        }
    }
}

/// Full classification result for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Resolved layer.
    pub layer: Layer,
    /// Feature folder name (segment after the feature marker), if any.
    pub feature: Option<String>,
    /// The directory segment that decided the layer.
    pub segment: Option<String>,
}

#[derive(Debug, Clone)]
struct TaxonomyEntry {
    layer: Layer,
    segments: Vec<String>,
    specificity: u8,
}

/// Resolves normalized project paths to layers.
///
/// Candidates are ranked by feature scope, then entry specificity, then
/// closeness to the filename, so `features/todo/data/datasources/x.dart`
/// resolves through `datasources` rather than `data`.
#[derive(Debug, Clone)]
pub struct LayerClassifier {
    entries: Vec<TaxonomyEntry>,
    excludes: Vec<PathGlob>,
    feature_marker: String,
}

impl LayerClassifier {
    /// Builds a classifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for invalid exclusion globs or empty taxonomy entries.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let excludes = config
            .analyzer
            .exclude
            .iter()
            .map(|p| {
                PathGlob::new(p).map_err(|e| ConfigError::InvalidGlob {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(config.layers.taxonomy.len());
        for entry in &config.layers.taxonomy {
            if entry.segments.is_empty() {
                return Err(ConfigError::InvalidTaxonomy(format!(
                    "taxonomy entry for layer '{}' has no segments",
                    entry.layer
                )));
            }
            if !entry.layer.is_architectural() {
                return Err(ConfigError::InvalidTaxonomy(format!(
                    "taxonomy entries cannot target '{}'",
                    entry.layer
                )));
            }
            entries.push(TaxonomyEntry {
                layer: entry.layer,
                segments: entry.segments.iter().map(|s| s.to_lowercase()).collect(),
                specificity: entry.specificity,
            });
        }

        Ok(Self {
            entries,
            excludes,
            feature_marker: config.layers.feature_marker.clone(),
        })
    }

    /// Which layer does this path belong to?
    #[must_use]
    pub fn classify(&self, path: &Path) -> Layer {
        self.classify_detailed(path).layer
    }

    /// Whether the path matches an exclusion glob.
    #[must_use]
    pub fn is_excluded(&self, normalized: &str) -> bool {
        self.excludes.iter().any(|g| g.matches(normalized))
    }

    /// Classifies a path and reports which segment decided it.
    #[must_use]
    pub fn classify_detailed(&self, path: &Path) -> Classification {
        let normalized = paths::normalize(path);
        if self.is_excluded(&normalized) {
            return Classification {
                layer: Layer::Excluded,
                feature: None,
                segment: None,
            };
        }

        let segments = paths::segments(&normalized);
        let dirs = &segments[..segments.len().saturating_sub(1)];
        let marker_idx = dirs.iter().position(|s| *s == self.feature_marker);
        let feature = marker_idx
            .and_then(|i| dirs.get(i + 1))
            .map(|s| (*s).to_string());

        // (feature_scoped, specificity, index) ranks candidates; higher wins.
        let mut best: Option<((bool, u8, usize), Layer, &str)> = None;
        for (idx, segment) in dirs.iter().enumerate() {
            let lowered = segment.to_lowercase();
            for entry in &self.entries {
                if !entry.segments.iter().any(|s| *s == lowered) {
                    continue;
                }
                let feature_scoped = marker_idx.is_some_and(|m| idx > m + 1);
                let rank = (feature_scoped, entry.specificity, idx);
                if best.as_ref().map_or(true, |(r, _, _)| rank > *r) {
                    best = Some((rank, entry.layer, segment));
                }
            }
        }

        match best {
            Some((_, layer, segment)) => Classification {
                layer,
                feature,
                segment: Some(segment.to_string()),
            },
            None => Classification {
                layer: Layer::Unclassified,
                feature,
                segment: None,
            },
        }
    }
}

/// Forbidden layer-to-layer edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyPolicy {
    forbidden: Vec<(Layer, Layer)>,
}

impl DependencyPolicy {
    /// Builds the policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an entry names a non-architectural layer.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mut forbidden = Vec::new();
        for dep in &config.layers.forbidden {
            for layer in [dep.from, dep.to] {
                if !layer.is_architectural() {
                    return Err(ConfigError::InvalidTaxonomy(format!(
                        "forbidden dependency cannot reference '{layer}'"
                    )));
                }
            }
            if dep.from == dep.to {
                return Err(ConfigError::InvalidTaxonomy(format!(
                    "forbidden dependency {0} -> {0} would forbid intra-layer imports",
                    dep.from
                )));
            }
            forbidden.push((dep.from, dep.to));
        }
        Ok(Self { forbidden })
    }

    /// Whether an import from `from` to `to` is disallowed.
    #[must_use]
    pub fn is_forbidden(&self, from: Layer, to: Layer) -> bool {
        self.forbidden.iter().any(|(f, t)| *f == from && *t == to)
    }
}
