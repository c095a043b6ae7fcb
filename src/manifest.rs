//! Frozen benchmark manifest.
//!
//! A manifest is a versioned list of `(archetype_id, seed)` pairs used for
//! reproducible cross-run and cross-model comparison. Published versions
//! are append-only: adding archetypes produces a new version whose prefix
//! is byte-identical to the old one, so scores stay comparable.

use serde::{Deserialize, Serialize};

use crate::error::GeneratorError;
use crate::generator::ArchetypeRegistry;
use crate::task::TaskInstance;

/// One benchmark entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Archetype to generate from.
    pub archetype_id: String,
    /// Seed to generate with.
    pub seed: u64,
}

impl ManifestEntry {
    /// Creates an entry.
    pub fn new(archetype_id: impl Into<String>, seed: u64) -> Self {
        Self {
            archetype_id: archetype_id.into(),
            seed,
        }
    }
}

/// A versioned, frozen benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchManifest {
    /// Manifest version, e.g. `"v1"`.
    pub version: String,
    /// The frozen entry list.
    pub entries: Vec<ManifestEntry>,
}

/// Frozen v1 entries. Do not edit: editing breaks comparability of every
/// score ever produced against v1. Extend via [`BenchManifest::extended`].
const V1_ENTRIES: [(&str, u64); 20] = [
    ("product-span", 101),
    ("product-span", 102),
    ("product-span", 103),
    ("product-span", 104),
    ("spec-table", 201),
    ("spec-table", 202),
    ("spec-table", 203),
    ("spec-table", 204),
    ("inventory-list", 301),
    ("inventory-list", 302),
    ("inventory-list", 303),
    ("inventory-list", 304),
    ("js-gated-price", 401),
    ("js-gated-price", 402),
    ("js-gated-price", 403),
    ("js-gated-price", 404),
    ("paywall-teaser", 501),
    ("paywall-teaser", 502),
    ("paywall-teaser", 503),
    ("paywall-teaser", 504),
];

impl BenchManifest {
    /// The frozen v1 benchmark.
    pub fn v1() -> Self {
        Self {
            version: "v1".to_string(),
            entries: V1_ENTRIES
                .iter()
                .map(|(id, seed)| ManifestEntry::new(*id, *seed))
                .collect(),
        }
    }

    /// A new version extending this one. The existing entries are kept
    /// verbatim, in order, ahead of the additions.
    pub fn extended(
        &self,
        version: impl Into<String>,
        additions: Vec<ManifestEntry>,
    ) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(additions);
        Self {
            version: version.into(),
            entries,
        }
    }

    /// Serializes the manifest to pretty JSON for publication.
    pub fn to_json(&self) -> Result<String, GeneratorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a published manifest.
    pub fn from_json(text: &str) -> Result<Self, GeneratorError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Generates every instance in the manifest, in order.
    ///
    /// Fails loudly if any entry references an unknown archetype: a
    /// manifest that silently skipped entries would produce incomparable
    /// scores.
    pub fn resolve(&self, registry: &ArchetypeRegistry) -> Result<Vec<TaskInstance>, GeneratorError> {
        self.entries
            .iter()
            .map(|entry| registry.generate(&entry.archetype_id, entry.seed))
            .collect()
    }
}
