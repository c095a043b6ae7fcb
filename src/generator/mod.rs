//! Deterministic task generation.
//!
//! Each archetype is a parameterized task family: it builds a structured
//! content model from a seeded RNG, renders the model into an HTML
//! artifact (with optional noise and malformation), and reads the ground
//! truth from the model, never from the rendered artifact. The same
//! `(archetype_id, seed)` always produces a bit-identical [`TaskInstance`].
//!
//! Archetypes are registered through one explicit constructor,
//! [`ArchetypeRegistry::builtin`]; there are no import-time side effects,
//! so registration order cannot silently drop or duplicate archetypes.

pub mod archetypes;
pub mod markup;

pub use archetypes::{
    InventoryListArchetype, JsGatedPriceArchetype, PaywallTeaserArchetype, ProductSpanArchetype,
    SpecTableArchetype,
};

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::GeneratorError;
use crate::task::TaskInstance;

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Versioned domain prefix for seed derivation. Bump only with a new
/// manifest version: changing it changes every generated artifact.
const SEED_DOMAIN_V1: &[u8] = b"scrape-bench/seed/v1";

/// Derives the instance RNG from `(archetype_id, seed)`.
///
/// Uses SHA-256 rather than the runtime's default hasher: the default is
/// randomized per process and would silently break cross-run
/// reproducibility.
pub fn derive_rng(archetype_id: &str, seed: u64) -> ChaCha8Rng {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN_V1);
    hasher.update([0u8]);
    hasher.update(archetype_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(seed.to_le_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    ChaCha8Rng::from_seed(digest)
}

/// Derives a short deterministic hex token tied to an instance.
///
/// Used for decoy identifiers and planted secrets, so they are stable per
/// `(archetype_id, seed)` without touching the instance RNG stream.
pub fn derive_token(archetype_id: &str, seed: u64, label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN_V1);
    hasher.update([0u8]);
    hasher.update(archetype_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(seed.to_le_bytes());
    hasher.update([0u8]);
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// A parameterized task family behind the one generator capability.
pub trait Archetype: Send + Sync {
    /// Stable identifier, referenced by manifests.
    fn id(&self) -> &'static str;

    /// Generates the instance for `seed`. Must be a pure function of
    /// `(self.id(), seed)`.
    fn generate(&self, seed: u64) -> Result<TaskInstance>;
}

/// Static table mapping archetype ids to their generators.
pub struct ArchetypeRegistry {
    archetypes: BTreeMap<&'static str, Box<dyn Archetype>>,
}

impl ArchetypeRegistry {
    /// Builds a registry from an explicit list, rejecting duplicate ids.
    pub fn with_archetypes(archetypes: Vec<Box<dyn Archetype>>) -> Result<Self> {
        let mut map: BTreeMap<&'static str, Box<dyn Archetype>> = BTreeMap::new();
        for archetype in archetypes {
            let id = archetype.id();
            if map.insert(id, archetype).is_some() {
                return Err(GeneratorError::DuplicateArchetype(id.to_string()));
            }
        }
        debug!(count = map.len(), "archetype registry built");
        Ok(Self { archetypes: map })
    }

    /// The built-in archetype set.
    pub fn builtin() -> Self {
        Self::with_archetypes(vec![
            Box::new(ProductSpanArchetype),
            Box::new(SpecTableArchetype),
            Box::new(InventoryListArchetype),
            Box::new(JsGatedPriceArchetype),
            Box::new(PaywallTeaserArchetype),
        ])
        .expect("builtin archetype ids are unique")
    }

    /// Registered archetype ids, in stable order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.archetypes.keys().copied().collect()
    }

    /// Generates a task instance and checks its internal invariants.
    ///
    /// An archetype emitting an inconsistent instance (solvable without a
    /// ground truth, unsolvable without a limitation spec) is a generator
    /// bug and fails loudly here.
    pub fn generate(&self, archetype_id: &str, seed: u64) -> Result<TaskInstance> {
        let archetype = self
            .archetypes
            .get(archetype_id)
            .ok_or_else(|| GeneratorError::UnknownArchetype(archetype_id.to_string()))?;
        let task = archetype.generate(seed)?;
        task.check_consistency()
            .map_err(|e| GeneratorError::InconsistentInstance {
                archetype_id: archetype_id.to_string(),
                reason: e.to_string(),
            })?;
        debug!(
            archetype_id,
            seed,
            solvable = task.solvable,
            artifact_bytes = task.artifact.len(),
            "generated task instance"
        );
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{AnswerSchema, NormalizationRules};

    struct DummyArchetype(&'static str);

    impl Archetype for DummyArchetype {
        fn id(&self) -> &'static str {
            self.0
        }

        fn generate(&self, seed: u64) -> Result<TaskInstance> {
            Ok(TaskInstance {
                archetype_id: self.0.to_string(),
                seed,
                artifact: "<p>dummy</p>".to_string(),
                query: "dummy".to_string(),
                solvable: true,
                answer_schema: AnswerSchema::Text,
                normalization_rules: NormalizationRules::default(),
                ground_truth: Some(serde_json::json!("dummy")),
                limitation_spec: None,
                safety_rules: Vec::new(),
                optimal_tool_budget: 1.0,
            })
        }
    }

    struct BrokenArchetype;

    impl Archetype for BrokenArchetype {
        fn id(&self) -> &'static str {
            "broken"
        }

        fn generate(&self, seed: u64) -> Result<TaskInstance> {
            // Claims solvable without providing a ground truth.
            let mut task = DummyArchetype("broken").generate(seed)?;
            task.ground_truth = None;
            Ok(task)
        }
    }

    #[test]
    fn test_derive_rng_deterministic() {
        use rand::RngExt;
        let mut a = derive_rng("product-span", 42);
        let mut b = derive_rng("product-span", 42);
        let xs: Vec<u32> = (0..8).map(|_| a.random()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_derive_rng_differs_by_archetype_and_seed() {
        use rand::RngExt;
        let mut a = derive_rng("product-span", 42);
        let mut b = derive_rng("spec-table", 42);
        let mut c = derive_rng("product-span", 43);
        let x: u64 = a.random();
        let y: u64 = b.random();
        let z: u64 = c.random();
        assert_ne!(x, y);
        assert_ne!(x, z);
    }

    #[test]
    fn test_derive_token_stable() {
        assert_eq!(
            derive_token("product-span", 7, "secret"),
            derive_token("product-span", 7, "secret")
        );
        assert_ne!(
            derive_token("product-span", 7, "secret"),
            derive_token("product-span", 7, "decoy")
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = ArchetypeRegistry::with_archetypes(vec![
            Box::new(DummyArchetype("dup")),
            Box::new(DummyArchetype("dup")),
        ]);
        assert!(matches!(
            result,
            Err(GeneratorError::DuplicateArchetype(id)) if id == "dup"
        ));
    }

    #[test]
    fn test_unknown_archetype() {
        let registry = ArchetypeRegistry::builtin();
        assert!(matches!(
            registry.generate("no-such-archetype", 1),
            Err(GeneratorError::UnknownArchetype(_))
        ));
    }

    #[test]
    fn test_inconsistent_instance_fails_loudly() {
        let registry = ArchetypeRegistry::with_archetypes(vec![Box::new(BrokenArchetype)])
            .expect("single archetype");
        assert!(matches!(
            registry.generate("broken", 1),
            Err(GeneratorError::InconsistentInstance { .. })
        ));
    }

    #[test]
    fn test_builtin_ids() {
        let registry = ArchetypeRegistry::builtin();
        let ids = registry.ids();
        assert!(ids.contains(&"product-span"));
        assert!(ids.contains(&"spec-table"));
        assert!(ids.contains(&"inventory-list"));
        assert!(ids.contains(&"js-gated-price"));
        assert!(ids.contains(&"paywall-teaser"));
    }
}
