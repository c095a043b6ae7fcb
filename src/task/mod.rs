//! Task data model.
//!
//! A [`TaskInstance`] is the unit of work: created once by a generator
//! archetype, immutable afterward, consumed by the validator and the reward
//! engine, then discarded. Everything an agent is allowed to see lives in
//! [`TaskMetadata`]; the ground truth never crosses that boundary.

pub mod answer;
pub mod normalize;
pub mod schema;

pub use answer::{AnswerStatus, FinalAnswer, LimitClaim};
pub use normalize::NormalizationRules;
pub use schema::AnswerSchema;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GradingError;

/// A fully generated, graded task instance.
///
/// `(archetype_id, seed)` fully determines every other field. The instance
/// is immutable after generation; no component mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Identifier of the archetype that produced this instance.
    pub archetype_id: String,
    /// Seed the instance was generated from.
    pub seed: u64,
    /// The rendered HTML document the agent operates on.
    pub artifact: String,
    /// Natural-language description of what to extract.
    pub query: String,
    /// Whether a correct extraction exists. Fixed at generation time.
    pub solvable: bool,
    /// Structural contract for the final answer when `solvable` is true.
    pub answer_schema: AnswerSchema,
    /// Per-field rules applied to both sides before comparison.
    pub normalization_rules: NormalizationRules,
    /// Expected value, present iff `solvable`. Always derived from the
    /// archetype's structured pre-render model, never by parsing `artifact`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<Value>,
    /// Allowed abstention reasons and their evidence signatures, present
    /// iff the task is not solvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitation_spec: Option<LimitationSpec>,
    /// Forbidden value patterns. A match anywhere in the answer overrides
    /// correctness with a negative reward.
    pub safety_rules: Vec<SafetyRule>,
    /// Archetype-specific optimal weighted tool budget for the efficiency
    /// multiplier.
    pub optimal_tool_budget: f64,
}

impl TaskInstance {
    /// The read-only metadata an agent may see: schema and allowed
    /// limitation reasons. Never the ground truth.
    pub fn metadata(&self) -> TaskMetadata {
        TaskMetadata {
            answer_schema: self.answer_schema.clone(),
            allowed_limit_reasons: self
                .limitation_spec
                .as_ref()
                .map(|spec| spec.reasons())
                .unwrap_or_default(),
        }
    }

    /// Checks the internal invariants that tie `solvable` to the presence
    /// of `ground_truth` / `limitation_spec`.
    ///
    /// A violation is a generator bug and must raise immediately rather
    /// than silently grade as 0, which would mask it as an agent failure.
    pub fn check_consistency(&self) -> Result<(), GradingError> {
        if self.solvable && self.ground_truth.is_none() {
            return Err(GradingError::MissingGroundTruth {
                archetype_id: self.archetype_id.clone(),
                seed: self.seed,
            });
        }
        if !self.solvable && self.limitation_spec.is_none() {
            return Err(GradingError::MissingLimitationSpec {
                archetype_id: self.archetype_id.clone(),
                seed: self.seed,
            });
        }
        Ok(())
    }
}

/// Task-exposed metadata: what the execution context may reveal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Structural contract for an `ok` answer.
    pub answer_schema: AnswerSchema,
    /// Reasons a `limit` answer may claim. Empty for solvable tasks.
    pub allowed_limit_reasons: Vec<String>,
}

/// A forbidden value pattern, matched against the final answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRule {
    /// Short identifier used in metrics and logs.
    pub name: String,
    /// Regex matched against the serialized answer.
    pub pattern: String,
}

impl SafetyRule {
    /// Creates a new safety rule.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }

    /// Returns true if `text` matches this rule's pattern.
    ///
    /// An unparseable pattern is a generator bug and is surfaced as a
    /// `GradingError` instead of silently passing the text.
    pub fn is_violated_by(&self, text: &str) -> Result<bool, GradingError> {
        let re = Regex::new(&self.pattern).map_err(|e| GradingError::InvalidSafetyPattern {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(re.is_match(text))
    }
}

/// The closed set of valid abstentions for an unsolvable task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitationSpec {
    /// Allowed `(reason, evidence signatures)` pairs.
    pub allowed: Vec<AllowedLimitation>,
}

impl LimitationSpec {
    /// All reasons this spec accepts.
    pub fn reasons(&self) -> Vec<String> {
        self.allowed.iter().map(|a| a.reason.clone()).collect()
    }

    /// Returns true if `reason` is in the allowed set.
    pub fn allows_reason(&self, reason: &str) -> bool {
        self.allowed.iter().any(|a| a.reason == reason)
    }

    /// Verifies a claimed piece of evidence against the actual artifact.
    ///
    /// Evidence is valid when the reason is allowed and the evidence text
    /// literally occurs in the artifact, either as a substring or by
    /// matching one of the reason's declared pattern signatures (the
    /// pattern must also match the artifact itself, so a well-formed claim
    /// about absent markup still fails).
    pub fn evidence_valid(&self, reason: &str, evidence: &str, artifact: &str) -> bool {
        let Some(allowed) = self.allowed.iter().find(|a| a.reason == reason) else {
            return false;
        };
        if evidence.trim().is_empty() {
            return false;
        }
        if artifact.contains(evidence) {
            return true;
        }
        allowed.signatures.iter().any(|sig| match sig {
            EvidenceSignature::Literal(lit) => evidence == lit && artifact.contains(lit.as_str()),
            EvidenceSignature::Pattern(pat) => match Regex::new(pat) {
                Ok(re) => re.is_match(evidence) && re.is_match(artifact),
                Err(_) => false,
            },
        })
    }
}

/// One allowed abstention reason and the signatures that justify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedLimitation {
    /// The abstention reason, e.g. `js_required`.
    pub reason: String,
    /// Fragments provably present in the rendered artifact.
    pub signatures: Vec<EvidenceSignature>,
}

impl AllowedLimitation {
    /// Creates a new allowed limitation.
    pub fn new(reason: impl Into<String>, signatures: Vec<EvidenceSignature>) -> Self {
        Self {
            reason: reason.into(),
            signatures,
        }
    }
}

/// A literal or pattern fragment anchoring an abstention reason to the
/// artifact text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSignature {
    /// Must appear verbatim in the artifact.
    Literal(String),
    /// Regex that must match both the claimed evidence and the artifact.
    Pattern(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn solvable_task() -> TaskInstance {
        TaskInstance {
            archetype_id: "test".to_string(),
            seed: 1,
            artifact: "<span id=\"target\">Widget-42</span>".to_string(),
            query: "Extract the target".to_string(),
            solvable: true,
            answer_schema: AnswerSchema::Text,
            normalization_rules: NormalizationRules::default(),
            ground_truth: Some(json!("Widget-42")),
            limitation_spec: None,
            safety_rules: Vec::new(),
            optimal_tool_budget: 2.0,
        }
    }

    #[test]
    fn test_consistency_ok() {
        assert!(solvable_task().check_consistency().is_ok());
    }

    #[test]
    fn test_consistency_missing_ground_truth() {
        let mut task = solvable_task();
        task.ground_truth = None;
        let err = task.check_consistency().unwrap_err();
        assert!(matches!(err, GradingError::MissingGroundTruth { .. }));
    }

    #[test]
    fn test_consistency_missing_limitation_spec() {
        let mut task = solvable_task();
        task.solvable = false;
        task.ground_truth = None;
        let err = task.check_consistency().unwrap_err();
        assert!(matches!(err, GradingError::MissingLimitationSpec { .. }));
    }

    #[test]
    fn test_metadata_never_contains_ground_truth() {
        let task = solvable_task();
        let metadata = task.metadata();
        let serialized = serde_json::to_string(&metadata).unwrap();
        assert!(!serialized.contains("Widget-42"));
        assert!(metadata.allowed_limit_reasons.is_empty());
    }

    #[test]
    fn test_safety_rule_match() {
        let rule = SafetyRule::new("secret", r"sk-live-[0-9a-f]{16}");
        assert!(rule
            .is_violated_by("answer with sk-live-0123456789abcdef inside")
            .unwrap());
        assert!(!rule.is_violated_by("clean answer").unwrap());
    }

    #[test]
    fn test_safety_rule_invalid_pattern_is_loud() {
        let rule = SafetyRule::new("broken", r"([unclosed");
        assert!(rule.is_violated_by("anything").is_err());
    }

    fn spec_with(reason: &str, sigs: Vec<EvidenceSignature>) -> LimitationSpec {
        LimitationSpec {
            allowed: vec![AllowedLimitation::new(reason, sigs)],
        }
    }

    #[test]
    fn test_evidence_substring_match() {
        let spec = spec_with("js_required", vec![]);
        let artifact = r#"<span id="price"></span>"#;
        assert!(spec.evidence_valid("js_required", r#"id="price""#, artifact));
        assert!(!spec.evidence_valid("js_required", "not present", artifact));
    }

    #[test]
    fn test_evidence_rejects_unknown_reason() {
        let spec = spec_with("js_required", vec![]);
        let artifact = r#"<span id="price"></span>"#;
        assert!(!spec.evidence_valid("paywall", r#"id="price""#, artifact));
    }

    #[test]
    fn test_evidence_rejects_empty() {
        let spec = spec_with("js_required", vec![]);
        assert!(!spec.evidence_valid("js_required", "  ", "<p>anything</p>"));
    }

    #[test]
    fn test_evidence_pattern_signature() {
        let spec = spec_with(
            "js_required",
            vec![EvidenceSignature::Pattern(r"<script[^>]*>".to_string())],
        );
        let artifact = r#"<script src="/assets/app.js"></script>"#;
        // Pattern matches both the claim and the artifact.
        assert!(spec.evidence_valid("js_required", "<script defer>", artifact));
        // Pattern matches the claim but not this artifact.
        assert!(!spec.evidence_valid("js_required", "<script defer>", "<p>static</p>"));
    }
}
