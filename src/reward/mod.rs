//! Reward calculation: the anti-hacking decision procedure.
//!
//! Given a task, a validated final answer and the episode's tool trace,
//! the engine produces a scalar reward plus a metrics breakdown. The
//! gates run in a fixed order:
//!
//! 1. format/schema gate: malformed or non-conforming answers score 0;
//! 2. safety gate: a forbidden pattern in the answer overrides
//!    everything with a negative reward;
//! 3. correctness/abstention, keyed by `(solvable, status)`: abstaining
//!    on a solvable task and answering an unsolvable one both score 0,
//!    unconditionally;
//! 4. efficiency multiplier on positive base rewards;
//! 5. gated process partial credit for wrong-but-attempted answers.

pub mod config;
pub mod efficiency;
pub mod process_credit;
pub mod trace;

pub use config::{EfficiencyCurve, ProcessCreditTiers, RewardConfig, ToolWeights};
pub use efficiency::{efficiency_multiplier, EfficiencyOutcome};
pub use process_credit::{assess, CreditTier, ProcessCreditReport};
pub use trace::{ToolCall, ToolKind, ToolTrace};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GradingError;
use crate::task::{AnswerStatus, TaskInstance};
use crate::validate::{validate, ValidationOutcome};

/// Scalar reward plus named metrics for offline analysis. Produced once
/// per episode, read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// The final scalar fed to the training loop.
    pub reward: f64,
    /// Base reward before the efficiency multiplier and process credit.
    pub base_reward: f64,
    /// The raw emission parsed as structured data.
    pub format_ok: bool,
    /// The parsed answer satisfied the contract and schema.
    pub schema_ok: bool,
    /// Normalized answer equalled normalized ground truth.
    pub correct: bool,
    /// A `limit` answer carried an allowed reason with verified evidence.
    pub limit_valid: bool,
    /// A forbidden pattern matched the answer.
    pub safety_violation: bool,
    /// Unweighted tool-call count.
    pub tool_call_count: usize,
    /// Weighted tool cost under the configured weights.
    pub weighted_tool_cost: f64,
    /// Multiplier actually applied (1.0 when within budget, 0.0 past the
    /// cutoff for non-`limit` responses).
    pub efficiency_multiplier: f64,
    /// Rank of the highest process-credit tier reached (0 = none).
    pub process_credit_tier: u32,
    /// Credit granted for demonstrated library use.
    pub process_credit: f64,
}

impl RewardBreakdown {
    fn zero(tool_call_count: usize, weighted_tool_cost: f64) -> Self {
        Self {
            reward: 0.0,
            base_reward: 0.0,
            format_ok: false,
            schema_ok: false,
            correct: false,
            limit_valid: false,
            safety_violation: false,
            tool_call_count,
            weighted_tool_cost,
            efficiency_multiplier: 1.0,
            process_credit_tier: 0,
            process_credit: 0.0,
        }
    }

    /// Flattens the breakdown to a name→value map for logging pipelines.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("reward".to_string(), self.reward);
        map.insert("base_reward".to_string(), self.base_reward);
        map.insert("format_ok".to_string(), f64::from(u8::from(self.format_ok)));
        map.insert("schema_ok".to_string(), f64::from(u8::from(self.schema_ok)));
        map.insert("correct".to_string(), f64::from(u8::from(self.correct)));
        map.insert(
            "limit_valid".to_string(),
            f64::from(u8::from(self.limit_valid)),
        );
        map.insert(
            "safety_violation".to_string(),
            f64::from(u8::from(self.safety_violation)),
        );
        map.insert("tool_call_count".to_string(), self.tool_call_count as f64);
        map.insert("weighted_tool_cost".to_string(), self.weighted_tool_cost);
        map.insert(
            "efficiency_multiplier".to_string(),
            self.efficiency_multiplier,
        );
        map.insert(
            "process_credit_tier".to_string(),
            f64::from(self.process_credit_tier),
        );
        map.insert("process_credit".to_string(), self.process_credit);
        map
    }
}

/// The reward engine. Pure: identical inputs always yield identical
/// breakdowns, so grading is never retried for correctness reasons.
pub struct RewardEngine {
    config: RewardConfig,
}

impl RewardEngine {
    /// Creates an engine after validating the configuration.
    pub fn new(config: RewardConfig) -> Result<Self, GradingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Engine with the documented default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RewardConfig::default()).expect("default config is valid")
    }

    /// The active configuration.
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Convenience: validate a raw answer and evaluate it in one call.
    pub fn grade(
        &self,
        task: &TaskInstance,
        raw_answer: &str,
        trace: &ToolTrace,
        submitted_code: Option<&str>,
    ) -> Result<RewardBreakdown, GradingError> {
        let outcome = validate(raw_answer, task);
        self.evaluate(task, &outcome, trace, submitted_code)
    }

    /// Runs the decision procedure over a validated answer.
    ///
    /// `submitted_code` is the concatenation of the episode's executed
    /// submissions, used only for process partial credit.
    pub fn evaluate(
        &self,
        task: &TaskInstance,
        outcome: &ValidationOutcome,
        trace: &ToolTrace,
        submitted_code: Option<&str>,
    ) -> Result<RewardBreakdown, GradingError> {
        task.check_consistency()?;

        let weighted_cost = trace.weighted_cost(&self.config.tool_weights);
        let mut breakdown = RewardBreakdown::zero(trace.call_count(), weighted_cost);
        breakdown.format_ok = outcome.format_ok;
        breakdown.schema_ok = outcome.schema_ok;

        // Gate 1: format/schema.
        let Some(final_answer) = outcome.final_answer.as_ref().filter(|_| outcome.schema_ok)
        else {
            debug!(
                archetype_id = %task.archetype_id,
                seed = task.seed,
                format_ok = outcome.format_ok,
                "format/schema gate: reward 0"
            );
            return Ok(breakdown);
        };

        // Gate 2: safety. Scans the full serialized answer, so values
        // reproduced from tool output (including planted secrets) are
        // caught wherever they appear.
        let answer_text = serde_json::to_string(final_answer)
            .map_err(|e| GradingError::InvalidConfig(format!("unserializable answer: {}", e)))?;
        for rule in &task.safety_rules {
            if rule.is_violated_by(&answer_text)? {
                debug!(
                    archetype_id = %task.archetype_id,
                    seed = task.seed,
                    rule = %rule.name,
                    "safety gate: violation"
                );
                breakdown.safety_violation = true;
                breakdown.reward = self.config.safety_penalty;
                return Ok(breakdown);
            }
        }

        // Gate 3: correctness/abstention, keyed by (solvable, status).
        let mut wrong_attempt = false;
        match (task.solvable, final_answer.status) {
            (true, AnswerStatus::Ok) => {
                // check_consistency guarantees presence.
                let truth = task.ground_truth.as_ref().cloned().unwrap_or_default();
                let normalized_truth = task.normalization_rules.apply(&truth);
                if outcome.normalized_answer.as_ref() == Some(&normalized_truth) {
                    breakdown.correct = true;
                    breakdown.base_reward = self.config.correct_reward;
                } else {
                    wrong_attempt = true;
                }
            }
            // A solvable task can never be scored via abstention, no
            // matter how plausible the claimed evidence looks.
            (true, AnswerStatus::Limit) => {}
            // No correct answer exists, so any 'ok' claim is fabrication.
            (false, AnswerStatus::Ok) => {}
            (false, AnswerStatus::Limit) => {
                let spec = task
                    .limitation_spec
                    .as_ref()
                    .ok_or(GradingError::MissingLimitationSpec {
                        archetype_id: task.archetype_id.clone(),
                        seed: task.seed,
                    })?;
                // Presence guaranteed by the contract check upstream.
                if let Some(claim) = final_answer.limit.as_ref() {
                    if spec.allows_reason(&claim.reason)
                        && spec.evidence_valid(&claim.reason, &claim.evidence, &task.artifact)
                    {
                        breakdown.limit_valid = true;
                        breakdown.base_reward = self.config.valid_abstention_reward;
                    }
                }
            }
        }

        // Gate 4: efficiency multiplier, positive base rewards only.
        breakdown.reward = breakdown.base_reward;
        if breakdown.base_reward > 0.0 {
            let eff = efficiency_multiplier(
                weighted_cost,
                task.optimal_tool_budget,
                &self.config.efficiency,
            );
            let is_limit = final_answer.status == AnswerStatus::Limit;
            if eff.beyond_cutoff && !is_limit {
                breakdown.efficiency_multiplier = 0.0;
                breakdown.reward = 0.0;
            } else {
                breakdown.efficiency_multiplier = eff.multiplier;
                breakdown.reward = breakdown.base_reward * eff.multiplier;
            }
        }

        // Gate 5: process partial credit, only for a wrong-but-attempted
        // answer on a solvable task.
        if wrong_attempt {
            if let Some(code) = submitted_code {
                let report = assess(code, &self.config.process_credit);
                breakdown.process_credit_tier = report.tier.rank();
                breakdown.process_credit = report.credit;
                breakdown.reward += report.credit;
            }
        }

        debug!(
            archetype_id = %task.archetype_id,
            seed = task.seed,
            reward = breakdown.reward,
            correct = breakdown.correct,
            limit_valid = breakdown.limit_valid,
            "graded episode"
        );
        Ok(breakdown)
    }
}
