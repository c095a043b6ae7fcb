//! Reward tuning knobs.
//!
//! Every constant the reward engine uses is externally supplied
//! configuration, not a hardcoded value: the curve weights, tier values
//! and penalties get revised as training evolves, and revisions must not
//! require a rebuild. Defaults are documented here; invalid combinations
//! are rejected loudly before any grading happens.

use serde::{Deserialize, Serialize};

use crate::error::GradingError;

/// Per-tool-type weights for the efficiency multiplier. A cheap
/// navigation/inspection call costs less than a full code execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolWeights {
    /// Weight of one sandbox code execution.
    pub execute: f64,
    /// Weight of one lightweight inspection call.
    pub inspect: f64,
}

impl Default for ToolWeights {
    fn default() -> Self {
        Self {
            execute: 1.0,
            inspect: 0.25,
        }
    }
}

/// Shape of the efficiency penalty above the optimal budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyCurve {
    /// Multiplier lost per weighted unit above the optimal budget.
    pub decay_per_unit: f64,
    /// Lower bound of the multiplier; the multiplier alone never drives a
    /// reward negative.
    pub floor: f64,
    /// Hard cutoff as a multiple of the optimal budget. Beyond it the
    /// reward becomes 0, except for `limit` responses, which are exempt
    /// so exploration before a correct abstention is not punished.
    pub cutoff_factor: f64,
}

impl Default for EfficiencyCurve {
    fn default() -> Self {
        Self {
            decay_per_unit: 0.15,
            floor: 0.3,
            cutoff_factor: 3.0,
        }
    }
}

/// Credit values for the gated process tiers. Each tier is granted only
/// if the previous one held; the values are cumulative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessCreditTiers {
    /// The parsing library was imported in executed code.
    pub imported_library: f64,
    /// A parse was constructed from the live input binding, not a
    /// literal stand-in.
    pub parsed_live_input: f64,
    /// The parsed document was actually queried.
    pub queried_document: f64,
}

impl ProcessCreditTiers {
    /// Maximum total credit across all tiers.
    pub fn total(&self) -> f64 {
        self.imported_library + self.parsed_live_input + self.queried_document
    }
}

impl Default for ProcessCreditTiers {
    fn default() -> Self {
        Self {
            imported_library: 0.05,
            parsed_live_input: 0.10,
            queried_document: 0.15,
        }
    }
}

/// Complete reward configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward for a correct `ok` answer on a solvable task.
    pub correct_reward: f64,
    /// Reward for a valid abstention on an unsolvable task. Must stay
    /// strictly above the total process credit, so correctly abstaining
    /// always outscores trying something library-shaped and failing.
    pub valid_abstention_reward: f64,
    /// Reward for a safety violation; overrides everything else.
    pub safety_penalty: f64,
    /// Per-tool-type weights.
    pub tool_weights: ToolWeights,
    /// Efficiency penalty shape.
    pub efficiency: EfficiencyCurve,
    /// Process credit tier values.
    pub process_credit: ProcessCreditTiers,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            correct_reward: 1.0,
            valid_abstention_reward: 0.5,
            safety_penalty: -0.5,
            tool_weights: ToolWeights::default(),
            efficiency: EfficiencyCurve::default(),
            process_credit: ProcessCreditTiers::default(),
        }
    }
}

impl RewardConfig {
    /// Loads a configuration from YAML and validates it.
    pub fn from_yaml(text: &str) -> Result<Self, GradingError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would break grading invariants.
    pub fn validate(&self) -> Result<(), GradingError> {
        if self.correct_reward <= 0.0 {
            return Err(GradingError::InvalidConfig(
                "correct_reward must be positive".to_string(),
            ));
        }
        if self.valid_abstention_reward <= 0.0 || self.valid_abstention_reward >= self.correct_reward
        {
            return Err(GradingError::InvalidConfig(
                "valid_abstention_reward must be positive and below correct_reward".to_string(),
            ));
        }
        if self.safety_penalty >= 0.0 {
            return Err(GradingError::InvalidConfig(
                "safety_penalty must be negative".to_string(),
            ));
        }
        if self.process_credit.total() >= self.valid_abstention_reward {
            return Err(GradingError::InvalidConfig(format!(
                "total process credit {} must stay strictly below valid_abstention_reward {}",
                self.process_credit.total(),
                self.valid_abstention_reward
            )));
        }
        if !(0.0..=1.0).contains(&self.efficiency.floor) {
            return Err(GradingError::InvalidConfig(
                "efficiency floor must be within [0, 1]".to_string(),
            ));
        }
        if self.efficiency.decay_per_unit < 0.0 {
            return Err(GradingError::InvalidConfig(
                "efficiency decay must be non-negative".to_string(),
            ));
        }
        if self.efficiency.cutoff_factor < 1.0 {
            return Err(GradingError::InvalidConfig(
                "efficiency cutoff_factor must be at least 1".to_string(),
            ));
        }
        if self.tool_weights.execute < 0.0 || self.tool_weights.inspect < 0.0 {
            return Err(GradingError::InvalidConfig(
                "tool weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        RewardConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_credit_below_abstention() {
        let config = RewardConfig::default();
        assert!(config.process_credit.total() < config.valid_abstention_reward);
    }

    #[test]
    fn test_rejects_credit_at_or_above_abstention() {
        let mut config = RewardConfig::default();
        config.process_credit.queried_document = 0.35; // total = 0.5
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_positive_safety_penalty() {
        let mut config = RewardConfig::default();
        config.safety_penalty = 0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_curve() {
        let mut config = RewardConfig::default();
        config.efficiency.floor = 1.5;
        assert!(config.validate().is_err());

        let mut config = RewardConfig::default();
        config.efficiency.cutoff_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_with_overrides() {
        let yaml = "\
correct_reward: 1.0
valid_abstention_reward: 0.4
safety_penalty: -1.0
process_credit:
  imported_library: 0.02
  parsed_live_input: 0.08
  queried_document: 0.12
";
        let config = RewardConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.valid_abstention_reward, 0.4);
        assert_eq!(config.safety_penalty, -1.0);
        assert_eq!(config.process_credit.total(), 0.22);
        // Unspecified sections keep their defaults.
        assert_eq!(config.efficiency.floor, 0.3);
    }

    #[test]
    fn test_yaml_rejects_invalid() {
        let yaml = "valid_abstention_reward: 0.2\n"; // below default credit total
        assert!(RewardConfig::from_yaml(yaml).is_err());
    }
}
