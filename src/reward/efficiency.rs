//! Efficiency multiplier.
//!
//! Applied to a positive base reward only. The multiplier is 1.0 up to the
//! archetype's optimal weighted budget, decays linearly to a floor above
//! it, and a hard cutoff zeroes the reward entirely. `limit` responses
//! are exempted from the cutoff by the engine.

use super::config::EfficiencyCurve;

/// Result of evaluating the curve for one episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyOutcome {
    /// Multiplier in `[floor, 1.0]`. Never negative.
    pub multiplier: f64,
    /// True once the weighted cost passed the hard cutoff.
    pub beyond_cutoff: bool,
}

/// Evaluates the curve at `weighted_cost` for a task whose optimal budget
/// is `optimal_budget`.
pub fn efficiency_multiplier(
    weighted_cost: f64,
    optimal_budget: f64,
    curve: &EfficiencyCurve,
) -> EfficiencyOutcome {
    let optimal = optimal_budget.max(0.0);
    if weighted_cost <= optimal {
        return EfficiencyOutcome {
            multiplier: 1.0,
            beyond_cutoff: false,
        };
    }

    let overage = weighted_cost - optimal;
    let multiplier = (1.0 - curve.decay_per_unit * overage).max(curve.floor);
    let beyond_cutoff = weighted_cost > optimal * curve.cutoff_factor;

    EfficiencyOutcome {
        multiplier,
        beyond_cutoff,
    }
}
