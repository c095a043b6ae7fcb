//! Episode tool-call trace.
//!
//! The orchestration layer records one entry per tool call and hands the
//! trace to the reward engine, which only ever reads it. Calls within an
//! episode are strictly sequential, so a flat list is the whole story.

use serde::{Deserialize, Serialize};

use super::config::ToolWeights;

/// The tool types an episode can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// A full sandbox code execution.
    Execute,
    /// A lightweight inspection call (e.g. viewing a slice of the
    /// artifact) that costs a fraction of an execution.
    Inspect,
}

/// One recorded tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Which tool was invoked.
    pub kind: ToolKind,
}

impl ToolCall {
    /// A code-execution call.
    pub fn execute() -> Self {
        Self {
            kind: ToolKind::Execute,
        }
    }

    /// An inspection call.
    pub fn inspect() -> Self {
        Self {
            kind: ToolKind::Inspect,
        }
    }
}

/// The full, ordered trace of an episode's tool usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolTrace {
    calls: Vec<ToolCall>,
}

impl ToolTrace {
    /// An empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// A trace of `n` execution calls; common in tests and baselines.
    pub fn of_executions(n: usize) -> Self {
        Self {
            calls: vec![ToolCall::execute(); n],
        }
    }

    /// Records a call.
    pub fn push(&mut self, call: ToolCall) {
        self.calls.push(call);
    }

    /// Number of calls, unweighted.
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// True if no tool was used.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Weighted cost of the trace under the given weights.
    pub fn weighted_cost(&self, weights: &ToolWeights) -> f64 {
        self.calls
            .iter()
            .map(|call| match call.kind {
                ToolKind::Execute => weights.execute,
                ToolKind::Inspect => weights.inspect,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_cost() {
        let mut trace = ToolTrace::new();
        trace.push(ToolCall::execute());
        trace.push(ToolCall::execute());
        trace.push(ToolCall::inspect());

        let weights = ToolWeights::default();
        assert_eq!(trace.call_count(), 3);
        assert!((trace.weighted_cost(&weights) - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_trace_costs_nothing() {
        let trace = ToolTrace::new();
        assert!(trace.is_empty());
        assert_eq!(trace.weighted_cost(&ToolWeights::default()), 0.0);
    }

    #[test]
    fn test_of_executions() {
        let trace = ToolTrace::of_executions(4);
        assert_eq!(trace.call_count(), 4);
        assert_eq!(trace.weighted_cost(&ToolWeights::default()), 4.0);
    }
}
