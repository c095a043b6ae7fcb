//! Error types for scrape-bench operations.
//!
//! Defines error types for the major subsystems:
//! - Task generation (archetypes, seed derivation, rendering)
//! - Sandbox execution infrastructure
//! - Grading (validator + reward engine internals)
//!
//! Note that *submission* failures (timeouts, crashes, non-zero exits) are
//! not errors at all: they surface to the agent as ordinary `ExecResult`s.
//! The variants below cover infrastructure and generator bugs, which must
//! fail loudly rather than downgrade into valid-looking outputs.

use thiserror::Error;

/// Errors that can occur during task generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Archetype '{0}' not found in registry")]
    UnknownArchetype(String),

    #[error("Archetype '{0}' is already registered")]
    DuplicateArchetype(String),

    #[error("Archetype '{archetype_id}' produced an inconsistent instance: {reason}")]
    InconsistentInstance {
        archetype_id: String,
        reason: String,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while provisioning or driving a sandbox.
///
/// These describe infrastructure faults (the sandbox itself failed), never
/// the submitted code's behavior. Retry policy for these belongs to the
/// orchestration layer, not to this crate.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Failed to spawn submission process: {0}")]
    Spawn(String),

    #[error("Container runtime error: {0}")]
    Container(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the validator/reward engine internals.
///
/// A malformed *answer* is not an error (it is a reward-0 outcome with its
/// own metric); these variants cover internal inconsistencies that would
/// otherwise mask generator bugs as agent failures.
#[derive(Debug, Error)]
pub enum GradingError {
    #[error("Task '{archetype_id}' seed {seed} claims solvable=true but has no ground truth")]
    MissingGroundTruth { archetype_id: String, seed: u64 },

    #[error("Task '{archetype_id}' seed {seed} claims solvable=false but has no limitation spec")]
    MissingLimitationSpec { archetype_id: String, seed: u64 },

    #[error("Invalid safety pattern '{pattern}': {reason}")]
    InvalidSafetyPattern { pattern: String, reason: String },

    #[error("Invalid reward configuration: {0}")]
    InvalidConfig(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
