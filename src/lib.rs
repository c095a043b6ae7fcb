//! scrape-bench: deterministic verifier for HTML-extraction RL tasks.
//!
//! This library generates unlimited graded extraction tasks from seeds,
//! runs untrusted agent code against them in a sandbox, and converts final
//! answers plus tool traces into rewards through a rule-based anti-hacking
//! decision procedure. Everything is deterministic: identical inputs yield
//! identical instances and identical rewards, across processes and runs.
//!
//! The RL training loop, prompt construction, storage and CLI wiring live
//! outside this crate; they consume [`task::TaskInstance`] and
//! [`reward::RewardBreakdown`] through their serialized forms.

// Core modules
pub mod error;
pub mod generator;
pub mod manifest;
pub mod reward;
pub mod sandbox;
pub mod task;
pub mod validate;

// Re-export commonly used types
pub use error::{GeneratorError, GradingError, SandboxError};
pub use generator::ArchetypeRegistry;
pub use manifest::BenchManifest;
pub use reward::{RewardBreakdown, RewardConfig, RewardEngine, ToolCall, ToolTrace};
pub use sandbox::{ExecBackend, ExecContext, ExecLimits, ExecResult};
pub use task::{FinalAnswer, TaskInstance};
pub use validate::{validate, ValidationOutcome};
