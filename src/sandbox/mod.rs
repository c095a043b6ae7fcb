//! Sandboxed execution of untrusted submissions.
//!
//! An agent may run code against the task artifact through one of two
//! interchangeable backends behind [`ExecBackend`]: a fast local-process
//! backend for development and testing, and a hardened container backend
//! for production grading. Both honor the same contract:
//!
//! - the submission sees a fixed set of read-only bindings (`document`,
//!   `query`, `task_metadata()`) and never the ground truth;
//! - network access is disabled by default and fails immediately;
//! - wall-clock timeouts force termination and come back as ordinary
//!   results, never as hangs or exceptions;
//! - output is size-capped with an explicit `truncated` flag.

pub mod container;
pub mod local;

pub use container::ContainerBackend;
pub use local::LocalProcessBackend;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;
use crate::task::{TaskInstance, TaskMetadata};

/// Whether the submission may open network connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPolicy {
    /// Any network attempt fails deterministically and immediately.
    #[default]
    Denied,
    /// Unrestricted (never used for grading; development only).
    Allowed,
}

/// Resource limits for one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecLimits {
    /// Wall-clock timeout for the whole run.
    pub timeout: Duration,
    /// Grace period for forced termination after the timeout fires.
    pub kill_grace: Duration,
    /// Cap applied independently to stdout and stderr.
    pub max_output_bytes: usize,
    /// Network policy, `Denied` unless explicitly opened.
    pub network: NetworkPolicy,
    /// Memory cap in MB (container backend).
    pub memory_limit_mb: u64,
    /// CPU cores (container backend); 0 means unlimited.
    pub cpu_limit: f64,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            kill_grace: Duration::from_secs(2),
            max_output_bytes: 64 * 1024,
            network: NetworkPolicy::Denied,
            memory_limit_mb: 512,
            cpu_limit: 1.0,
        }
    }
}

impl ExecLimits {
    /// Sets the wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the output cap.
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Opens the network. Development only.
    pub fn with_network_allowed(mut self) -> Self {
        self.network = NetworkPolicy::Allowed;
        self
    }
}

/// The read-only bindings exposed to submitted code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecContext {
    /// The rendered document, bound as `document`.
    pub artifact: String,
    /// The extraction query, bound as `query`.
    pub query: String,
    /// Schema and allowed limitation reasons, behind `task_metadata()`.
    pub metadata: TaskMetadata,
}

impl ExecContext {
    /// Builds the context for a task. The ground truth is structurally
    /// absent: `TaskMetadata` has no field that could carry it.
    pub fn for_task(task: &TaskInstance) -> Self {
        Self {
            artifact: task.artifact.clone(),
            query: task.query.clone(),
            metadata: task.metadata(),
        }
    }
}

/// Output of one sandbox call. Crashes, non-zero exits and timeouts are
/// all ordinary values of this type: the agent observes them and reacts
/// within the episode. Never retried at this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecResult {
    /// Captured stdout, possibly truncated.
    pub stdout: String,
    /// Captured stderr, possibly truncated.
    pub stderr: String,
    /// Process exit code; -1 when no code was observed.
    pub exit_code: i32,
    /// Wall-clock runtime.
    pub runtime: Duration,
    /// True if either stream was cut at the cap.
    pub truncated: bool,
    /// True if the run was forcibly terminated at the timeout.
    pub timed_out: bool,
}

impl ExecResult {
    /// A run that was killed at the wall-clock limit.
    pub fn from_timeout(timeout: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: -1,
            runtime: timeout,
            truncated: false,
            timed_out: true,
        }
    }

    /// True if the process exited with code 0 in time.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// One sandbox backend. Both implementations must honor the same
/// contract; the grading pipeline does not care which one produced a
/// result.
#[async_trait]
pub trait ExecBackend: Send + Sync {
    /// Runs `code` against `context` under `limits`.
    ///
    /// Errors are infrastructure faults only; everything the submission
    /// does (including hanging or crashing) comes back as an
    /// `ExecResult`.
    async fn run(
        &self,
        code: &str,
        context: &ExecContext,
        limits: &ExecLimits,
    ) -> Result<ExecResult, SandboxError>;
}

/// Caps an output stream, decoding lossily at the cut point.
pub(crate) fn cap_output(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    if bytes.len() <= max_bytes {
        (String::from_utf8_lossy(bytes).into_owned(), false)
    } else {
        (String::from_utf8_lossy(&bytes[..max_bytes]).into_owned(), true)
    }
}

/// Name of the entry file both backends execute.
pub(crate) const HARNESS_FILE: &str = "main.py";

/// Name of the context file the harness reads.
pub(crate) const CONTEXT_FILE: &str = "context.json";

/// Writes the harness files for a run: the serialized context and the
/// Python entry file (prelude + submission).
///
/// The prelude binds `document`, `query` and `task_metadata()` and, when
/// the policy denies networking, replaces the socket entry points so any
/// connection attempt raises immediately instead of hanging.
pub(crate) fn write_harness(
    dir: &Path,
    code: &str,
    context: &ExecContext,
    network: NetworkPolicy,
) -> Result<(), SandboxError> {
    let context_json = serde_json::to_string(context)
        .map_err(|e| SandboxError::Setup(format!("failed to serialize context: {}", e)))?;
    std::fs::write(dir.join(CONTEXT_FILE), context_json)?;

    let mut harness = String::new();
    harness.push_str(
        "import json as _json\n\
         with open(\"context.json\", \"r\", encoding=\"utf-8\") as _fh:\n\
         \x20   _ctx = _json.load(_fh)\n\
         document = _ctx[\"artifact\"]\n\
         query = _ctx[\"query\"]\n\
         def task_metadata():\n\
         \x20   return _json.loads(_json.dumps(_ctx[\"metadata\"]))\n",
    );
    if network == NetworkPolicy::Denied {
        harness.push_str(
            "import socket as _socket\n\
             def _network_disabled(*_args, **_kwargs):\n\
             \x20   raise OSError(\"network access is disabled in this sandbox\")\n\
             _socket.socket.connect = _network_disabled\n\
             _socket.socket.connect_ex = _network_disabled\n\
             _socket.socket.sendto = _network_disabled\n\
             _socket.create_connection = _network_disabled\n\
             _socket.getaddrinfo = _network_disabled\n",
        );
    }
    harness.push_str("# --- submission ---\n");
    harness.push_str(code);
    harness.push('\n');
    std::fs::write(dir.join(HARNESS_FILE), harness)?;
    Ok(())
}
