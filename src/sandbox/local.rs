//! Local-process sandbox backend.
//!
//! Runs the submission as a plain child process on the host. Isolation
//! is minimal (the network guard is an in-interpreter patch, not a
//! namespace), which is fine for development and testing. Production
//! grading uses [`super::ContainerBackend`].

use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{
    cap_output, write_harness, ExecBackend, ExecContext, ExecLimits, ExecResult, HARNESS_FILE,
};
use crate::error::SandboxError;

/// Fast single-machine backend.
pub struct LocalProcessBackend {
    python_bin: String,
}

impl LocalProcessBackend {
    /// Creates a backend using the given Python interpreter.
    pub fn new(python_bin: impl Into<String>) -> Self {
        Self {
            python_bin: python_bin.into(),
        }
    }
}

impl Default for LocalProcessBackend {
    fn default() -> Self {
        Self::new("python3")
    }
}

#[async_trait]
impl ExecBackend for LocalProcessBackend {
    async fn run(
        &self,
        code: &str,
        context: &ExecContext,
        limits: &ExecLimits,
    ) -> Result<ExecResult, SandboxError> {
        let dir = tempfile::tempdir()
            .map_err(|e| SandboxError::Setup(format!("failed to create work dir: {}", e)))?;
        write_harness(dir.path(), code, context, limits.network)?;

        let start = Instant::now();
        let child = Command::new(&self.python_bin)
            .arg(HARNESS_FILE)
            .current_dir(dir.path())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // Dropping the child on timeout delivers SIGKILL, so a hung
            // submission can never outlive the episode.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Spawn(format!("{}: {}", self.python_bin, e)))?;

        match tokio::time::timeout(limits.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let runtime = start.elapsed();
                let (stdout, out_cut) = cap_output(&output.stdout, limits.max_output_bytes);
                let (stderr, err_cut) = cap_output(&output.stderr, limits.max_output_bytes);
                let exit_code = output.status.code().unwrap_or(-1);
                debug!(exit_code, ?runtime, "local submission finished");
                Ok(ExecResult {
                    stdout,
                    stderr,
                    exit_code,
                    runtime,
                    truncated: out_cut || err_cut,
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(SandboxError::Spawn(format!(
                "failed to collect output: {}",
                e
            ))),
            Err(_) => {
                warn!(timeout = ?limits.timeout, "local submission timed out, killing");
                Ok(ExecResult::from_timeout(limits.timeout))
            }
        }
    }
}
