//! Hardened container sandbox backend.
//!
//! Runs the submission inside a Docker container with no network, capped
//! memory/CPU, and the work directory as the only mount. Argument
//! construction is separated from execution so the invocation is testable
//! without a Docker daemon.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    cap_output, write_harness, ExecBackend, ExecContext, ExecLimits, ExecResult, HARNESS_FILE,
    NetworkPolicy,
};
use crate::error::SandboxError;

/// Working directory inside the container.
const CONTAINER_WORKDIR: &str = "/workspace";

/// Production backend: one container per call.
pub struct ContainerBackend {
    image: String,
    docker_bin: String,
}

impl ContainerBackend {
    /// Creates a backend using the given image.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            docker_bin: "docker".to_string(),
        }
    }

    /// Overrides the docker binary (e.g. `podman`).
    pub fn with_docker_bin(mut self, bin: impl Into<String>) -> Self {
        self.docker_bin = bin.into();
        self
    }

    /// Builds the full `docker run` argument list for one call.
    pub fn docker_run_args(&self, name: &str, work_dir: &Path, limits: &ExecLimits) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            name.to_string(),
        ];

        args.push(format!("--memory={}m", limits.memory_limit_mb));
        if limits.cpu_limit > 0.0 {
            args.push(format!("--cpus={}", limits.cpu_limit));
        }

        let network = match limits.network {
            NetworkPolicy::Denied => "none",
            NetworkPolicy::Allowed => "bridge",
        };
        args.push(format!("--network={}", network));

        args.extend([
            "-v".to_string(),
            format!("{}:{}:ro", work_dir.display(), CONTAINER_WORKDIR),
            "-w".to_string(),
            CONTAINER_WORKDIR.to_string(),
        ]);

        args.push(self.image.clone());
        args.extend(["python3".to_string(), HARNESS_FILE.to_string()]);
        args
    }
}

impl Default for ContainerBackend {
    fn default() -> Self {
        Self::new("python:3.11-slim")
    }
}

#[async_trait]
impl ExecBackend for ContainerBackend {
    async fn run(
        &self,
        code: &str,
        context: &ExecContext,
        limits: &ExecLimits,
    ) -> Result<ExecResult, SandboxError> {
        let dir = tempfile::tempdir()
            .map_err(|e| SandboxError::Setup(format!("failed to create work dir: {}", e)))?;
        write_harness(dir.path(), code, context, limits.network)?;

        let name = format!("scrape-bench-exec-{}", Uuid::new_v4());
        let args = self.docker_run_args(&name, dir.path(), limits);
        debug!(container = %name, "starting container run");

        let start = Instant::now();
        let run = Command::new(&self.docker_bin)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .output();

        match tokio::time::timeout(limits.timeout, run).await {
            Ok(Ok(output)) => {
                let runtime = start.elapsed();
                let (stdout, out_cut) = cap_output(&output.stdout, limits.max_output_bytes);
                let (stderr, err_cut) = cap_output(&output.stderr, limits.max_output_bytes);
                let exit_code = output.status.code().unwrap_or(-1);
                debug!(container = %name, exit_code, ?runtime, "container run finished");
                Ok(ExecResult {
                    stdout,
                    stderr,
                    exit_code,
                    runtime,
                    truncated: out_cut || err_cut,
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(SandboxError::Container(format!(
                "{} run failed: {}",
                self.docker_bin, e
            ))),
            Err(_) => {
                // The docker CLI survived the timeout; kill the container
                // within the grace period rather than leaving it running.
                warn!(container = %name, timeout = ?limits.timeout, "container timed out, killing");
                let kill = Command::new(&self.docker_bin)
                    .args(["kill", &name])
                    .output();
                if let Err(e) = tokio::time::timeout(limits.kill_grace, kill).await {
                    warn!(container = %name, "kill did not complete in grace period: {}", e);
                }
                Ok(ExecResult::from_timeout(limits.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_args_harden_by_default() {
        let backend = ContainerBackend::default();
        let args =
            backend.docker_run_args("job-1", &PathBuf::from("/tmp/work"), &ExecLimits::default());

        assert!(args.contains(&"--rm".to_string()));
        assert!(args.contains(&"--network=none".to_string()));
        assert!(args.contains(&"--memory=512m".to_string()));
        assert!(args.contains(&"--cpus=1".to_string()));
        assert!(args.contains(&"/tmp/work:/workspace:ro".to_string()));
        assert!(args.contains(&"python:3.11-slim".to_string()));
        assert_eq!(args.last().unwrap(), HARNESS_FILE);
    }

    #[test]
    fn test_args_network_allowed() {
        let backend = ContainerBackend::default();
        let limits = ExecLimits::default().with_network_allowed();
        let args = backend.docker_run_args("job-2", &PathBuf::from("/tmp/work"), &limits);
        assert!(args.contains(&"--network=bridge".to_string()));
    }

    #[test]
    fn test_args_no_cpu_cap_when_zero() {
        let backend = ContainerBackend::default();
        let limits = ExecLimits {
            cpu_limit: 0.0,
            ..ExecLimits::default()
        };
        let args = backend.docker_run_args("job-3", &PathBuf::from("/tmp/work"), &limits);
        assert!(!args.iter().any(|a| a.starts_with("--cpus=")));
    }

    #[test]
    fn test_custom_image_and_bin() {
        let backend = ContainerBackend::new("python:3.12-alpine").with_docker_bin("podman");
        let args =
            backend.docker_run_args("job-4", &PathBuf::from("/w"), &ExecLimits::default());
        assert!(args.contains(&"python:3.12-alpine".to_string()));
        assert_eq!(backend.docker_bin, "podman");
    }
}
