//! Docker CLI wrapper for one-shot tool containers
//!
//! Uses the `docker` CLI (not the Docker API) for simplicity. Every run is
//! `docker run --rm` against a throwaway container; the argument order
//! `run --rm [-v mount] [--entrypoint ep] image args...` is fixed because the
//! wrapped images expect their arguments straight after the image name.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::translate::MountSpec;

/// Result of a Docker command execution
#[derive(Debug)]
pub struct ExecResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecResult {
    /// stdout followed by stderr, trimmed
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr).trim().to_string()
    }
}

/// A `docker run --rm` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerRun {
    image: String,
    mount: Option<MountSpec>,
    entrypoint: Option<String>,
    args: Vec<String>,
}

impl DockerRun {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            mount: None,
            entrypoint: None,
            args: Vec::new(),
        }
    }

    pub fn mount(mut self, mount: Option<MountSpec>) -> Self {
        self.mount = mount;
        self
    }

    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments passed to the runtime binary
    pub fn to_args(&self) -> Vec<String> {
        let mut out = vec!["run".to_string(), "--rm".to_string()];

        if let Some(mount) = &self.mount {
            out.push("-v".to_string());
            out.push(mount.to_string());
        }

        if let Some(ep) = &self.entrypoint {
            out.push("--entrypoint".to_string());
            out.push(ep.clone());
        }

        out.push(self.image.clone());
        out.extend(self.args.iter().cloned());
        out
    }

    /// The full command line as reported back to clients
    pub fn command_line(&self, docker_bin: &str) -> String {
        std::iter::once(docker_bin.to_string())
            .chain(self.to_args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run a container to completion, waiting at most `timeout`.
///
/// The runtime client runs in its own process group. On timeout the group
/// gets SIGTERM (which `docker run` forwards to the container), then
/// SIGKILL after a grace period, and the client is reaped before returning.
pub async fn run(
    docker_bin: &str,
    invocation: &DockerRun,
    timeout: Duration,
) -> Result<ExecResult, DockerError> {
    info!("Running: {}", invocation.command_line(docker_bin));

    let mut cmd = Command::new(docker_bin);
    cmd.args(invocation.to_args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|e| DockerError::SpawnFailed(format!("{}: {}", docker_bin, e)))?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let waited = tokio::time::timeout(timeout, child.wait()).await;
    let status = match waited {
        Ok(status) => status?,
        Err(_) => {
            warn!("Command exceeded {}s, terminating it", timeout.as_secs());
            terminate(&mut child).await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(DockerError::Timeout(timeout.as_secs()));
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();
    let exit_code = status.code().unwrap_or(-1);

    debug!("Exit code {} ({} bytes stdout, {} bytes stderr)", exit_code, stdout.len(), stderr.len());

    Ok(ExecResult {
        success: status.success(),
        stdout,
        stderr,
        exit_code,
    })
}

/// Time a timed out process group gets between SIGTERM and SIGKILL
const TERM_GRACE: Duration = Duration::from_secs(3);

/// Stop the child's whole process group and reap the child.
#[cfg(unix)]
async fn terminate(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        // Already reaped
        return;
    };
    let group = Pid::from_raw(pid as i32);

    if let Err(e) = killpg(group, Signal::SIGTERM) {
        warn!("Failed to send SIGTERM to process group {}: {}", pid, e);
    }
    if tokio::time::timeout(TERM_GRACE, child.wait()).await.is_err() {
        warn!("Process group {} ignored SIGTERM", pid);
    }

    // Leftover group members outlive the leader; ESRCH means none remain
    match killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!("Failed to send SIGKILL to process group {}: {}", pid, e),
    }
    if let Err(e) = child.wait().await {
        warn!("Failed to reap timed out process: {}", e);
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill timed out process: {}", e);
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        if let Err(e) = stream.read_to_end(&mut buf).await {
            warn!("Failed reading process output: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("Failed to start {0}")]
    SpawnFailed(String),

    #[error("Command timeout after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
