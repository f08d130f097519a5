use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::resource::{Resource, setrlimit};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::SandboxError;
use super::{Execution, ExecutionRequest, Invocation, Sandbox, Termination};

/// Runs each invocation as the leader of a fresh process group and kills the
/// whole group when the run ends, so launcher-spawned children cannot outlive it.
#[derive(Debug, Clone)]
pub struct ProcessGroupSandbox {
    kill_grace: Duration,
    max_output_bytes: usize,
}

impl ProcessGroupSandbox {
    pub fn new(kill_grace: Duration, max_output_bytes: usize) -> Self {
        Self {
            kill_grace,
            max_output_bytes,
        }
    }

    async fn collect(&self, reader: Option<JoinHandle<(Vec<u8>, bool)>>) -> (Vec<u8>, bool) {
        let Some(mut handle) = reader else {
            return (Vec::new(), false);
        };
        match tokio::time::timeout(self.kill_grace, &mut handle).await {
            Ok(Ok(captured)) => captured,
            Ok(Err(e)) => {
                warn!(error = %e, "Output reader task failed");
                (Vec::new(), false)
            }
            Err(_) => {
                // A process escaped the group and still holds the pipe.
                handle.abort();
                warn!("Output pipe still open after kill grace, discarding");
                (Vec::new(), true)
            }
        }
    }
}

impl Default for ProcessGroupSandbox {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 64 * 1024 * 1024)
    }
}

#[async_trait]
impl Sandbox for ProcessGroupSandbox {
    async fn execute(
        &self,
        invocation: &Invocation,
        request: &ExecutionRequest<'_>,
    ) -> Result<Execution, SandboxError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);
        if let Some(bytes) = request.address_space_limit {
            limit_address_space(&mut command, bytes);
        }

        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| SandboxError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        // process_group(0): the child's pid doubles as its pgid.
        let group = child.id().map(|pid| Pid::from_raw(pid as i32));

        let feeder = child.stdin.take().map(|mut pipe| {
            let input = request.stdin.to_vec();
            tokio::spawn(async move {
                // EPIPE when the program exits without reading everything.
                let _ = pipe.write_all(&input).await;
            })
        });
        let cap = self.max_output_bytes;
        let stdout = child
            .stdout
            .take()
            .map(|pipe| tokio::spawn(read_capped(pipe, cap)));
        let stderr = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(read_capped(pipe, cap)));

        let waited = tokio::select! {
            status = child.wait() => status.map(Termination::from),
            _ = tokio::time::sleep(request.time_limit) => Ok(Termination::TimedOut),
        };
        let elapsed = start.elapsed();

        let termination = match settle(group, waited) {
            Ok(termination) => termination,
            Err(e) => {
                for task in [stdout, stderr].into_iter().flatten() {
                    task.abort();
                }
                if let Some(feeder) = feeder {
                    feeder.abort();
                }
                return Err(e);
            }
        };
        if termination == Termination::TimedOut {
            match tokio::time::timeout(self.kill_grace, child.wait()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(error = %e, "Failed to reap timed out process"),
                Err(_) => warn!(
                    program = %invocation.program,
                    "Process not reaped within kill grace"
                ),
            }
        }
        if let Some(feeder) = feeder {
            feeder.abort();
        }

        let (stdout, stdout_truncated) = self.collect(stdout).await;
        let (stderr, stderr_truncated) = self.collect(stderr).await;

        debug!(
            program = %invocation.program,
            ?termination,
            elapsed_ms = elapsed.as_millis() as u64,
            "Process finished"
        );

        Ok(Execution {
            termination,
            elapsed,
            stdout,
            stderr,
            truncated: stdout_truncated || stderr_truncated,
        })
    }
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => Termination::Exited(code),
            (None, Some(signal)) => Termination::Signaled(signal),
            (None, None) => Termination::Exited(-1),
        }
    }
}

/// Kill the group whatever the wait produced, then surface a wait failure.
fn settle(
    group: Option<Pid>,
    waited: std::io::Result<Termination>,
) -> Result<Termination, SandboxError> {
    if let Some(group) = group {
        kill_group(group);
    }
    waited.map_err(SandboxError::Wait)
}

fn kill_group(group: Pid) {
    match killpg(group, Signal::SIGKILL) {
        // Nothing left in the group.
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid = group.as_raw(), error = %e, "killpg failed"),
    }
}

fn limit_address_space(command: &mut Command, bytes: u64) {
    // SAFETY: the closure runs between fork and exec and only calls
    // setrlimit, which is async-signal-safe.
    unsafe {
        command.pre_exec(move || {
            setrlimit(Resource::RLIMIT_AS, bytes, bytes).map_err(std::io::Error::from)
        });
    }
}

/// Read to EOF, keeping at most `cap` bytes.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, cap: usize) -> (Vec<u8>, bool) {
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = cap.saturating_sub(kept.len());
                if n > room {
                    truncated = true;
                }
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    (kept, truncated)
}
