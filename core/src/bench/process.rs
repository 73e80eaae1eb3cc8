use std::{
    io,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use anyhow::Context as _;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    task::JoinHandle,
    time::Instant,
};

use super::{abort::*, outcome::ExecutionOutcome};

const DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Output of one launch-wait-reap cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub outcome: ExecutionOutcome,
    /// Empty unless stdout capturing is enabled.
    pub stdout: String,
    pub stderr: String,
}

/// Runs shell commands under a hard timeout.
///
/// Each child is started in its own process group. The group is killed once
/// the child exits, times out or is aborted, and the child is always awaited,
/// so no zombie or stray background process is left.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: PathBuf,
    workdir: PathBuf,
    timeout: Duration,
    capture_stdout: bool,
    stdout_capture_max_bytes: usize,
    stderr_capture_max_bytes: usize,
    abort: AbortSignal,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    const DEFAULT_SHELL: &str = "/bin/sh";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
    const DEFAULT_STDOUT_CAPTURE_MAX_BYTES: usize = 64 * 1024;
    const DEFAULT_STDERR_CAPTURE_MAX_BYTES: usize = 4 * 1024;

    pub fn new() -> Self {
        Self {
            shell: Self::DEFAULT_SHELL.into(),
            workdir: PathBuf::from("."),
            timeout: Self::DEFAULT_TIMEOUT,
            capture_stdout: false,
            stdout_capture_max_bytes: Self::DEFAULT_STDOUT_CAPTURE_MAX_BYTES,
            stderr_capture_max_bytes: Self::DEFAULT_STDERR_CAPTURE_MAX_BYTES,
            abort: AbortSignal::never(),
        }
    }

    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = limit;
        self
    }

    pub fn capture_stdout(mut self, enabled: bool) -> Self {
        self.capture_stdout = enabled;
        self
    }

    pub fn stderr_capture_max_bytes(mut self, n: usize) -> Self {
        self.stderr_capture_max_bytes = n;
        self
    }

    pub fn abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort = signal;
        self
    }

    pub fn get_shell(&self) -> &Path {
        &self.shell
    }

    pub fn get_workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    /// Run `cmd` through `shell -c`.
    ///
    /// Per-process failures (nonzero exit, timeout) are reported as an
    /// [`ExecutionOutcome`]. `Err` is reserved for spawn/IO failures and
    /// for [`Aborted`].
    pub async fn run(&self, cmd: &str) -> anyhow::Result<Execution> {
        if self.abort.is_aborted() {
            return Err(Aborted.into());
        }

        let mut command = Command::new(&self.shell);
        command
            .args(["-c", cmd])
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(if self.capture_stdout {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let start_at = Instant::now();
        let mut proc = command.spawn().with_context(|| {
            format!(
                "Failed to spawn '{} -c {}' (cwd: {})",
                self.shell.to_string_lossy(),
                cmd,
                self.workdir.to_string_lossy(),
            )
        })?;
        let mut group = ProcessGroup::new(&proc);

        let stdout = proc.stdout.take();
        let stderr = proc.stderr.take().context("Failed to open stderr")?;
        let stdout = tokio::spawn(read_capped(stdout, self.stdout_capture_max_bytes));
        let stderr = tokio::spawn(read_capped(Some(stderr), self.stderr_capture_max_bytes));
        let mut abort = self.abort.clone();

        // Only the direct child decides the outcome. A background process that
        // inherited the pipes must not stretch the measurement.
        let waited = tokio::select! {
            res = proc.wait() => Waited::Exited(res),
            _ = tokio::time::sleep(self.timeout) => Waited::TimedOut,
            _ = abort.aborted() => Waited::Aborted,
        };
        let elapsed = start_at.elapsed();

        let status = match waited {
            Waited::Exited(Ok(status)) => {
                // Leftovers of the group still hold the pipes open.
                group.kill();
                status
            }
            Waited::Exited(Err(e)) => {
                terminate(&mut proc, &mut group).await;
                stdout.abort();
                stderr.abort();
                return Err(e).context("Failed to wait for subprocess");
            }
            Waited::TimedOut => {
                log::debug!("Timed out after {}ms: {}", elapsed.as_millis(), cmd);
                terminate(&mut proc, &mut group).await;
                stdout.abort();
                stderr.abort();
                return Ok(Execution {
                    outcome: ExecutionOutcome::Timeout,
                    stdout: String::new(),
                    stderr: String::new(),
                });
            }
            Waited::Aborted => {
                terminate(&mut proc, &mut group).await;
                stdout.abort();
                stderr.abort();
                return Err(Aborted.into());
            }
        };

        let stdout = drain(stdout).await;
        let stderr = drain(stderr).await;

        let outcome = if status.success() {
            ExecutionOutcome::Success(elapsed)
        } else {
            ExecutionOutcome::ProcessFailed(status.code())
        };
        Ok(Execution {
            outcome,
            stdout: String::from_utf8_lossy(&stdout).into(),
            stderr: String::from_utf8_lossy(&stderr).into(),
        })
    }
}

enum Waited {
    Exited(io::Result<ExitStatus>),
    TimedOut,
    Aborted,
}

/// Reads the stream to EOF, keeping at most `max` bytes.
/// The pipe is drained completely so the child never blocks on a full buffer.
async fn read_capped<R>(reader: Option<R>, max: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(kept);
        }
        let room = max.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
}

/// Collects what a reader task captured once the group is gone.
///
/// A process that left the group (e.g. via `setsid`) may keep the pipe open
/// forever, so the wait is bounded and partial output is given up.
async fn drain(reader: JoinHandle<io::Result<Vec<u8>>>) -> Vec<u8> {
    let abort = reader.abort_handle();
    match tokio::time::timeout(DRAIN_TIMEOUT, reader).await {
        Ok(Ok(Ok(bytes))) => bytes,
        Ok(Ok(Err(e))) => {
            log::warn!("Failed to read subprocess output: {:#}", e);
            Vec::new()
        }
        Ok(Err(e)) => {
            log::warn!("Output reader task failed: {}", e);
            Vec::new()
        }
        Err(_) => {
            log::debug!("Output pipe still open after {}ms", DRAIN_TIMEOUT.as_millis());
            abort.abort();
            Vec::new()
        }
    }
}

/// Kill the whole group, then reap the direct child.
async fn terminate(proc: &mut Child, group: &mut ProcessGroup) {
    group.kill();
    // The shell may already be reaped while a grandchild still held a pipe open.
    if let Ok(Some(_)) = proc.try_wait() {
        return;
    }
    proc.kill()
        .await
        .unwrap_or_else(|e| log::warn!("Failed to kill process: {:#}", e));
}

/// Owns the process group of a spawned child.
/// Dropping it while armed kills every process of the group.
struct ProcessGroup {
    pgid: Option<i32>,
}

impl ProcessGroup {
    fn new(proc: &Child) -> Self {
        Self {
            pgid: proc.id().and_then(|id| i32::try_from(id).ok()),
        }
    }

    #[cfg(unix)]
    fn kill(&mut self) {
        use nix::{
            errno::Errno,
            sys::signal::{killpg, Signal},
            unistd::Pid,
        };
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => (),
            Err(e) => log::warn!("Failed to kill process group {}: {}", pgid, e),
        }
    }

    #[cfg(not(unix))]
    fn kill(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}
