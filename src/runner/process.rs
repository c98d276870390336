//! Host process runner
//!
//! Executes a program directly on the host (no sandbox). Every child is
//! started in its own process group so that the whole tree it spawns can be
//! killed at once.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};
use crate::config::DEFAULT_MAX_OUTPUT_BYTES;

/// How often peak memory is sampled while the program runs
const MEMORY_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for output pipes to drain after the program exited
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Runner that spawns programs directly on the host
pub struct ProcessRunner {
    /// Bytes kept from each of stdout and stderr
    max_output_bytes: usize,
}

impl ProcessRunner {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    /// Run one program to completion or until its time limit expires
    pub async fn execute(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin_content: Option<&str>,
    ) -> RunOutcome {
        debug!(
            "Running {:?} (time limit {}ms, memory limit {}KB not enforced)",
            cmd.to_vec(),
            limits.time_ms,
            limits.memory_kb
        );

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(if stdin_content.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &cmd.env {
            command.env(key, value);
        }
        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        prepare_child(&mut command);

        let started = Instant::now();
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", cmd.program, e);
                return RunOutcome::launch_failed(format!(
                    "Failed to start {}: {}",
                    cmd.program, e
                ));
            }
        };
        let pid = child.id();

        let stdin_task = match (child.stdin.take(), stdin_content) {
            (Some(mut pipe), Some(input)) => {
                let input = input.to_owned();
                Some(tokio::spawn(async move {
                    // Fails with EPIPE when the program exits without reading
                    if let Err(e) = pipe.write_all(input.as_bytes()).await {
                        debug!("Stopped writing stdin: {}", e);
                    }
                    // `pipe` is dropped here, closing the program's stdin
                }))
            }
            _ => None,
        };
        let (stop_readers, readers_stopped) = watch::channel(false);
        let stdout_task = child.stdout.take().map(|out| {
            tokio::spawn(read_capped(out, self.max_output_bytes, readers_stopped.clone()))
        });
        let stderr_task = child.stderr.take().map(|err| {
            tokio::spawn(read_capped(err, self.max_output_bytes, readers_stopped.clone()))
        });

        let mut peak_memory_kb = 0;
        let deadline = Duration::from_millis(u64::from(limits.time_ms));
        let waited = tokio::time::timeout(
            deadline,
            wait_sampling_memory(&mut child, pid, &mut peak_memory_kb),
        )
        .await;
        let time_ms = started.elapsed().as_millis() as u64;

        if let Some(task) = stdin_task {
            task.abort();
        }

        let status = match waited {
            Ok(Ok(status)) => {
                // The program is gone, but anything it left running in the
                // background is not.
                kill_process_group(pid);
                status
            }
            Ok(Err(e)) => {
                warn!("Failed to wait for {}: {}", cmd.program, e);
                kill_process_group(pid);
                let _ = child.start_kill();
                abort_reader(stdout_task);
                abort_reader(stderr_task);
                return RunOutcome::launch_failed(format!(
                    "Failed to wait for {}: {}",
                    cmd.program, e
                ));
            }
            Err(_) => {
                debug!(
                    "{} exceeded {}ms, killing process group",
                    cmd.program, limits.time_ms
                );
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", cmd.program, e);
                }
                abort_reader(stdout_task);
                abort_reader(stderr_task);
                return RunOutcome::timed_out(limits, peak_memory_kb);
            }
        };

        // Both streams share one drain deadline. A pipe still held open by a
        // descendant that left the group is cut off with what was read so far.
        let drain_deadline = tokio::spawn(async move {
            tokio::time::sleep(OUTPUT_DRAIN_GRACE).await;
            let _ = stop_readers.send(true);
        });
        let (stdout, stderr) =
            tokio::join!(collect_output(stdout_task), collect_output(stderr_task));
        drain_deadline.abort();

        let status = run_status(status);
        debug!(
            "{} finished: status={:?}, time={}ms, memory={}KB",
            cmd.program, status, time_ms, peak_memory_kb
        );

        RunOutcome {
            status,
            stdout,
            stderr,
            time_ms,
            memory_kb: peak_memory_kb,
            error: None,
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_BYTES)
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, cmd: &CommandSpec, limits: &RunLimits, stdin: Option<&str>) -> RunOutcome {
        self.execute(cmd, limits, stdin).await
    }
}

/// New process group and no core dumps for the child
#[cfg(unix)]
fn prepare_child(command: &mut Command) {
    use nix::sys::resource::{setrlimit, Resource};
    use nix::unistd::{setpgid, Pid};

    // SAFETY: only setpgid(2) and setrlimit(2) run between fork and exec,
    // both async-signal-safe.
    unsafe {
        command.pre_exec(|| {
            setpgid(Pid::from_raw(0), Pid::from_raw(0))?;
            setrlimit(Resource::RLIMIT_CORE, 0, 0)?;
            Ok(())
        });
    }
}

/// SIGKILL every process in the group led by `pid`
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };

    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!("Failed to kill process group {}: {}", pid, e),
        }
    }
    #[cfg(not(unix))]
    debug!("Process group kill unsupported, pid {} only", pid);
}

async fn wait_sampling_memory(
    child: &mut Child,
    pid: Option<u32>,
    peak_kb: &mut u64,
) -> std::io::Result<ExitStatus> {
    let mut ticker = tokio::time::interval(MEMORY_SAMPLE_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            status = child.wait() => return status,
            _ = ticker.tick() => {
                let Some(pid) = pid else {
                    continue;
                };
                if let Some(kb) = peak_rss_kb(pid).await {
                    *peak_kb = (*peak_kb).max(kb);
                }
            }
        }
    }
}

/// Peak resident set size of a live process
#[cfg(target_os = "linux")]
async fn peak_rss_kb(pid: u32) -> Option<u64> {
    let status = tokio::fs::read_to_string(format!("/proc/{}/status", pid))
        .await
        .ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse().ok())
}

#[cfg(not(target_os = "linux"))]
async fn peak_rss_kb(_pid: u32) -> Option<u64> {
    None
}

/// Read a stream keeping at most `limit` bytes, until EOF or until `stop`
/// fires
async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    limit: usize,
    mut stop: watch::Receiver<bool>,
) -> String {
    let mut kept = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => {
                    let room = limit.saturating_sub(kept.len());
                    kept.extend_from_slice(&buf[..n.min(room)]);
                }
                Err(e) => {
                    debug!("Output stream closed with error: {}", e);
                    break;
                }
            },
            _ = stop.changed() => {
                warn!(
                    "Output pipe still open after program exit, keeping {} bytes",
                    kept.len()
                );
                break;
            }
        }
    }

    String::from_utf8_lossy(&kept).into_owned()
}

async fn collect_output(task: Option<JoinHandle<String>>) -> String {
    let Some(task) = task else {
        return String::new();
    };

    match task.await {
        Ok(output) => output,
        Err(e) => {
            warn!("Output reader failed: {}", e);
            String::new()
        }
    }
}

fn abort_reader(task: Option<JoinHandle<String>>) {
    if let Some(task) = task {
        task.abort();
    }
}

fn run_status(status: ExitStatus) -> RunStatus {
    if let Some(code) = status.code() {
        return RunStatus::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return RunStatus::Signaled(sig);
        }
    }
    RunStatus::Exited(-1)
}
