/// Execution Engine - Command Step Runner
///
/// **Core Responsibility:**
/// Run one declared command in a working directory and capture stdout/stderr.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to execute (shell, working directory, timeout)
/// - Engine does NOT know about result files or scoring
/// - Engine does NOT decide whether a failure stops the pipeline
///
/// **Shell Semantics:**
/// Commands are handed to `sh -c`, so pipes, `&&`, globbing and redirects in
/// the challenge file behave as they would in a terminal. Challenge authors
/// are trusted; submitted code only runs inside the commands they declare.
///
/// **Output Handling:**
/// Lines are echoed as they arrive (interactive progress) and captured up to
/// `MAX_CAPTURED_BYTES` per stream.
///
/// **Timeout:**
/// One deadline covers the process exit and draining both pipes, so a
/// background job that keeps the pipes open cannot outlive it. On Unix the
/// command runs in its own process group and the whole group is killed.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::process::Child;
use tracing::{debug, info, warn};
use validator_common::{Result, ValidatorError};

#[cfg(unix)]
use nix::sys::signal::{killpg, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Per-stream capture limit; echoing continues past it
pub const MAX_CAPTURED_BYTES: usize = 10 * 1024 * 1024;

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u64,
}

/// Swappable execution backend
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Fails with `Execution` on non-zero exit, `Spawn` when the process
    /// cannot start, and `TimedOut` when `timeout` elapses first.
    async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput>;
}

/// Production engine: `sh -c <command>`
#[derive(Debug, Clone)]
pub struct ShellEngine {
    echo_output: bool,
}

impl ShellEngine {
    pub fn new(echo_output: bool) -> Self {
        Self { echo_output }
    }
}

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

/// Drain a pipe line by line until EOF.
async fn pump<R>(reader: R, stream: OutputStream, echo: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut truncated = false;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);

                if echo {
                    match stream {
                        OutputStream::Stdout => println!("  > {}", line),
                        OutputStream::Stderr => eprintln!("  > {}", line),
                    }
                }

                if captured.len() + line.len() + 1 <= MAX_CAPTURED_BYTES {
                    captured.push_str(line);
                    captured.push('\n');
                } else if !truncated {
                    truncated = true;
                    warn!(stream = ?stream, limit = MAX_CAPTURED_BYTES, "Output capture limit reached; truncating");
                }
            }
            Err(e) => {
                warn!(stream = ?stream, error = %e, "Error reading command output");
                break;
            }
        }
    }

    captured
}

/// SIGKILL the command's process group, then reap `sh` itself.
/// `pgid` is taken at spawn: once `sh` has been reaped `child.id()` is gone
/// while its background jobs may still be running.
#[cfg(unix)]
async fn kill_tree(child: &mut Child, pgid: Option<u32>) {
    if let Some(pgid) = pgid {
        if let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
            warn!(pgid, error = %e, "Failed to kill process group");
        }
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Command already exited");
    }
}

#[cfg(not(unix))]
async fn kill_tree(child: &mut Child, _pgid: Option<u32>) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill timed out command");
    }
}

#[async_trait]
impl ExecutionEngine for ShellEngine {
    async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        info!(command = %command, cwd = %working_dir.display(), "Executing");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).current_dir(working_dir);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ValidatorError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let pgid = child.id();
        let start = Instant::now();

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                return Err(ValidatorError::Spawn {
                    command: command.to_string(),
                    source: std::io::Error::other("child pipes unavailable"),
                })
            }
        };

        let mut stdout_task = tokio::spawn(pump(stdout, OutputStream::Stdout, self.echo_output));
        let mut stderr_task = tokio::spawn(pump(stderr, OutputStream::Stderr, self.echo_output));

        // Exit plus EOF on both pipes
        let completion = async {
            let status = child.wait().await?;
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };

        let finished = match timeout {
            Some(limit) => tokio::time::timeout(limit, completion)
                .await
                .map_err(|_| limit),
            None => Ok(completion.await),
        };

        let (status, stdout, stderr) = match finished {
            Ok(result) => result?,
            Err(limit) => {
                warn!(command = %command, timeout_secs = limit.as_secs_f64(), "Command timed out; killing");
                kill_tree(&mut child, pgid).await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(ValidatorError::TimedOut {
                    command: command.to_string(),
                    after: limit,
                });
            }
        };

        let execution_time_ms = start.elapsed().as_millis() as u64;

        debug!(
            command = %command,
            exit_code = ?status.code(),
            execution_ms = execution_time_ms,
            "Command finished"
        );

        if !status.success() {
            return Err(ValidatorError::Execution {
                exit_code: status.code(),
                stderr,
            });
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            execution_time_ms,
        })
    }
}
