//! Design Note (spec §9): every subprocess invocation goes through one
//! helper with an explicit timeout and a truncated I/O envelope, rather
//! than each phase shelling out ad hoc.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::Mutex;

/// Max bytes of stdout/stderr kept per subprocess invocation (spec §5
/// "truncated to an 8 KB envelope").
pub const ENVELOPE_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct ProcOutcome {
    pub ok: bool,
    pub status: Option<i32>,
    pub timed_out: bool,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

fn truncate_tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(ENVELOPE_BYTES);
    String::from_utf8_lossy(&bytes[start..]).to_string()
}

/// Runs `program args` with `stdin` piped in (if given) and a wall-clock
/// timeout. On expiry the child is killed, any captured output is still
/// truncated to the envelope, and `timed_out` is set rather than the
/// caller treating it as a crash.
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    stdin: Option<&str>,
    timeout: Duration,
) -> std::io::Result<ProcOutcome> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    if stdin.is_some() {
        cmd.stdin(std::process::Stdio::piped());
    } else {
        cmd.stdin(std::process::Stdio::null());
    }

    let mut child = cmd.spawn()?;
    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            let _ = pipe.write_all(input.as_bytes()).await;
        }
    }

    // Read stdout/stderr on their own tasks into shared buffers so that
    // whatever was captured before a timeout fires is still visible
    // afterward, rather than being dropped along with the `wait` future.
    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));

    let stdout_task = child.stdout.take().map(|mut out| {
        let buf = stdout_buf.clone();
        tokio::spawn(async move {
            let mut local = Vec::new();
            let _ = out.read_to_end(&mut local).await;
            *buf.lock().await = local;
        })
    });
    let stderr_task = child.stderr.take().map(|mut err| {
        let buf = stderr_buf.clone();
        tokio::spawn(async move {
            let mut local = Vec::new();
            let _ = err.read_to_end(&mut local).await;
            *buf.lock().await = local;
        })
    });

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => {
            let status = status?;
            if let Some(task) = stdout_task {
                let _ = task.await;
            }
            if let Some(task) = stderr_task {
                let _ = task.await;
            }
            let stdout = stdout_buf.lock().await;
            let stderr = stderr_buf.lock().await;
            Ok(ProcOutcome {
                ok: status.success(),
                status: status.code(),
                timed_out: false,
                stdout_tail: truncate_tail(&stdout),
                stderr_tail: truncate_tail(&stderr),
            })
        }
        Err(_) => {
            let _ = child.start_kill();
            // Reap the killed child so its pipes close and the reader
            // tasks observe EOF instead of hanging indefinitely.
            let _ = child.wait().await;
            if let Some(task) = stdout_task {
                let _ = task.await;
            }
            if let Some(task) = stderr_task {
                let _ = task.await;
            }
            let stdout = stdout_buf.lock().await;
            let stderr = stderr_buf.lock().await;
            Ok(ProcOutcome {
                ok: false,
                status: None,
                timed_out: true,
                stdout_tail: truncate_tail(&stdout),
                stderr_tail: truncate_tail(&stderr),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_successful_output() {
        let outcome = run_with_timeout("true", &[], None, Duration::from_secs(5)).await.unwrap();
        assert!(outcome.ok);
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn captures_failure_status() {
        let outcome = run_with_timeout("false", &[], None, Duration::from_secs(5)).await.unwrap();
        assert!(!outcome.ok);
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn times_out_long_running_command() {
        let outcome = run_with_timeout("sleep", &["5".to_string()], None, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(outcome.timed_out);
        assert!(!outcome.ok);
    }

    #[tokio::test]
    async fn timeout_still_captures_output_emitted_before_expiry() {
        let outcome = run_with_timeout(
            "sh",
            &["-c".to_string(), "echo partial-output; sleep 5".to_string()],
            None,
            Duration::from_millis(200),
        )
        .await
        .unwrap();
        assert!(outcome.timed_out);
        assert!(outcome.stdout_tail.contains("partial-output"));
    }
}
