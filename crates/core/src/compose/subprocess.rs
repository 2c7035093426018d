//! Shared subprocess management.
//!
//! [`run_command`] spawns a prepared [`tokio::process::Command`], captures
//! stdout/stderr, and enforces a deadline and a cancellation token. The
//! child is killed if either fires, or if the returned future is dropped.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::executor::{CommandOutput, ExecError};

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Run `cmd` to completion, bounded by `timeout` and `cancel`.
///
/// The caller sets program, arguments and working directory. Output is
/// stdout followed by stderr; a non-zero exit is reported through
/// [`CommandOutput::success`], not as an error.
pub async fn run_command(
    cmd: &mut Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<CommandOutput, ExecError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|source| ExecError::Spawn { program, source })?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));
    let stdout_abort = stdout_task.abort_handle();
    let stderr_abort = stderr_task.abort_handle();

    // The drains are raced too: a grandchild can keep the pipes open after
    // the child itself has exited.
    let finished = tokio::select! {
        res = wait_and_collect(&mut child, stdout_task, stderr_task) => res,
        () = tokio::time::sleep(timeout) => Err(ExecError::Timeout { timeout }),
        () = cancel.cancelled() => Err(ExecError::Cancelled),
    };

    let (status, combined) = match finished {
        Ok(done) => done,
        Err(err) => {
            let _ = child.start_kill();
            stdout_abort.abort();
            stderr_abort.abort();
            return Err(err);
        }
    };

    Ok(CommandOutput {
        output: String::from_utf8_lossy(&combined).into_owned(),
        exit_code: status.code().unwrap_or(-1),
        success: status.success(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Wait for exit, then for both streams to reach EOF. Returns stdout
/// followed by stderr.
async fn wait_and_collect(
    child: &mut Child,
    stdout_task: JoinHandle<Vec<u8>>,
    stderr_task: JoinHandle<Vec<u8>>,
) -> Result<(ExitStatus, Vec<u8>), ExecError> {
    let status = child.wait().await?;
    let mut combined = stdout_task.await.unwrap_or_default();
    combined.extend(stderr_task.await.unwrap_or_default());
    Ok((status, combined))
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn bash(script: &str) -> Command {
        let mut cmd = Command::new("bash");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn captures_stdout_then_stderr() {
        let out = run_command(
            &mut bash("echo out; echo err >&2"),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .expect("run");

        assert!(out.success);
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.output, "out\nerr\n");
    }

    #[tokio::test]
    async fn non_zero_exit_is_not_an_error() {
        let out = run_command(
            &mut bash("echo broken >&2; exit 3"),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .expect("run");

        assert!(!out.success);
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.output, "broken\n");
    }

    #[tokio::test]
    async fn deadline_kills_the_child() {
        let result = run_command(
            &mut bash("sleep 30"),
            Duration::from_millis(200),
            &CancellationToken::new(),
        )
        .await;

        assert_matches!(result, Err(ExecError::Timeout { .. }));
    }

    #[tokio::test]
    async fn deadline_covers_output_held_open_by_background_process() {
        let start = Instant::now();
        let result = run_command(
            &mut bash("sleep 8 & echo hi"),
            Duration::from_secs(1),
            &CancellationToken::new(),
        )
        .await;

        assert_matches!(result, Err(ExecError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancellation_covers_output_held_open_by_background_process() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = run_command(&mut bash("sleep 8 & echo hi"), Duration::from_secs(30), &cancel).await;

        assert_matches!(result, Err(ExecError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = run_command(&mut bash("sleep 30"), Duration::from_secs(30), &cancel).await;

        assert_matches!(result, Err(ExecError::Cancelled));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let mut cmd = Command::new("q8-definitely-not-installed");
        let result = run_command(&mut cmd, Duration::from_secs(5), &CancellationToken::new()).await;

        assert_matches!(result, Err(ExecError::Spawn { ref program, .. }) if program == "q8-definitely-not-installed");
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut cmd = bash("pwd");
        cmd.current_dir(dir.path());

        let out = run_command(&mut cmd, Duration::from_secs(5), &CancellationToken::new())
            .await
            .expect("run");

        let expected = dir.path().canonicalize().expect("canonicalize dir");
        assert_eq!(out.output.trim(), expected.to_str().expect("path"));
    }
}
