// src/infrastructure/process.rs
//
// External tool invocation
//
// Every call to an external capability (yt-dlp) goes through `run_tool`:
// - stdout/stderr are drained on their own tasks so a chatty tool never blocks
// - the per-invocation timeout kills the child
// - the caller's CancellationToken kills the child
// - the child is also killed if the returned future is dropped

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {timeout_secs}s")]
    TimedOut { program: String, timeout_secs: u64 },

    #[error("{program} was cancelled")]
    Cancelled { program: String },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

enum Waited {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Run `program` with `args` and return its captured output.
///
/// A non-zero exit is reported as `ToolError::Failed` carrying the trimmed
/// stderr, so callers only ever see successful output.
pub async fn run_tool(
    program: &str,
    args: &[String],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Output, ToolError> {
    if cancel.is_cancelled() {
        return Err(ToolError::Cancelled {
            program: program.to_string(),
        });
    }

    log::debug!("[tool] {} {}", program, args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdout_task = drain(program, child.stdout.take())?;
    let stderr_task = drain(program, child.stderr.take())?;

    let waited = tokio::select! {
        res = tokio::time::timeout(timeout, child.wait()) => match res {
            Ok(status) => Waited::Exited(status),
            Err(_) => Waited::TimedOut,
        },
        _ = cancel.cancelled() => Waited::Cancelled,
    };

    let status = match waited {
        Waited::Exited(status) => status.map_err(|source| ToolError::Io {
            program: program.to_string(),
            source,
        })?,
        Waited::TimedOut => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(ToolError::TimedOut {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        Waited::Cancelled => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(ToolError::Cancelled {
                program: program.to_string(),
            });
        }
    };

    let stdout = collect(program, stdout_task).await?;
    let stderr = collect(program, stderr_task).await?;

    if !status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

fn drain<R>(
    program: &str,
    pipe: Option<R>,
) -> Result<JoinHandle<std::io::Result<Vec<u8>>>, ToolError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut pipe = pipe.ok_or_else(|| ToolError::Io {
        program: program.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe not captured"),
    })?;

    Ok(tokio::spawn(async move {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).await?;
        Ok(buf)
    }))
}

async fn collect(
    program: &str,
    task: JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, ToolError> {
    let io_error = |source| ToolError::Io {
        program: program.to_string(),
        source,
    };
    task.await
        .map_err(|e| io_error(std::io::Error::new(std::io::ErrorKind::Other, e)))?
        .map_err(io_error)
}
