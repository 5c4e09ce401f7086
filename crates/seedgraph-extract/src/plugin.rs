//! JSON-over-stdio plugin runner.
//!
//! A plugin is any executable that reads one JSON request on stdin, writes
//! one JSON response on stdout and exits 0. Non-zero exits, timeouts and
//! malformed output are reported as [`PluginError`]; stderr is captured for
//! diagnostics.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("failed to start plugin `{}`: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("plugin `{}` i/o error: {source}", .program.display())]
    Io {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("plugin `{}` timed out after {secs}s. stderr: {stderr}", .program.display())]
    Timeout {
        program: PathBuf,
        secs: u64,
        stderr: String,
    },
    #[error("plugin `{}` failed (exit={code:?}): {stderr}", .program.display())]
    Failed {
        program: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("plugin `{}` returned non-utf8 stdout", .program.display())]
    NonUtf8 { program: PathBuf },
    #[error("plugin `{}` returned invalid JSON: {message}; stdout starts with: {preview:?}", .program.display())]
    InvalidJson {
        program: PathBuf,
        message: String,
        preview: String,
    },
    #[error("failed to encode plugin request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Wait for `child`, killing it once `timeout` elapses. `None` waits forever.
pub fn wait_with_output_timeout(
    mut child: Child,
    timeout: Option<Duration>,
    program: &Path,
) -> Result<Output, PluginError> {
    let io_err = |source| PluginError::Io {
        program: program.to_path_buf(),
        source,
    };

    let Some(timeout) = timeout else {
        return child.wait_with_output().map_err(io_err);
    };

    let start = Instant::now();
    loop {
        if child.try_wait().map_err(io_err)?.is_some() {
            break;
        }

        if start.elapsed() > timeout {
            let _ = child.kill();
            let output = child.wait_with_output().map_err(io_err)?;
            return Err(PluginError::Timeout {
                program: program.to_path_buf(),
                secs: timeout.as_secs(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        thread::sleep(Duration::from_millis(50));
    }

    child.wait_with_output().map_err(io_err)
}

/// Run `program args...`, send `request` as JSON and decode the JSON reply.
pub fn run_json_plugin<Req, Resp>(
    program: &Path,
    args: &[String],
    request: &Req,
    timeout: Option<Duration>,
) -> Result<Resp, PluginError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let payload = serde_json::to_vec(request)?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| PluginError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(&payload)
            .map_err(|source| PluginError::Io {
                program: program.to_path_buf(),
                source,
            })?;
    }

    let out = wait_with_output_timeout(child, timeout, program)?;
    if !out.status.success() {
        return Err(PluginError::Failed {
            program: program.to_path_buf(),
            code: out.status.code(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(out.stdout).map_err(|_| PluginError::NonUtf8 {
        program: program.to_path_buf(),
    })?;
    let stdout = stdout.trim();
    tracing::trace!(program = %program.display(), bytes = stdout.len(), "plugin replied");
    serde_json::from_str(stdout).map_err(|e| PluginError::InvalidJson {
        program: program.to_path_buf(),
        message: e.to_string(),
        preview: stdout.chars().take(300).collect(),
    })
}
