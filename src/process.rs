#![forbid(unsafe_code)]

//! Child-process plumbing. One awaitable call per subprocess; stdout and
//! stderr are drained concurrently so neither pipe can fill up and stall the
//! child.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Substring yt-dlp prints when YouTube wants a signed-in session.
pub const SIGN_IN_MARKER: &str = "Sign in to confirm";

/// Everything a finished child left behind.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turns a nonzero exit into the matching error. `fallback` is used when
    /// the tool printed nothing on stderr.
    pub fn into_result(self, fallback: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(classify_failure(&self.stderr, fallback))
    }
}

pub fn classify_failure(stderr: &str, fallback: &str) -> Error {
    if stderr.contains(SIGN_IN_MARKER) {
        return Error::AuthenticationRequired;
    }
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        Error::DownloadFailed(fallback.to_string())
    } else {
        Error::DownloadFailed(trimmed.to_string())
    }
}

/// Runs `program` to completion. Spawn failures become
/// [`Error::ToolNotFound`]; a nonzero exit is reported through
/// [`ToolOutput::code`] and left to the caller.
///
/// The child is killed if the returned future is dropped before it exits.
pub async fn run_tool(program: &Path, args: &[String]) -> Result<ToolOutput> {
    tracing::debug!(program = %program.display(), ?args, "spawning tool");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| Error::ToolNotFound {
            program: program.to_path_buf(),
            source,
        })?;

    let result = ToolOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    tracing::debug!(
        program = %program.display(),
        code = ?result.code,
        stdout_bytes = result.stdout.len(),
        stderr_bytes = result.stderr.len(),
        "tool exited"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PROCESS_LOCK, install_stub};
    use tempfile::tempdir;

    #[test]
    fn sign_in_marker_maps_to_authentication_error() {
        let err = classify_failure(
            "ERROR: [youtube] abc: Sign in to confirm you're not a bot",
            "Download failed",
        );
        assert!(matches!(err, Error::AuthenticationRequired));
    }

    #[test]
    fn other_failures_keep_trimmed_stderr() {
        let err = classify_failure("  ERROR: Video unavailable\n", "Download failed");
        assert_eq!(err.to_string(), "ERROR: Video unavailable");
    }

    #[test]
    fn empty_stderr_uses_fallback() {
        let err = classify_failure("\n", "Download failed");
        assert_eq!(err.to_string(), "Download failed");
    }

    #[test]
    fn signal_exit_is_not_success() {
        let output = ToolOutput {
            code: None,
            ..ToolOutput::default()
        };
        assert!(!output.success());
        assert!(output.into_result("killed").is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_tool_not_found() {
        let _guard = PROCESS_LOCK.lock().await;
        let dir = tempdir().unwrap();
        let err = run_tool(&dir.path().join("no-such-tool"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn captures_both_streams_and_exit_code() {
        let _guard = PROCESS_LOCK.lock().await;
        let dir = tempdir().unwrap();
        let stub = install_stub(
            dir.path(),
            r#"echo "out:$1"
echo "err:$2" >&2
exit 3
"#,
        );
        let output = run_tool(&stub, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out:a");
        assert_eq!(output.stderr.trim(), "err:b");
    }
}
