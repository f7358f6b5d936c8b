//! Shared helper for the thin external-tool wrappers (demux/separate/burn):
//! spawn a binary, wait for it, and turn a non-zero exit or missing
//! executable into a `DubError::Fatal` the runner surfaces to the caller.

use std::path::Path;
use std::process::Stdio;

use dubcast_foundation::error::DubError;

pub async fn run(program: &str, args: &[&std::ffi::OsStr], cwd: Option<&Path>) -> Result<(), DubError> {
    let mut command = tokio::process::Command::new(program);
    command.args(args).stdout(Stdio::null()).stderr(Stdio::piped());
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = command.output().await.map_err(|e| {
        DubError::Fatal(format!("failed to spawn `{program}`: {e}"))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DubError::Fatal(format!(
            "`{program}` exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}
