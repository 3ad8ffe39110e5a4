//! Preparation command execution.

use std::process::{Command, Stdio};

use log::{debug, error};

use crate::error::StageError;

/// Runs `command` through the host shell, treating a non-zero exit as
/// failure.
///
/// Output is captured rather than inherited so it stays out of the log
/// stream; it is surfaced at error level only when the command fails.
pub fn run(command: &str) -> Result<(), StageError> {
    debug!("executing command: {command}");
    let output = shell(command)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| StageError::CommandSpawn { source })?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            "command failed with {}; stdout: {}; stderr: {}",
            output.status,
            stdout.trim_end(),
            stderr.trim_end()
        );
        return Err(StageError::Command {
            status: output.status,
        });
    }
    Ok(())
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut shell = Command::new("sh");
    shell.arg("-c").arg(command);
    shell
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut shell = Command::new("cmd");
    shell.arg("/C").arg(command);
    shell
}
