use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::{RebuildError, RebuildResult};

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> RebuildResult<String> {
    debug!(command = %format_command(program, args), "running");
    let output = spawn(program, args)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let command = format_command(program, args);
        if !stderr.is_empty() {
            eprintln!("{stderr}");
        }
        Err(RebuildError::CommandFailed {
            command,
            status: output.status,
        })
    }
}

/// Run a command with stdin/stdout/stderr inherited so docker's
/// own progress output reaches the terminal.
pub fn run_interactive(program: &str, args: &[&str]) -> RebuildResult<()> {
    debug!(command = %format_command(program, args), "running");
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| not_found_or_io(program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(RebuildError::CommandFailed {
            command: format_command(program, args),
            status,
        })
    }
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Render a program and its arguments as a single shell-like line.
#[must_use]
pub fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}

fn spawn(program: &str, args: &[&str]) -> RebuildResult<Output> {
    Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| not_found_or_io(program, e))
}

fn not_found_or_io(program: &str, e: std::io::Error) -> RebuildError {
    if e.kind() == std::io::ErrorKind::NotFound {
        RebuildError::CommandNotFound(program.to_string())
    } else {
        RebuildError::Io(e)
    }
}
