//! Child processes running the agents.
//!
//! A [`LimitedProcess`] owns one agent's child process, optionally inside its own cgroup with a
//! memory limit (Linux only). The process is killed and reaped when the value is dropped, on
//! every exit path of a match.

#[cfg(target_os = "linux")]
mod limited_process_linux;

#[cfg(target_os = "linux")]
pub use limited_process_linux::*;

#[cfg(not(target_os = "linux"))]
mod limited_process_stub;

#[cfg(not(target_os = "linux"))]
pub use limited_process_stub::*;

use std::{
    process::{Child, Stdio},
    time::Duration,
};

use anyhow::Context;

/// Time given to a killed process (and its cgroup) to disappear.
pub(crate) const CLEANUP_DURATION: Duration = Duration::from_secs(1);

/// Spawn `command` with piped stdin/stdout. Stderr is discarded unless `allow_stderr`.
pub(self) fn create_process(
    command: &str,
    args: &[String],
    allow_stderr: bool,
) -> anyhow::Result<Child> {
    let mut cmd = std::process::Command::new(command);
    cmd.args(args).stdin(Stdio::piped()).stdout(Stdio::piped());
    if !allow_stderr {
        cmd.stderr(Stdio::null());
    }
    cmd.spawn()
        .with_context(|| format!("command '{command}' not found"))
}

/// Kill `child` unless it already exited, then reap it.
pub(self) fn kill_and_reap(child: &mut Child) -> anyhow::Result<()> {
    if child
        .try_wait()
        .context("could not poll process status")?
        .is_some()
    {
        return Ok(());
    }
    child.kill().context("could not kill process")?;
    child.wait().context("could not reap process")?;
    Ok(())
}
