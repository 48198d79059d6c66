use std::{
    process::{Child, ChildStdin, ChildStdout},
    time::Duration,
};

use anyhow::{self, bail, Context};
use tracing::error;

use super::{create_process, kill_and_reap, CLEANUP_DURATION};

/// An agent's child process, killed and reaped on drop.
#[derive(Debug)]
pub struct LimitedProcess {
    child: Child,
    cleaned_up: bool,
}

impl LimitedProcess {
    /// Memory containment needs Linux cgroups.
    ///
    /// # Errors
    /// Always.
    pub fn launch(
        _command: &str,
        _args: &[String],
        _max_memory: i64,
        _allow_stderr: bool,
    ) -> anyhow::Result<LimitedProcess> {
        bail!("cgroups only available on linux")
    }

    /// Launch `command` as a plain child process.
    ///
    /// # Errors
    /// Returned if the process cannot be spawned.
    pub fn launch_without_container(
        command: &str,
        args: &[String],
        allow_stderr: bool,
    ) -> anyhow::Result<LimitedProcess> {
        let child =
            create_process(command, args, allow_stderr).context("could not create process")?;

        Ok(LimitedProcess {
            child,
            cleaned_up: false,
        })
    }

    /// The process's stdin, once.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// The process's stdout, once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Never contained on this platform.
    pub fn is_contained(&self) -> bool {
        false
    }

    /// Kill and reap the process.
    ///
    /// # Errors
    /// Returned if the process could not be killed.
    pub fn try_kill(&mut self, _max_duration: Duration) -> anyhow::Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        kill_and_reap(&mut self.child)?;
        self.cleaned_up = true;
        Ok(())
    }
}

impl Drop for LimitedProcess {
    fn drop(&mut self) {
        if let Err(e) = self.try_kill(CLEANUP_DURATION) {
            error!(
                "could not kill agent process {} on drop: {e:#}",
                self.child.id()
            );
        }
    }
}
