use std::{
    process::{Child, ChildStdin, ChildStdout},
    sync::atomic::{AtomicU32, Ordering},
    time::{Duration, Instant},
};

use anyhow::{self, Context};
use cgroups_rs::Cgroup;
use tracing::{error, warn};

use super::{create_process, kill_and_reap, CLEANUP_DURATION};

fn get_current_user_id() -> anyhow::Result<String> {
    let output = std::process::Command::new("id")
        .arg("-u")
        .output()
        .context("Could not launch 'id -u'")?;
    let stdout = output.stdout;
    let untrimed_id = std::str::from_utf8(&stdout).context("id is not a valid string")?;
    Ok(untrimed_id.trim().to_string())
}

fn get_cgroup_path(user_id: &str, group_name: &str) -> String {
    format!("user.slice/user-{user_id}.slice/user@{user_id}.service/{group_name}")
}

/// Create a cgroup at `path` with a memory hard limit of `max_memory` bytes and at most
/// `max_pids` tasks. Non-positive values mean no restriction.
fn create_cgroup(path: &str, max_memory: i64, max_pids: i64) -> anyhow::Result<Cgroup> {
    let mut builder = cgroups_rs::cgroup_builder::CgroupBuilder::new(path);
    if max_memory > 0 {
        builder = builder.memory().memory_hard_limit(max_memory).done();
    }
    if max_pids > 0 {
        builder = builder
            .pid()
            .maximum_number_of_processes(cgroups_rs::MaxValue::Value(max_pids))
            .done();
    }
    builder
        .build(cgroups_rs::hierarchies::auto())
        .context("could not create cgroup")
}

fn wait_for_process_cleanup(cgroup: &Cgroup, pid: u64, max_duration: Duration) -> anyhow::Result<()> {
    let deadline = Instant::now() + max_duration;
    while cgroup.tasks().iter().any(|cpid| cpid.pid == pid) {
        if Instant::now() > deadline {
            anyhow::bail!("process {pid} did not leave its cgroup before timeout");
        }
        std::thread::sleep(std::cmp::min(Duration::from_millis(10), max_duration / 10));
    }
    Ok(())
}

fn create_process_in_cgroup(
    command: &str,
    args: &[String],
    group: &Cgroup,
    allow_stderr: bool,
) -> anyhow::Result<Child> {
    let mut child = create_process(command, args, allow_stderr)?;

    let pid = child.id() as u64;
    let addition = group.add_task_by_tgid(cgroups_rs::CgroupPid { pid });
    if addition.is_err() {
        let kill = kill_and_reap(&mut child);

        addition.with_context(|| {
            if let Err(err) = kill {
                format!(
                    "could not add process to cgroup, and process could not be killed either ({err})"
                )
            } else {
                "could not add process to cgroup".to_string()
            }
        })?;
    }
    Ok(child)
}

/// An agent's child process, killed and reaped on drop.
#[derive(Debug)]
pub struct LimitedProcess {
    child: Child,
    cgroup: Option<Cgroup>,
    cleaned_up: bool,
}

impl LimitedProcess {
    /// Launch `command` inside a fresh cgroup limited to `max_memory` bytes.
    ///
    /// # Errors
    /// Returned if cgroups v2 is unavailable or the process cannot be spawned.
    pub fn launch(
        command: &str,
        args: &[String],
        max_memory: i64,
        allow_stderr: bool,
    ) -> anyhow::Result<LimitedProcess> {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        let user_id = get_current_user_id().context("could not get user id")?;
        // one cgroup per process, unique within this evaluator process
        let group_name = format!(
            "TETRATHLON_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let path = get_cgroup_path(&user_id, &group_name);
        let group = create_cgroup(&path, max_memory, 100).context("could not create cgroup")?;
        let child =
            create_process_in_cgroup(command, args, &group, allow_stderr).with_context(|| {
                let _ = group.delete();
                "could not create process in cgroup"
            })?;

        Ok(LimitedProcess {
            child,
            cgroup: Some(group),
            cleaned_up: false,
        })
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
            cgroup: None,
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

    /// True if the process runs inside its own cgroup.
    pub fn is_contained(&self) -> bool {
        self.cgroup.is_some()
    }

    /// Kill the process (and everything in its cgroup) and reap it.
    ///
    /// # Errors
    /// Returned if the process could not be killed or did not leave its cgroup in time.
    pub fn try_kill(&mut self, max_duration: Duration) -> anyhow::Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        match &self.cgroup {
            Some(cgroup) => {
                let contained = cgroup
                    .kill()
                    .context("could not kill cgroup")
                    .and_then(|()| {
                        wait_for_process_cleanup(cgroup, self.child.id() as u64, max_duration)
                            .context("process cleanup timed out")
                    });
                // the child is killed directly even if the cgroup could not be
                let reaped = kill_and_reap(&mut self.child);
                if reaped.is_ok() {
                    self.cleaned_up = true;
                    if let Err(e) = cgroup.delete() {
                        warn!("Failed to remove cgroup. If this happens a lot, it may slow down the computer. {e}");
                    }
                }
                contained.and(reaped)
            }
            None => {
                kill_and_reap(&mut self.child)?;
                self.cleaned_up = true;
                Ok(())
            }
        }
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

#[cfg(test)]
mod limited_process_tests {
    use super::*;

    #[test]
    fn failed_cgroup_kill_still_reaps_the_child() {
        let child = create_process("sleep", &["30".to_string()], false).unwrap();
        // never created on disk, so killing it fails on every cgroup version
        let missing = format!("tetrathlon_missing_{}", std::process::id());
        let mut process = LimitedProcess {
            child,
            cgroup: Some(Cgroup::load(cgroups_rs::hierarchies::auto(), missing)),
            cleaned_up: false,
        };

        assert!(process.try_kill(Duration::from_millis(100)).is_err());
        assert!(process.cleaned_up);
        assert!(process.child.try_wait().unwrap().is_some());
        process.try_kill(Duration::from_millis(100)).unwrap();
    }
}
