//! Process management utilities

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use multirun_host_api::{ExitStatus, HostError, HostEvent, HostResult, ProcessHandle};

/// Shell used to interpret command lines
pub const SHELL: &str = "sh";

/// Child process leading its own process group
pub struct ManagedProcess {
    pub child: Child,
    pub handle: ProcessHandle,
}

impl ManagedProcess {
    /// Spawn `command` through the shell in a new process group
    ///
    /// The shell `exec`s the command, so the pid we hold is the command
    /// itself rather than an intermediate shell.
    pub fn spawn(command: &str) -> HostResult<Self> {
        let mut cmd = Command::new(SHELL);
        cmd.arg("-c").arg(format!("exec {}", command));

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        // setpgid(0, 0) in the child: it becomes leader of a fresh group
        // but stays in our session, keeping the controlling terminal
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| {
            HostError::SpawnFailed(format!("error starting command '{}': {}", command, e))
        })?;

        let handle = ProcessHandle::group_leader(child.id());

        debug!(pid = handle.pid, pgid = handle.pgid, command = %command, "Process spawned");

        Ok(Self { child, handle })
    }

    /// Move the child into a dedicated waiter thread
    ///
    /// The thread blocks until the child terminates, then reports the exit
    /// on `events`. If the thread cannot be created the child's group is
    /// killed so nothing runs unobserved.
    pub fn spawn_waiter(self, events: mpsc::UnboundedSender<HostEvent>) -> HostResult<()> {
        let Self { mut child, handle } = self;

        let spawned = thread::Builder::new()
            .name(format!("wait-{}", handle.pid))
            .spawn(move || {
                let status = match child.wait() {
                    Ok(status) => ExitStatus::from(status),
                    Err(e) => {
                        warn!(pid = handle.pid, error = %e, "Wait failed");
                        ExitStatus::Unknown
                    }
                };

                debug!(pid = handle.pid, status = %status, "Process reaped");

                // Receiver gone means the supervisor is already done
                let _ = events.send(HostEvent::Exited { handle, status });
            });

        match spawned {
            Ok(_) => Ok(()),
            Err(e) => {
                let _ = signal_group(handle.pgid, Signal::SIGKILL);
                Err(HostError::SpawnFailed(format!(
                    "failed to start waiter for pid {}: {}",
                    handle.pid, e
                )))
            }
        }
    }
}

/// Send `signal` to every process in group `pgid`
///
/// ESRCH means the group is already gone and is treated as success.
pub fn signal_group(pgid: u32, signal: Signal) -> HostResult<()> {
    match signal::killpg(Pid::from_raw(pgid as i32), signal) {
        Ok(()) => {
            debug!(pgid = pgid, signal = %signal, "Signaled process group");
            Ok(())
        }
        Err(Errno::ESRCH) => {
            debug!(pgid = pgid, signal = %signal, "Process group already gone");
            Ok(())
        }
        Err(e) => Err(HostError::SignalFailed {
            pgid,
            message: e.to_string(),
        }),
    }
}
