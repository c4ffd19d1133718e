//! Supervision loop
//!
//! The [`Supervisor`] is the only owner and the only writer of the
//! subprocess table. Waiter threads and the signal forwarder talk to it
//! exclusively through channels, so no state here is shared or locked.
//!
//! ```text
//! Running --(first exit or first signal: broadcast)--> Draining
//! Draining --(alive count reaches zero)--> Done
//! ```
//!
//! Exactly one broadcast is issued per run. Later exits are still
//! classified and counted; later signals are ignored.

use multirun_host_api::{ExitStatus, HostEvent, ProcessHandle, ProcessHost, Signal};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{Outcome, classify};

/// Signal broadcast when a child exits on its own
pub const SHUTDOWN_SIGNAL: Signal = Signal::SIGTERM;

/// One launched child
#[derive(Debug, Clone)]
pub struct Subprocess {
    pub command: String,
    pub handle: ProcessHandle,
    pub alive: bool,
    pub outcome: Outcome,
}

impl Subprocess {
    pub fn launched(command: impl Into<String>, handle: ProcessHandle) -> Self {
        Self {
            command: command.into(),
            handle,
            alive: true,
            outcome: Outcome::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Children alive, no broadcast issued yet
    Running,
    /// Broadcast issued, waiting for the remaining exits
    Draining,
    /// Every child has been reaped
    Done,
}

/// Aggregated result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub normal: usize,
    pub abnormal: usize,
}

impl Verdict {
    pub fn had_errors(&self) -> bool {
        self.abnormal > 0
    }
}

pub struct Supervisor<'a, H: ProcessHost + ?Sized> {
    host: &'a H,
    subprocesses: HashMap<u32, Subprocess>,
    alive: usize,
    shutdown_triggered: bool,
    broadcasts: usize,
}

impl<'a, H: ProcessHost + ?Sized> Supervisor<'a, H> {
    pub fn new(host: &'a H, started: Vec<Subprocess>) -> Self {
        let subprocesses: HashMap<u32, Subprocess> = started
            .into_iter()
            .map(|proc| (proc.handle.pid, proc))
            .collect();
        let alive = subprocesses.values().filter(|p| p.alive).count();

        Self {
            host,
            subprocesses,
            alive,
            shutdown_triggered: false,
            broadcasts: 0,
        }
    }

    /// No child was started: there is nothing to supervise
    pub fn is_empty(&self) -> bool {
        self.subprocesses.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.alive
    }

    /// Number of broadcasts issued so far (0 or 1)
    pub fn broadcasts(&self) -> usize {
        self.broadcasts
    }

    pub fn subprocess(&self, pid: u32) -> Option<&Subprocess> {
        self.subprocesses.get(&pid)
    }

    pub fn state(&self) -> SupervisorState {
        if self.alive == 0 {
            SupervisorState::Done
        } else if self.shutdown_triggered {
            SupervisorState::Draining
        } else {
            SupervisorState::Running
        }
    }

    /// Drain exit and signal events until every child has exited
    ///
    /// Neither source has priority over the other. If both close while
    /// children are still alive the loop gives up; those children keep a
    /// pending outcome and count against the verdict.
    pub async fn run(
        &mut self,
        mut exits: mpsc::UnboundedReceiver<HostEvent>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
    ) -> Verdict {
        info!(count = self.alive, "Supervising subprocesses");

        while self.alive > 0 {
            tokio::select! {
                Some(event) = exits.recv() => self.handle_host_event(event),
                Some(signal) = signals.recv() => self.handle_signal(signal),
                else => {
                    error!(alive = self.alive, "Event sources closed with subprocesses still alive");
                    break;
                }
            }
        }

        self.verdict()
    }

    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Exited { handle, status } => self.handle_exit(handle, status),
        }
    }

    /// Record one child's exit; the first exit of the run triggers shutdown
    pub fn handle_exit(&mut self, handle: ProcessHandle, status: ExitStatus) {
        let Some(proc) = self.subprocesses.get_mut(&handle.pid) else {
            warn!(pid = handle.pid, status = %status, "Exit event for unknown process");
            return;
        };

        if !proc.alive {
            warn!(pid = handle.pid, command = %proc.command, "Duplicate exit event ignored");
            return;
        }

        proc.alive = false;
        proc.outcome = classify(&status);
        self.alive -= 1;

        info!(
            pid = handle.pid,
            command = %proc.command,
            status = %status,
            outcome = %proc.outcome,
            "Command exited {}",
            proc.outcome
        );

        if !self.shutdown_triggered {
            info!(
                signal = %SHUTDOWN_SIGNAL,
                "One process exited, sending {} to all other processes", SHUTDOWN_SIGNAL
            );
            self.trigger_shutdown(SHUTDOWN_SIGNAL);
        }
    }

    /// A termination signal reached the supervisor; forward it once
    pub fn handle_signal(&mut self, signal: Signal) {
        if self.shutdown_triggered {
            debug!(signal = %signal, "Already shutting down, signal not forwarded");
            return;
        }

        info!(signal = %signal, "Received {}, propagating to all subprocesses", signal);
        self.trigger_shutdown(signal);
    }

    fn trigger_shutdown(&mut self, signal: Signal) {
        self.shutdown_triggered = true;
        self.broadcast(signal);
    }

    /// Send `signal` to the process group of every child still alive
    ///
    /// Delivery failures are logged and do not stop the broadcast.
    fn broadcast(&mut self, signal: Signal) {
        self.broadcasts += 1;

        for proc in self.subprocesses.values().filter(|p| p.alive) {
            match self.host.signal_group(&proc.handle, signal) {
                Ok(()) => {
                    debug!(pgid = proc.handle.pgid, command = %proc.command, signal = %signal, "Signal sent");
                }
                Err(e) => {
                    error!(
                        pgid = proc.handle.pgid,
                        command = %proc.command,
                        error = %e,
                        "Error signaling process group"
                    );
                }
            }
        }
    }

    /// Aggregate outcomes; anything not classified normal counts as an error
    pub fn verdict(&self) -> Verdict {
        let normal = self
            .subprocesses
            .values()
            .filter(|p| p.outcome == Outcome::Normal)
            .count();

        Verdict {
            normal,
            abnormal: self.subprocesses.len() - normal,
        }
    }
}
