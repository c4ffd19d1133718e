//! Mock host for testing

use nix::sys::signal::Signal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::{
    ExitStatus, HostError, HostEvent, HostResult, ProcessHandle, ProcessHost, Subreaper,
    SubreaperStatus,
};

/// A signal the mock was asked to deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentSignal {
    pub pgid: u32,
    pub signal: Signal,
}

/// Mock host for unit testing the supervision engine
///
/// Nothing is executed. Spawned commands get fake pids, signals are
/// recorded, and exits are injected with [`MockHost::simulate_exit`].
pub struct MockHost {
    next_pid: AtomicU32,
    spawned: Arc<Mutex<Vec<(ProcessHandle, String)>>>,
    sent: Arc<Mutex<Vec<SentSignal>>>,
    event_tx: mpsc::UnboundedSender<HostEvent>,
    event_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<HostEvent>>>>,

    /// Commands whose spawn should fail
    pub fail_spawn: Arc<Mutex<HashSet<String>>>,

    /// Process groups whose signal delivery should fail
    pub fail_signal: Arc<Mutex<HashSet<u32>>>,

    /// Exit every child with this status when its group is signaled
    pub exit_on_signal: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            next_pid: AtomicU32::new(1000),
            spawned: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            event_tx: tx,
            event_rx: Arc::new(Mutex::new(Some(rx))),
            fail_spawn: Arc::new(Mutex::new(HashSet::new())),
            fail_signal: Arc::new(Mutex::new(HashSet::new())),
            exit_on_signal: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every spawn of `command` fail
    pub fn fail_command(&self, command: &str) {
        self.fail_spawn.lock().unwrap().insert(command.to_string());
    }

    /// Make signal delivery to `pgid` fail with a non-ESRCH error
    pub fn fail_group(&self, pgid: u32) {
        self.fail_signal.lock().unwrap().insert(pgid);
    }

    /// Answer every group signal with an exit event for that child
    pub fn set_exit_on_signal(&self, enabled: bool) {
        *self.exit_on_signal.lock().unwrap() = enabled;
    }

    /// Handles and commands spawned so far, in spawn order
    pub fn spawned(&self) -> Vec<(ProcessHandle, String)> {
        self.spawned.lock().unwrap().clone()
    }

    /// Signals delivered so far, in delivery order
    pub fn sent_signals(&self) -> Vec<SentSignal> {
        self.sent.lock().unwrap().clone()
    }

    /// Simulate a child terminating
    pub fn simulate_exit(&self, handle: ProcessHandle, status: ExitStatus) {
        let _ = self.event_tx.send(HostEvent::Exited { handle, status });
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHost for MockHost {
    fn spawn(&self, command: &str) -> HostResult<ProcessHandle> {
        if self.fail_spawn.lock().unwrap().contains(command) {
            return Err(HostError::SpawnFailed(format!(
                "Mock spawn failure for {}",
                command
            )));
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let handle = ProcessHandle::group_leader(pid);
        self.spawned
            .lock()
            .unwrap()
            .push((handle, command.to_string()));

        Ok(handle)
    }

    fn signal_group(&self, handle: &ProcessHandle, signal: Signal) -> HostResult<()> {
        if self.fail_signal.lock().unwrap().contains(&handle.pgid) {
            return Err(HostError::SignalFailed {
                pgid: handle.pgid,
                message: "Mock signal failure".into(),
            });
        }

        self.sent.lock().unwrap().push(SentSignal {
            pgid: handle.pgid,
            signal,
        });

        if *self.exit_on_signal.lock().unwrap() {
            self.simulate_exit(*handle, ExitStatus::signaled(signal));
        }

        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        self.event_rx
            .lock()
            .unwrap()
            .take()
            .expect("subscribe() can only be called once")
    }
}

/// Subreaper double that reports a fixed outcome
#[derive(Debug, Clone, Copy)]
pub struct MockSubreaper {
    pub supported: bool,
    pub fail: bool,
}

impl Subreaper for MockSubreaper {
    fn register(&self) -> HostResult<SubreaperStatus> {
        if self.fail {
            return Err(HostError::Subreaper("Mock registration failure".into()));
        }
        if self.supported {
            Ok(SubreaperStatus::Registered)
        } else {
            Ok(SubreaperStatus::Unsupported)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_spawn_and_signal() {
        let host = MockHost::new();
        let mut rx = host.subscribe();
        host.set_exit_on_signal(true);

        let handle = host.spawn("sleep 5").unwrap();
        assert_eq!(handle.pid, handle.pgid);
        assert_eq!(host.spawned().len(), 1);

        host.signal_group(&handle, Signal::SIGTERM).unwrap();
        assert_eq!(
            host.sent_signals(),
            vec![SentSignal {
                pgid: handle.pgid,
                signal: Signal::SIGTERM
            }]
        );

        match rx.recv().await {
            Some(HostEvent::Exited { handle: h, status }) => {
                assert_eq!(h, handle);
                assert_eq!(status.signal(), Some(Signal::SIGTERM));
            }
            None => panic!("Expected an exit event"),
        }
    }

    #[test]
    fn mock_spawn_failure() {
        let host = MockHost::new();
        host.fail_command("broken");

        assert!(host.spawn("broken").is_err());
        assert!(host.spawn("fine").is_ok());
        assert_eq!(host.spawned().len(), 1);
    }

    #[test]
    fn mock_subreaper() {
        let ok = MockSubreaper { supported: true, fail: false };
        assert_eq!(ok.register().unwrap(), SubreaperStatus::Registered);

        let none = MockSubreaper { supported: false, fail: false };
        assert_eq!(none.register().unwrap(), SubreaperStatus::Unsupported);

        let bad = MockSubreaper { supported: true, fail: true };
        assert!(bad.register().is_err());
    }
}
