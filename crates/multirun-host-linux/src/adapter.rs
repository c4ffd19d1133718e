//! Unix host implementation

use multirun_host_api::{HostEvent, HostResult, ProcessHandle, ProcessHost, Signal};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::info;

use crate::process::{ManagedProcess, signal_group};

/// Unix host: real children, real process groups
///
/// The `Child` of each process lives in its waiter thread; the host itself
/// only hands out handles and the shared exit channel.
pub struct LinuxHost {
    event_tx: mpsc::UnboundedSender<HostEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<HostEvent>>>,
}

impl LinuxHost {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            event_tx: tx,
            event_rx: Mutex::new(Some(rx)),
        }
    }
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHost for LinuxHost {
    fn spawn(&self, command: &str) -> HostResult<ProcessHandle> {
        let proc = ManagedProcess::spawn(command)?;
        let handle = proc.handle;

        proc.spawn_waiter(self.event_tx.clone())?;

        info!(pid = handle.pid, pgid = handle.pgid, command = %command, "Launched command");

        Ok(handle)
    }

    fn signal_group(&self, handle: &ProcessHandle, signal: Signal) -> HostResult<()> {
        signal_group(handle.pgid, signal)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent> {
        // A poisoned lock still holds a valid Option
        let mut slot = self
            .event_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.take() {
            Some(rx) => rx,
            None => {
                // Second subscriber gets a stream that never yields
                let (_tx, rx) = mpsc::unbounded_channel();
                rx
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multirun_host_api::ExitStatus;

    #[tokio::test]
    async fn test_spawn_and_exit() {
        let host = LinuxHost::new();
        let mut rx = host.subscribe();

        let handle = host.spawn("sh -c \"exit 3\"").unwrap();

        match rx.recv().await {
            Some(HostEvent::Exited { handle: h, status }) => {
                assert_eq!(h, handle);
                assert_eq!(status, ExitStatus::Code(3));
            }
            None => panic!("Expected an exit event"),
        }
    }

    #[tokio::test]
    async fn test_spawn_and_stop_group() {
        let host = LinuxHost::new();
        let mut rx = host.subscribe();

        let handle = host.spawn("sleep 60").unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        host.signal_group(&handle, Signal::SIGINT).unwrap();

        match rx.recv().await {
            Some(HostEvent::Exited { status, .. }) => {
                assert_eq!(status.signal(), Some(Signal::SIGINT));
            }
            None => panic!("Expected an exit event"),
        }

        // Already reaped, must still succeed
        host.signal_group(&handle, Signal::SIGTERM).unwrap();
    }
}
