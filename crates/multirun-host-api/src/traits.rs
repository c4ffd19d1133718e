//! Host traits

use nix::sys::signal::Signal;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{ExitStatus, ProcessHandle};

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Failed to signal process group {pgid}: {message}")]
    SignalFailed { pgid: u32, message: String },

    #[error("Subreaper registration failed: {0}")]
    Subreaper(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Events delivered by the host's waiters
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A child has terminated and been reaped
    Exited {
        handle: ProcessHandle,
        status: ExitStatus,
    },
}

/// Spawns children and addresses their process groups
///
/// Implementations must start exactly one waiter per spawned child; each
/// waiter reports through the receiver returned by [`ProcessHost::subscribe`].
pub trait ProcessHost: Send + Sync {
    /// Run `command` through a shell that replaces itself, in a fresh
    /// process group, with stdout/stderr inherited
    fn spawn(&self, command: &str) -> HostResult<ProcessHandle>;

    /// Send `signal` to every member of the child's process group
    ///
    /// A group that no longer exists is not an error.
    fn signal_group(&self, handle: &ProcessHandle, signal: Signal) -> HostResult<()>;

    /// Take the exit event stream. Can only be called once.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<HostEvent>;
}

/// Result of a subreaper registration attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubreaperStatus {
    /// Orphaned descendants will be re-parented to this process
    Registered,

    /// The platform has no such concept
    Unsupported,
}

/// Best-effort registration as a reaper of orphaned descendants
pub trait Subreaper {
    fn register(&self) -> HostResult<SubreaperStatus>;
}
