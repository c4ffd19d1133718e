//! OS signal forwarding
//!
//! SIGINT and SIGTERM aimed at the supervisor are turned into plain
//! [`Signal`] values on a channel, which the supervision loop reads next to
//! the exit events.

use anyhow::{Context, Result};
use multirun_host_api::Signal;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::debug;

/// Install SIGINT/SIGTERM handlers and forward every delivery
///
/// Must be called before any child is launched: from here on the default
/// "terminate" disposition is replaced, so a signal that lands during the
/// launch phase is queued instead of killing the supervisor.
pub fn forward_shutdown_signals() -> Result<mpsc::UnboundedReceiver<Signal>> {
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;

    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = sigint.recv() => Signal::SIGINT,
                Some(()) = sigterm.recv() => Signal::SIGTERM,
                else => break,
            };

            debug!(signal = %received, "Signal received");

            if tx.send(received).is_err() {
                break;
            }
        }
    });

    Ok(rx)
}
