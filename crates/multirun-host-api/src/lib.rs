//! Host interfaces for multirun
//!
//! This crate defines the seam between the supervision engine and the
//! operating system. It contains no platform code itself.

mod handle;
mod mock;
mod traits;

pub use handle::*;
pub use mock::*;
pub use traits::*;

/// Re-exported so callers name signals the same way the host delivers them
pub use nix::sys::signal::Signal;
