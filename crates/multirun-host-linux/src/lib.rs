//! Unix host for multirun
//!
//! Provides:
//! - Shell spawning in `exec` mode with process group isolation
//! - One blocking waiter thread per child
//! - Signal delivery to whole process groups
//! - Child subreaper registration (Linux only, no-op elsewhere)

mod adapter;
mod process;
mod subreaper;

pub use adapter::*;
pub use process::*;
pub use subreaper::*;
