//! Supervision engine for multirun
//!
//! This crate is the heart of multirun, containing:
//! - Command validation (rejecting unquoted `;`, `|`, `&`)
//! - Launch bookkeeping
//! - Exit classification (normal vs abnormal)
//! - The supervision loop (Running -> Draining -> Done) and its
//!   single group-kill broadcast

mod classify;
mod launch;
mod supervisor;
mod validate;

pub use classify::*;
pub use launch::*;
pub use supervisor::*;
pub use validate::*;
