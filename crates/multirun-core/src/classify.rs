//! Exit classification

use multirun_host_api::{ExitStatus, Signal};
use std::fmt;

/// Classified result of one child, set once when its exit is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Normal,
    Abnormal,
}

impl Outcome {
    pub fn is_abnormal(&self) -> bool {
        matches!(self, Outcome::Abnormal)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Pending => "pending",
            Outcome::Normal => "normal",
            Outcome::Abnormal => "abnormal",
        };
        f.write_str(s)
    }
}

/// Signals the supervisor relays for shutdown. A child dying from one of
/// these took the expected shutdown path.
pub const SHUTDOWN_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTERM];

/// Whether a termination counts as normal
///
/// Exit code 0, or death by SIGINT/SIGTERM. Everything else, including a
/// signal this platform does not know and an undecodable status, is abnormal.
pub fn is_normal_exit(status: &ExitStatus) -> bool {
    match status {
        ExitStatus::Code(code) => *code == 0,
        ExitStatus::Signaled(_) => status
            .signal()
            .is_some_and(|sig| SHUTDOWN_SIGNALS.contains(&sig)),
        ExitStatus::Unknown => false,
    }
}

pub fn classify(status: &ExitStatus) -> Outcome {
    if is_normal_exit(status) {
        Outcome::Normal
    } else {
        Outcome::Abnormal
    }
}
