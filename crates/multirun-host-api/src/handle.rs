//! Process handle and exit status

use std::fmt;

use nix::sys::signal::Signal;

/// Handle to a launched child
///
/// Every child leads its own process group, so `pgid == pid` by
/// construction. Both are kept so signal addressing reads explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessHandle {
    pub pid: u32,
    pub pgid: u32,
}

impl ProcessHandle {
    /// Handle for a child that leads its own group
    pub fn group_leader(pid: u32) -> Self {
        Self { pid, pgid: pid }
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} (pgid {})", self.pid, self.pgid)
    }
}

/// How a child terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Exited on its own with this status code
    Code(i32),

    /// Terminated by this raw signal number
    Signaled(i32),

    /// The wait status could not be decoded
    Unknown,
}

impl ExitStatus {
    pub fn success() -> Self {
        Self::Code(0)
    }

    pub fn with_code(code: i32) -> Self {
        Self::Code(code)
    }

    pub fn signaled(signal: Signal) -> Self {
        Self::Signaled(signal as i32)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Code(0))
    }

    /// The terminating signal, if it is one this platform knows
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Self::Signaled(raw) => Signal::try_from(*raw).ok(),
            _ => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return Self::Signaled(sig);
            }
        }

        Self::Unknown
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {}", code),
            Self::Signaled(raw) => match Signal::try_from(*raw) {
                Ok(sig) => write!(f, "killed by {}", sig),
                Err(_) => write!(f, "killed by signal {}", raw),
            },
            Self::Unknown => write!(f, "unknown termination"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status() {
        assert!(ExitStatus::success().is_success());
        assert!(!ExitStatus::with_code(1).is_success());
        assert!(!ExitStatus::signaled(Signal::SIGKILL).is_success());
        assert!(!ExitStatus::Unknown.is_success());
    }

    #[test]
    fn signal_decoding() {
        assert_eq!(
            ExitStatus::signaled(Signal::SIGTERM).signal(),
            Some(Signal::SIGTERM)
        );
        assert_eq!(ExitStatus::with_code(15).signal(), None);
        assert_eq!(ExitStatus::Signaled(-42).signal(), None);
    }

    #[test]
    fn display() {
        assert_eq!(ExitStatus::with_code(3).to_string(), "exit code 3");
        assert_eq!(
            ExitStatus::signaled(Signal::SIGINT).to_string(),
            "killed by SIGINT"
        );
        assert_eq!(
            ProcessHandle::group_leader(42).to_string(),
            "pid 42 (pgid 42)"
        );
    }

    #[cfg(unix)]
    #[test]
    fn from_std_status() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait statuses: exit code lives in the high byte, signal in the low bits
        assert_eq!(
            ExitStatus::from(std::process::ExitStatus::from_raw(2 << 8)),
            ExitStatus::Code(2)
        );
        assert_eq!(
            ExitStatus::from(std::process::ExitStatus::from_raw(9)),
            ExitStatus::Signaled(9)
        );
    }
}
