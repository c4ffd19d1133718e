//! Child subreaper registration

use multirun_host_api::{HostResult, Subreaper, SubreaperStatus};

/// Registers the current process as child subreaper where the OS supports it
///
/// On Linux this is `prctl(PR_SET_CHILD_SUBREAPER, 1)`: orphaned
/// descendants get re-parented to us instead of init, so their exit is
/// still reaped. Other platforms report [`SubreaperStatus::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSubreaper;

impl Subreaper for SystemSubreaper {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn register(&self) -> HostResult<SubreaperStatus> {
        nix::sys::prctl::set_child_subreaper(true)
            .map(|()| SubreaperStatus::Registered)
            .map_err(|e| multirun_host_api::HostError::Subreaper(e.to_string()))
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn register(&self) -> HostResult<SubreaperStatus> {
        Ok(SubreaperStatus::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn registers_on_linux() {
        assert_eq!(
            SystemSubreaper.register().unwrap(),
            SubreaperStatus::Registered
        );
        assert!(nix::sys::prctl::get_child_subreaper().unwrap());
    }
}
