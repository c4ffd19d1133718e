//! Launch phase

use multirun_host_api::ProcessHost;
use thiserror::Error;
use tracing::error;

use crate::{Subprocess, find_chained};

/// Errors that abort the launch phase
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LaunchError {
    #[error(
        "chained commands are not supported. Please provide each command as a separate argument (rejected: '{command}')"
    )]
    Chained { command: String },
}

/// Start one child per command
///
/// The whole batch is validated before anything is spawned: a single
/// chained command rejects every command. A command that fails to spawn
/// is logged and left out; the rest still launch. An empty result means
/// nothing could be started and there is nothing to supervise.
pub fn launch<H, S>(host: &H, commands: &[S]) -> Result<Vec<Subprocess>, LaunchError>
where
    H: ProcessHost + ?Sized,
    S: AsRef<str>,
{
    if let Some(command) = find_chained(commands) {
        return Err(LaunchError::Chained {
            command: command.to_string(),
        });
    }

    let mut started = Vec::with_capacity(commands.len());

    for command in commands.iter().map(AsRef::as_ref) {
        match host.spawn(command) {
            Ok(handle) => started.push(Subprocess::launched(command, handle)),
            Err(e) => {
                error!(command = %command, error = %e, "Failed to start command");
            }
        }
    }

    Ok(started)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multirun_host_api::MockHost;

    #[test]
    fn launches_every_command() {
        let host = MockHost::new();
        let started = launch(&host, &["sleep 5", "sleep 6"]).unwrap();

        assert_eq!(started.len(), 2);
        assert!(started.iter().all(|p| p.alive));
        assert_eq!(started[0].command, "sleep 5");
        assert_eq!(started[1].command, "sleep 6");
        assert_eq!(host.spawned().len(), 2);
    }

    #[test]
    fn chained_command_rejects_whole_batch() {
        let host = MockHost::new();
        let err = launch(&host, &["echo hello", "sleep 1 && sleep 1"]).unwrap_err();

        assert_eq!(
            err,
            LaunchError::Chained {
                command: "sleep 1 && sleep 1".into()
            }
        );
        assert!(host.spawned().is_empty());
        assert!(err.to_string().starts_with("chained commands are not supported."));
    }

    #[test]
    fn spawn_failure_is_skipped() {
        let host = MockHost::new();
        host.fail_command("missing-binary");

        let started = launch(&host, &["sleep 5", "missing-binary", "sleep 6"]).unwrap();

        let commands: Vec<_> = started.iter().map(|p| p.command.as_str()).collect();
        assert_eq!(commands, vec!["sleep 5", "sleep 6"]);
    }

    #[test]
    fn all_spawns_failing_starts_nothing() {
        let host = MockHost::new();
        host.fail_command("a");
        host.fail_command("b");

        let started = launch(&host, &["a".to_string(), "b".to_string()]).unwrap();
        assert!(started.is_empty());
    }
}
