//! multirun - run several commands as one unit
//!
//! Every command is launched as a sibling child in its own process group.
//! When any of them exits, or when multirun receives SIGINT/SIGTERM, all
//! remaining groups are signaled once and multirun waits for every child
//! before exiting. Meant to run as process 1 in a container.
//!
//! Exit codes:
//! - 0: every child exited normally
//! - 1: at least one child exited abnormally, or none could be started
//! - 2: usage error, or a chained command was rejected

mod signals;

use anyhow::Result;
use clap::Parser;
use multirun_core::{Supervisor, launch};
use multirun_host_api::{ProcessHost, Subreaper, SubreaperStatus};
use multirun_host_linux::{LinuxHost, SystemSubreaper};
use std::process::ExitCode;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::signals::forward_shutdown_signals;

/// At least one child ended abnormally, or nothing could be started
const EXIT_FAILURE: u8 = 1;

/// Usage error or rejected command line
const EXIT_USAGE: u8 = 2;

/// multirun - run several commands, stop them all when one of them stops
#[derive(Parser, Debug)]
#[command(name = "multirun", version)]
#[command(about = "Run several commands, stop them all when one of them stops", long_about = None)]
struct Args {
    /// Verbose mode: log diagnostics to stdout
    #[arg(short, long, env = "MULTIRUN_VERBOSE")]
    verbose: bool,

    /// Commands to run, each one a single shell command line
    #[arg(value_name = "COMMAND", required = true, trailing_var_arg = true)]
    commands: Vec<String>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // WARN and ERROR go to stderr, diagnostics to stdout
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();
}

/// Best effort: the outcome is only ever logged
fn register_subreaper(subreaper: &impl Subreaper) -> Option<SubreaperStatus> {
    match subreaper.register() {
        Ok(status @ SubreaperStatus::Registered) => {
            info!("Successfully registered as subreaper");
            Some(status)
        }
        Ok(status @ SubreaperStatus::Unsupported) => {
            debug!("Subreaper registration not supported on this platform");
            Some(status)
        }
        Err(e) => {
            info!(error = %e, "Failed to register as subreaper, subchildren exit status might be ignored");
            None
        }
    }
}

async fn run(args: &Args) -> Result<ExitCode> {
    let signals = forward_shutdown_signals()?;

    let host = LinuxHost::new();
    let exits = host.subscribe();

    let started = match launch(&host, &args.commands) {
        Ok(started) => started,
        Err(e) => {
            eprintln!("multirun: error: {}", e);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    let mut supervisor = Supervisor::new(&host, started);

    if supervisor.is_empty() {
        warn!("No processes were successfully started");
        return Ok(ExitCode::from(EXIT_FAILURE));
    }

    let verdict = supervisor.run(exits, signals).await;

    if verdict.had_errors() {
        eprintln!("multirun: one or more of the provided commands ended abnormally");
        return Ok(ExitCode::from(EXIT_FAILURE));
    }

    info!(count = verdict.normal, "All subprocesses exited without errors");
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose);

    debug!(version = env!("CARGO_PKG_VERSION"), "multirun starting");

    register_subreaper(&SystemSubreaper);

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("multirun: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
