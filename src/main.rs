//! Entry point for the `tasklock` CLI.
//!
//! Parses arguments, dispatches to the command handler, and maps errors to
//! exit codes. Diagnostics go to stderr through `tracing`; set `RUST_LOG`
//! (e.g. `RUST_LOG=tasklock=debug`) to see lease decisions.

use std::process::ExitCode;
use tasklock::cli::Cli;
use tasklock::{commands, exit_codes};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
