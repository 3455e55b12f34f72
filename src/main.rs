//! TidySleuth: duplicate finder and directory organiser.
//!
//! Thin binary entry point. All logic lives in the `tidysleuth-core` crate.

mod cli;
mod commands;
mod render;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status after Ctrl-C, following the shell convention.
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if matches!(
                err.downcast_ref::<tidysleuth_core::Error>(),
                Some(tidysleuth_core::Error::Cancelled)
            ) {
                eprintln!("cancelled");
                return ExitCode::from(EXIT_CANCELLED);
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so reports on stdout stay machine-readable.
///
/// `RUST_LOG` wins unless `-v` / `-q` was given.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let default = format!("tidysleuth={level},tidysleuth_core={level}");
    let filter = if quiet || verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
