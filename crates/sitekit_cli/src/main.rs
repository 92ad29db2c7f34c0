//! `sitekit` binary: builds deployment bundles from the command line.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod cli;

use cli::{Cli, ConfigProblem, Outcome};
use sitekit_bundle::BundleError;

/// Process exit codes.
#[repr(u8)]
enum Exit {
    Success = 0,
    StepsFailed = 1,
    ConfigError = 2,
    BuildError = 3,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.execute() {
        Ok(Outcome::Success) => Exit::Success.into(),
        Ok(Outcome::StepsFailed) => Exit::StepsFailed.into(),
        Err(e) => {
            error!("{e:#}");
            let is_config = e.downcast_ref::<ConfigProblem>().is_some()
                || matches!(e.downcast_ref::<BundleError>(), Some(BundleError::Config(_)));
            if is_config {
                Exit::ConfigError.into()
            } else {
                Exit::BuildError.into()
            }
        }
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default_level = match cli.verbose {
        0 if cli.quiet => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cli.verbose >= 2),
        )
        .init();
}
