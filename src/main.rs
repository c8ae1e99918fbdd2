//! Command-line client for DAVID chart reports.
//!
//! Progress goes to stdout, errors and diagnostics to stderr. Exit codes:
//! 0 success (including an empty report), 1 unexpected failure, 2 usage
//! (clap), 3 local validation failure, 4 retry exhaustion.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::thread;
use tracing_subscriber::EnvFilter;

mod cli;
mod client;
mod config;
mod error;
mod identifiers;
mod report;
mod soap;
mod workflow;

use client::SoapSession;
use error::EXIT_VALIDATION;

fn main() -> ExitCode {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: cli::Args) -> Result<ExitCode> {
    let config = args.into_config();

    let ids = identifiers::load(&config.input_file)?;
    if ids.is_empty() {
        eprintln!(
            "no identifiers found in {}",
            config.input_file.display()
        );
        return Ok(ExitCode::from(EXIT_VALIDATION));
    }
    println!(
        "Read {} identifiers from {}",
        ids.len(),
        config.input_file.display()
    );

    let outcome = workflow::run_with_retry(
        || SoapSession::connect(&config.endpoint),
        &config,
        &ids,
        thread::sleep,
    );

    match outcome {
        Ok(result) => {
            println!(
                "Wrote {} records to {}",
                result.records,
                config.output_file.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let code = err.exit_code();
            eprintln!("error: {:#}", anyhow::Error::new(err));
            Ok(ExitCode::from(code))
        }
    }
}
