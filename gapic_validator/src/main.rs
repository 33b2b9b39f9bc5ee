mod cli;
mod error;

use clap::Parser;
use cli::Cli;
use error::{CliError, Result};
use gapic_validator_core::{encode_response, handle};
use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the response, so logs go to stderr.
    // RUST_LOG overrides the verbosity flags.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let request = read_request(cli)?;
    debug!(bytes = request.len(), "Read CodeGeneratorRequest");

    let response = handle(&request)?;
    if let Some(message) = &response.error {
        info!("{message}");
    }

    write_response(cli, &encode_response(&response)?)
}

fn read_request(cli: &Cli) -> Result<Vec<u8>> {
    let read = match &cli.request {
        Some(path) => fs::read(path),
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf).map(|_| buf)
        }
    };
    read.map_err(|source| CliError::ReadRequest {
        path: cli.request.clone(),
        source,
    })
}

fn write_response(cli: &Cli, bytes: &[u8]) -> Result<()> {
    let written = match &cli.output {
        Some(path) => fs::write(path, bytes),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).and_then(|()| stdout.flush())
        }
    };
    written.map_err(|source| CliError::WriteResponse {
        path: cli.output.clone(),
        source,
    })
}
