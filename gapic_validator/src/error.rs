use gapic_validator_core::ValidatorError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read request from {}: {source}", describe(.path, "stdin"))]
    ReadRequest {
        path: Option<PathBuf>,
        source: std::io::Error,
    },

    #[error("Failed to write response to {}: {source}", describe(.path, "stdout"))]
    WriteResponse {
        path: Option<PathBuf>,
        source: std::io::Error,
    },

    #[error(transparent)]
    Validator(#[from] ValidatorError),
}

pub type Result<T> = std::result::Result<T, CliError>;

fn describe(path: &Option<PathBuf>, stream: &str) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => stream.to_string(),
    }
}
