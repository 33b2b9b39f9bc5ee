use std::path::PathBuf;
use thiserror::Error;

/// Processing failures that abort a validation run.
///
/// These are distinct from annotation violations, which are collected in
/// [`crate::diagnostics::Diagnostics`] and never abort the run.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode CodeGeneratorRequest: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Failed to build descriptor pool: {0}")]
    Descriptor(#[from] prost_reflect::DescriptorError),

    #[error("Failed to encode CodeGeneratorResponse: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("Error reading gapic config {path}: {message}")]
    LegacyConfig { path: PathBuf, message: String },

    #[error("Error decoding gapic config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("FileToGenerate ({0}) did not have a rich descriptor")]
    FileNotFound(String),

    #[error("Invalid plugin parameter: {key} = {value}")]
    InvalidParameter { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ValidatorError>;

impl ValidatorError {
    pub fn legacy_config(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ValidatorError::LegacyConfig {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn file_not_found(name: impl Into<String>) -> Self {
        ValidatorError::FileNotFound(name.into())
    }

    pub fn invalid_parameter(key: impl Into<String>, value: impl Into<String>) -> Self {
        ValidatorError::InvalidParameter {
            key: key.into(),
            value: value.into(),
        }
    }
}
