//! Command-line interface definitions for the GAPIC validator plugin.

use clap::Parser;
use std::path::PathBuf;

/// protoc plugin validating GAPIC annotations
///
/// Reads a serialized CodeGeneratorRequest and writes a CodeGeneratorResponse
/// whose error field lists every annotation violation found. Pass
/// `gapic-yaml=<path>` as the plugin parameter to also compare a legacy GAPIC
/// config.
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-gapic-validator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read the serialized request from a file instead of stdin
    #[arg(long, env = "GAPIC_VALIDATOR_REQUEST")]
    pub request: Option<PathBuf>,

    /// Write the serialized response to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
