//! CLI support for ado-parser
//!
//! The `adoparse` binary is a thin wrapper over these functions, so other
//! tools can run the same checks without spawning a process.

mod check;

pub use check::{CheckOptions, ParseOutput, execute_check, execute_parse, execute_print, parse_define};

use std::io;

use thiserror::Error;

use crate::driver::ParseFailure;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", describe_failure(.0))]
    Parse(#[from] ParseFailure),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid macro definition `{0}` (expected NAME=VALUE)")]
    InvalidDefine(String),

    #[error("No input provided. Pass a file or pipe a script to stdin.")]
    NoInput,
}

fn describe_failure(failure: &ParseFailure) -> String {
    failure
        .errors
        .iter()
        .map(|err| format!("error: {}", err))
        .collect::<Vec<_>>()
        .join("\n")
}
