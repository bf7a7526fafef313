//! CLI module for PolicyHub
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP API
//! - validate: Check a payload file against a schema file
//! - check-schema: Check a schema file is well formed

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_schema, load_schema, run, run_command, serve, validate, validate_files};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json, write_error, write_response};
