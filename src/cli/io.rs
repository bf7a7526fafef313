//! JSON file input and stdout output for CLI commands

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read and parse a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::io_error(format!("{}: {}", path.display(), e)))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str, data: Value) -> CliResult<()> {
    write_line(&serde_json::json!({
        "status": "error",
        "code": code,
        "message": message,
        "data": data
    }))
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
