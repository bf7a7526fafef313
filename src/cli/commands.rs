//! CLI command implementations

use std::path::Path;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_json, write_error, write_response};
use crate::config::PolicyHubConfig;
use crate::http_server::HttpServer;
use crate::schema::{validate as validate_payload, Payload, Schema, SchemaPatch, Violation};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config } => serve(&config),
        Command::Validate { schema, payload } => validate(&schema, &payload),
        Command::CheckSchema { file } => check_schema(&file),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,policyhub=debug,tower_http=info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load configuration and run the HTTP server until it stops
pub fn serve(config_path: &Path) -> CliResult<()> {
    init_tracing();

    let config = PolicyHubConfig::load(config_path)?;
    if config.auth.otp_fixed_code.is_some() {
        tracing::warn!("auth.otp_fixed_code is set; every OTP request gets the same code");
    }
    let server = HttpServer::new(&config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Read and compile a schema file
pub fn load_schema(path: &Path) -> CliResult<Schema> {
    let patch: SchemaPatch = read_json(path)?;
    Ok(Schema::try_from(patch)?)
}

/// Violations of a payload file against a schema file
pub fn validate_files(schema_path: &Path, payload_path: &Path) -> CliResult<Vec<Violation>> {
    let schema = load_schema(schema_path)?;
    let payload: Payload = read_json(payload_path)?;
    Ok(validate_payload(&schema, &payload))
}

/// Print the violations; fails when there are any
pub fn validate(schema_path: &Path, payload_path: &Path) -> CliResult<()> {
    let violations = validate_files(schema_path, payload_path)?;
    if violations.is_empty() {
        return write_response(json!({ "valid": true, "violations": [] }));
    }

    let err = CliError::validation_failed(violations.len());
    write_error(
        err.code_str(),
        err.message(),
        json!({ "valid": false, "violations": violations }),
    )?;
    Err(err)
}

/// Print the fields of a well-formed schema in display order
pub fn check_schema(path: &Path) -> CliResult<()> {
    let schema = load_schema(path)?;
    let fields = schema.display_order();
    write_response(json!({ "valid": true, "fields": fields }))
}
