//! CLI argument definitions using clap
//!
//! Commands:
//! - policyhub serve --config <path>
//! - policyhub validate --schema <path> --payload <path>
//! - policyhub check-schema <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PolicyHub - insurance policy records with admin-defined schemas
#[derive(Parser, Debug)]
#[command(name = "policyhub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./policyhub.json")]
        config: PathBuf,
    },

    /// Validate a payload file against a schema file
    Validate {
        /// Schema definition (JSON object of field definitions)
        #[arg(long)]
        schema: PathBuf,

        /// Payload (JSON object)
        #[arg(long)]
        payload: PathBuf,
    },

    /// Check that a schema file is well formed
    CheckSchema {
        /// Schema definition (JSON object of field definitions)
        file: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_default_config() {
        let cli = Cli::try_parse_from(["policyhub", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config } => assert_eq!(config, PathBuf::from("./policyhub.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_validate_requires_both_files() {
        assert!(Cli::try_parse_from(["policyhub", "validate", "--schema", "s.json"]).is_err());
        assert!(Cli::try_parse_from([
            "policyhub", "validate", "--schema", "s.json", "--payload", "p.json"
        ])
        .is_ok());
    }

    #[test]
    fn test_check_schema_positional() {
        let cli = Cli::try_parse_from(["policyhub", "check-schema", "schema.json"]).unwrap();
        assert!(matches!(cli.command, Command::CheckSchema { .. }));
    }
}
