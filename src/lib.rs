//! policyhub - insurance policy records with admin-defined dynamic schemas
//!
//! Policies and applications carry typed scalar attributes plus an optional
//! schema authored at runtime; every write validates the record's dynamic
//! payload against that schema before it is stored.

pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod record;
pub mod schema;
