//! Integration tests for the kv database

mod audit_integration;
mod cli_contracts;
mod store_integration;
