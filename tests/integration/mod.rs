//! Integration tests for the context-scoped serialization subsystem

mod cli_binary;
mod config_integration;
mod scope_isolation;
mod test_utils;
