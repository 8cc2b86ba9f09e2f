//! CLI integration tests
//!
//! - `cli::config_file` - configuration file discovery, merging and CLI overrides
//! - `cli::outcome_report` - what the binary prints and returns for an outcome

mod cli;
mod common;
