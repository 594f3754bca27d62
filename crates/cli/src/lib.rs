//! The `snap` command line: one subcommand per run against a Snapmaker 2.0 A350.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod program;
