//! Command line interface module
//!
//! This module provides the entry point for parsing command-line arguments and running the
//! browser commands: argument parsing, runtime configuration and the command runner.

pub mod args;
pub mod config;
pub mod runner;

pub use args::{Args, Command, ServersAction};
pub use config::{AuthConfig, BrowserConfig};
pub use runner::Runner;
