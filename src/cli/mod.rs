//! CLI-specific functionality for the evaluation agent
//!
//! This module contains argument parsing and configuration discovery.

pub mod args;
pub mod config;

pub use args::{Args, Commands, ExecutionMode, RunConfig};
pub use config::{AppConfig, ConfigDiscovery, ConfigError, StorageConfig};
