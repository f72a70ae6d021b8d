//! Configuration utility functions
//!
//! This module provides helper functions for working with
//! environment variables and configuration values.

use std::path::PathBuf;

/// Get a path value from an environment variable or use the default
pub fn get_env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}
