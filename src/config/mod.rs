//! Configuration module for pfsense-watch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pfsense_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pfsense.toml")).unwrap();
//! println!("Retrying up to {} times", config.client.retry_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, FirewallConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::base_url;
