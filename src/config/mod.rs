//! Configuration module for Docmark
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. CLI flags are merged over file values in `main.rs`.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, CrawlConfig, DEFAULT_DELAY, DEFAULT_TIMEOUT};
pub use validation::validate;
