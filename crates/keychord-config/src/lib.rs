//! Configuration for keychord
//!
//! This crate holds the key map model shared by the engine and the CLI, and
//! parses KDL configuration files into it.

mod error;
mod model;
mod parser;

pub use error::{ConfigError, InvalidKeyInfo, SourceLocation};
pub use model::*;
pub use parser::{parse_config, parse_config_str};
