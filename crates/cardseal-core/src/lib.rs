//! # cardseal-core
//!
//! Shared building blocks for the cardseal crates:
//!
//! - **Configuration**: the JSON5 config file naming the shared group, key
//!   account, and storage locations
//! - **Paths**: resolution of `~/.cardseal` and the directories below it
//! - **Secrets**: [`SecretString`], a zeroizing string that never prints

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

pub use config::Config;
pub use error::ConfigError;
pub use secret::{constant_time_eq, SecretString};
