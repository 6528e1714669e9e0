//! Filestore core library
//!
//! Shared types for the filestore service: configuration, the error
//! taxonomy, the storage key-namespace policy, and content sniffing.

pub mod config;
pub mod error;
pub mod keys;
pub mod sniff;

pub use config::Config;
pub use error::{AppError, LogLevel};
