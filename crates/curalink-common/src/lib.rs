//! curalink-common — Shared error types, configuration, and the capped HTTP
//! client used by every CuraLink crate.

pub mod config;
pub mod error;
pub mod http;

// Re-export commonly used types
pub use config::{Config, DatabaseConfig, SourcesConfig};
pub use error::{CuraLinkError, Result};
pub use http::SourceClient;
