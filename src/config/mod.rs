//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (--lnd, --macaroon, --cert, --config, overrides)
//!     → loader.rs (TOML parse, base64 decode of credential flags)
//!     → validation.rs (semantic checks)
//!     → WatchConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the file is optional
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    ConfirmationConfig, LogFormat, MempoolConfig, NodeConfig, ObservabilityConfig, WatchConfig,
};
