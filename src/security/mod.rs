//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! CLI (base64 macaroon, optional base64 PEM)
//!     → macaroon.rs (binary token codec)
//!     → credentials.rs (token + transport trust bundle)
//!     → node connector (per-call token attachment)
//! ```
//!
//! # Design Decisions
//! - Fail closed: any credential error aborts before network I/O
//! - The token signature is never logged

pub mod credentials;
pub mod macaroon;

pub use credentials::{build_access_token, CredentialError, Credentials};
pub use macaroon::{Caveat, Macaroon, MacaroonError};
