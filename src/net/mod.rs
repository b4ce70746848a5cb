//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Optional PEM bundle
//!     → tls.rs (pinned certificates or system roots)
//!     → system roots: tonic ClientTlsConfig
//!     → pinned: rustls connector with pinned-certificate verifier
//!     → node connector endpoint
//! ```

pub mod tls;

pub use tls::{build_transport_credentials, install_crypto_provider, TransportCredentials};
