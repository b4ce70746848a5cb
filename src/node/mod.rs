//! Node integration subsystem.
//!
//! # Data Flow
//! ```text
//! CLI credential material (macaroon, optional PEM)
//!     → security (token codec, trust bundle)
//!     → auth.rs (per-call macaroon metadata)
//!     → client.rs (dial under deadline, GetInfo liveness check)
//!     → proto.rs (Lightning.GetInfo, ChainNotifier.RegisterConfirmationsNtfn)
//! ```
//!
//! # Security Constraints
//! - The macaroon is presented on every call, never only at connect time
//! - The macaroon signature is never logged
//! - Dial failures are not retried

pub mod auth;
pub mod client;
pub mod proto;
pub mod types;

pub use client::NodeClient;
pub use types::{NodeError, NodeInfo, NodeResult};
