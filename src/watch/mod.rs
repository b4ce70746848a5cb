//! Confirmation watch pipeline.
//!
//! # Data Flow
//! ```text
//! ChainBackend::get_info           → best height
//! MempoolSource::recent_entries    → first txid      (EmptyMempool, MalformedTxid)
//! MempoolSource::transaction_outputs → first script  (NoOutputs, MalformedScript)
//!     → request.rs (ConfRequest: txid, script, num_confs, best - lookback)
//!     → ChainBackend::register_confirmations
//!     → monitor.rs (drain until end / error / cancellation)
//! ```
//!
//! # Design Decisions
//! - At most one subscription per run, no fan-out
//! - Updates are reported in stream order with no buffering
//! - Every suspension point races the root cancellation context

pub mod backend;
pub mod monitor;
pub mod request;
pub mod types;

pub use backend::{ChainBackend, MempoolSource, UpdateStream};
pub use monitor::{drain_updates, ConfirmationWatcher};
pub use types::{WatchError, WatchOutcome, WatchResult, WatchState};
