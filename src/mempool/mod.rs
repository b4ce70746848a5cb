//! Mempool data service integration.
//!
//! # Data Flow
//! ```text
//! GET {base}/mempool/recent  → Vec<MempoolEntry>   (first = transaction of interest)
//! GET {base}/tx/{txid}       → MempoolTransaction  (vout[0].scriptpubkey = filter)
//! ```

pub mod client;
pub mod types;

pub use client::MempoolClient;
pub use types::{MempoolEntry, MempoolError, MempoolResult, MempoolTransaction, TxInput, TxOutput};
