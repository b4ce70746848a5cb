//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Decode credentials → Mempool client → Connect node → Watch
//!
//! Shutdown (shutdown.rs):
//!     Root context, cancelled exactly once → every blocking call observes it
//!
//! Signals (signals.rs):
//!     SIGINT → Shutdown::trigger(Interrupt)
//! ```
//!
//! # Design Decisions
//! - The root context has no deadline; only the connect phase is bounded
//! - Cancellation records its cause so exit handling can tell a clean stop
//!   from a failure

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{CancelCause, Shutdown};
pub use signals::spawn_interrupt_listener;
pub use startup::{NodeTarget, StartupError};
