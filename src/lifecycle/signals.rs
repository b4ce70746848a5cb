//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for the interrupt signal (Ctrl-C / SIGINT)
//! - Translate it into cancellation of the root [`Shutdown`] context
//!
//! A second interrupt has no additional effect.

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{CancelCause, Shutdown};

/// Spawn the background task that cancels `shutdown` on interrupt.
///
/// The task also exits quietly if the context is cancelled some other way.
pub fn spawn_interrupt_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => {
                    tracing::info!(signal = "SIGINT", "Received signal");
                    shutdown.trigger(CancelCause::Interrupt);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Unable to listen for interrupt signal");
                }
            },
            _ = shutdown.cancelled() => {}
        }
    })
}
