//! LND confirmation watcher library.

pub mod config;
pub mod lifecycle;
pub mod mempool;
pub mod net;
pub mod node;
pub mod observability;
pub mod security;
pub mod watch;

pub use config::schema::WatchConfig;
pub use lifecycle::Shutdown;
pub use node::NodeClient;
pub use watch::ConfirmationWatcher;
