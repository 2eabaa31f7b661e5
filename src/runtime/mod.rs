//! Runtime surface: notification routing and the async broker actor.

#[cfg(feature = "tokio-runtime")]
pub mod actor;
pub mod api;

#[cfg(feature = "tokio-runtime")]
pub use actor::{spawn_broker, BrokerHandle};
pub use api::{apply_notification, snapshot, BrokerNotification, BrokerSnapshot};
