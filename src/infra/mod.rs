//! Infrastructure adapters for the simulation gateway.

pub mod gateway;

#[cfg(feature = "tokio-runtime")]
pub use gateway::ChannelGateway;
pub use gateway::{InMemoryGateway, OutboundCall};
