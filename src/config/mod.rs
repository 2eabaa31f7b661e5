//! Configuration models for brokers and tenant fleets.

pub mod broker;

pub use broker::{load_from_env, BrokerConfig, FleetConfig, CONFIG_PATH_ENV};
