//! Core traits for zonesync
//!
//! - [`ZoneApi`]: List zones and RRSets, bulk-write RRSets via a provider API
//! - [`ZoneApiFactory`]: Build a [`ZoneApi`] from [`ProviderConfig`](crate::config::ProviderConfig)

pub mod zone_api;

pub use zone_api::{ZoneApi, ZoneApiFactory};
