// # zonesync-core
//
// Core library for reconciling generic DNS endpoint changes against a
// provider's RRSet API.
//
// ## Architecture Overview
//
// - **ZoneApi**: Trait for the provider's zone/RRSet REST endpoints
// - **ZoneCatalog**: Lists the zones a pass may manage (domain filter)
// - **Reconciler**: Buckets endpoint changes into per-zone RRSet writes
// - **materialize**: Turns RRSet listings back into generic endpoints
// - **SyncEngine**: Runs read and write passes, honors dry-run
// - **ProviderRegistry**: Plugin-based registry for zone API clients
//
// ## Design Principles
//
// 1. **Pass-scoped state**: zones and write buckets are rebuilt every pass
// 2. **One write per zone**: each touched zone gets a single bulk request
// 3. **Bounded calls**: every remote call runs under a RequestContext
// 4. **Library-First**: the binary is a thin wrapper over this crate

pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod materializer;
pub mod model;
pub mod reconciler;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use catalog::{DomainFilter, ZoneCatalog};
pub use config::{ProviderConfig, SyncConfig};
pub use context::RequestContext;
pub use engine::{PassReport, SyncEngine, SyncEvent};
pub use error::{Error, Result};
pub use materializer::{SupportedTypes, materialize};
pub use model::{ChangeKind, Changes, Endpoint, RRSet, Zone};
pub use reconciler::{DEFAULT_RECORD_TTL, Reconciler, SkippedChange, WritePlan, ZoneBucket};
pub use registry::ProviderRegistry;
pub use traits::{ZoneApi, ZoneApiFactory};
