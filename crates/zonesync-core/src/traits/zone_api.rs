// # Zone API Trait
//
// Defines the interface to a provider's zone and RRSet REST endpoints.
//
// ## Implementations
//
// - deSEC: `zonesync-provider-desec` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::{RequestContext, ZoneApi};
//
// async fn dump(api: &dyn ZoneApi) -> zonesync_core::Result<()> {
//     let ctx = RequestContext::with_timeout(std::time::Duration::from_secs(30));
//     for zone in api.list_zones(&ctx).await? {
//         let rrsets = api.list_rrsets(&ctx, &zone.name).await?;
//         println!("{}: {} rrsets", zone.name, rrsets.len());
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::model::{RRSet, Zone};

/// Trait for remote zone clients
///
/// Each method issues exactly one HTTP request and maps the response into
/// either decoded data or an [`Error`](crate::Error) that carries the
/// request's method, path and (for non-2xx responses) raw body text.
///
/// # Constraints
///
/// - No retry and no backoff: a failed request is returned to the caller
/// - No caching: zones and RRSets are re-fetched on every call
/// - The credential is the only state an implementation holds
/// - Every request is bounded by the supplied [`RequestContext`]
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// List every zone visible to the credential, in provider order
    ///
    /// ```http
    /// GET /domains/
    /// ```
    async fn list_zones(&self, ctx: &RequestContext) -> Result<Vec<Zone>, crate::Error>;

    /// List every RRSet in a zone, in provider order
    ///
    /// ```http
    /// GET /domains/{zone}/rrsets/
    /// ```
    async fn list_rrsets(
        &self,
        ctx: &RequestContext,
        zone: &str,
    ) -> Result<Vec<RRSet>, crate::Error>;

    /// Upsert or delete a batch of RRSets in one request
    ///
    /// RRSets with an empty `records` list delete that name+type. Returns the
    /// RRSets echoed back by the provider.
    ///
    /// ```http
    /// PUT /domains/{zone}/rrsets/
    /// [{"subname": "www", "type": "A", "records": ["1.2.3.4"], "ttl": 3600}]
    /// ```
    async fn bulk_write_rrsets(
        &self,
        ctx: &RequestContext,
        zone: &str,
        rrsets: &[RRSet],
    ) -> Result<Vec<RRSet>, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone clients from configuration
pub trait ZoneApiFactory: Send + Sync {
    /// Create a ZoneApi instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed ZoneApi trait object
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneApi>, crate::Error>;
}
