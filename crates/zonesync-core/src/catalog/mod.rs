//! Zone catalog
//!
//! Fetches the zones visible to the credential and keeps the ones the
//! configured [`DomainFilter`] allows. The catalog is rebuilt on every pass;
//! nothing is cached between passes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::RequestContext;
use crate::error::Result;
use crate::model::Zone;
use crate::traits::ZoneApi;

/// Domain-suffix allow-list
///
/// A name matches a root when it equals the root or ends with `"." + root`.
/// A root written with a leading dot (`.example.com`) matches strict
/// subdomains only. Comparison ignores ASCII case and trailing dots. An empty
/// root list matches every name; exclusions always win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilter {
    #[serde(default)]
    filters: Vec<String>,

    #[serde(default)]
    exclude: Vec<String>,
}

impl DomainFilter {
    /// Create a filter from allow-list roots; blank entries are dropped
    pub fn new<I, S>(filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            filters: clean(filters),
            exclude: Vec::new(),
        }
    }

    /// Add names whose subtrees are never managed
    pub fn with_exclusions<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = clean(exclude);
        self
    }

    /// A filter that matches every name
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Whether no allow-list roots are configured
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Configured allow-list roots
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Whether `name` may be managed
    pub fn matches(&self, name: &str) -> bool {
        let name = normalize(name);

        if self.exclude.iter().any(|root| matches_root(&name, root)) {
            return false;
        }

        self.filters.is_empty() || self.filters.iter().any(|root| matches_root(&name, root))
    }
}

fn clean<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty() && s != ".")
        .collect()
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn matches_root(name: &str, root: &str) -> bool {
    let root = normalize(root);

    if let Some(parent) = root.strip_prefix('.') {
        return name.len() > parent.len() + 1 && name.ends_with(root.as_str());
    }

    name == root
        || (name.len() > root.len()
            && name.ends_with(root.as_str())
            && name.as_bytes()[name.len() - root.len() - 1] == b'.')
}

/// Lists the zones a reconciliation pass may touch
pub struct ZoneCatalog<'a> {
    api: &'a dyn ZoneApi,
    filter: &'a DomainFilter,
}

impl<'a> ZoneCatalog<'a> {
    /// Create a catalog over `api` restricted by `filter`
    pub fn new(api: &'a dyn ZoneApi, filter: &'a DomainFilter) -> Self {
        Self { api, filter }
    }

    /// Fetch all zones and keep the managed ones, in provider order
    ///
    /// Fails if the underlying listing fails; no partial result is returned.
    pub async fn list_managed_zones(&self, ctx: &RequestContext) -> Result<Vec<Zone>> {
        let zones = self.api.list_zones(ctx).await?;
        let total = zones.len();

        let managed: Vec<Zone> = zones
            .into_iter()
            .filter(|zone| {
                let keep = self.filter.matches(&zone.name);
                if !keep {
                    debug!("Zone {} is outside the domain filter, ignoring", zone.name);
                }
                keep
            })
            .collect();

        debug!(
            "{} of {} zone(s) from {} are managed",
            managed.len(),
            total,
            self.api.provider_name()
        );

        Ok(managed)
    }
}
