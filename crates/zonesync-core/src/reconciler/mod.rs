//! Change reconciler
//!
//! Maps a batch of generic endpoint changes onto per-zone RRSet write
//! buckets.
//!
//! ## Algorithm
//!
//! For each change, in precedence order (creates, updates, deletions):
//!
//! 1. Resolve the owning zone: the longest managed zone name that equals the
//!    DNS name or is a label-boundary suffix of it. No match → skipped.
//! 2. Strip `"." + zone` from the name to get the subname (empty at apex).
//! 3. Use the configured TTL, or [`DEFAULT_RECORD_TTL`].
//! 4. Build an RRSet with the targets verbatim; deletions carry no records.
//! 5. Append it to the zone's bucket.
//!
//! Repeated (subname, type) entries are appended in order, so the provider
//! applies the last one. [`Reconciler::with_collapse_duplicates`] keeps only
//! the last entry instead.
//!
//! Buckets are emitted in catalog zone order and only when non-empty.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::model::{ChangeKind, Changes, Endpoint, RRSet, Zone};
use crate::traits::ZoneApi;

/// TTL used when a change does not configure one (seconds)
pub const DEFAULT_RECORD_TTL: u32 = 3600;

/// RRSets to submit to one zone in a single bulk write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneBucket {
    pub zone: String,
    pub rrsets: Vec<RRSet>,
}

/// A change whose name falls outside every managed zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedChange {
    pub kind: ChangeKind,
    pub dns_name: String,
    pub record_type: String,
}

/// Result of planning a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WritePlan {
    buckets: Vec<ZoneBucket>,
    skipped: Vec<SkippedChange>,
}

impl WritePlan {
    /// Non-empty buckets, in catalog zone order
    pub fn buckets(&self) -> &[ZoneBucket] {
        &self.buckets
    }

    /// Changes that matched no managed zone
    pub fn skipped(&self) -> &[SkippedChange] {
        &self.skipped
    }

    /// Bucket for `zone`, if any change touched it
    pub fn bucket(&self, zone: &str) -> Option<&ZoneBucket> {
        self.buckets.iter().find(|b| b.zone == zone)
    }

    /// Whether no write call is needed
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of RRSets across all buckets
    pub fn rrset_count(&self) -> usize {
        self.buckets.iter().map(|b| b.rrsets.len()).sum()
    }
}

/// Zone-resolving change planner for one pass
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Zone names in catalog order
    zones: Vec<String>,

    /// (catalog index, normalized name), longest name first
    lookup: Vec<(usize, String)>,

    collapse_duplicates: bool,
}

impl Reconciler {
    /// Create a reconciler over the managed zones of this pass
    pub fn new(managed_zones: &[Zone]) -> Self {
        let zones: Vec<String> = managed_zones.iter().map(|z| z.name.clone()).collect();

        let mut lookup: Vec<(usize, String)> = zones
            .iter()
            .enumerate()
            .map(|(i, name)| (i, normalize(name)))
            .collect();
        // Stable: equal lengths keep catalog order
        lookup.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        Self {
            zones,
            lookup,
            collapse_duplicates: false,
        }
    }

    /// Keep only the last RRSet per (subname, type) in each bucket
    pub fn with_collapse_duplicates(mut self, collapse: bool) -> Self {
        self.collapse_duplicates = collapse;
        self
    }

    /// Name of the most specific managed zone owning `dns_name`
    pub fn resolve_zone(&self, dns_name: &str) -> Option<&str> {
        self.resolve_index(dns_name).map(|i| self.zones[i].as_str())
    }

    fn resolve_index(&self, dns_name: &str) -> Option<usize> {
        let name = normalize(dns_name);
        self.lookup
            .iter()
            .find(|(_, zone)| is_within(&name, zone))
            .map(|(i, _)| *i)
    }

    /// Bucket every change by owning zone
    pub fn plan(&self, changes: &Changes) -> WritePlan {
        let mut buckets: Vec<Vec<RRSet>> = vec![Vec::new(); self.zones.len()];
        let mut skipped = Vec::new();

        for (kind, endpoint) in changes.in_precedence_order() {
            let Some(index) = self.resolve_index(&endpoint.dns_name) else {
                debug!(
                    "Skipping {} of {} {} because no matching zone was found",
                    kind, endpoint.record_type, endpoint.dns_name
                );
                skipped.push(SkippedChange {
                    kind,
                    dns_name: endpoint.dns_name.clone(),
                    record_type: endpoint.record_type.clone(),
                });
                continue;
            };

            let rrset = build_rrset(&self.zones[index], kind, endpoint);
            debug!(
                "Planned {} of {} {} in zone {} (subname {:?}, {} record(s))",
                kind,
                rrset.record_type,
                rrset.name,
                rrset.domain,
                rrset.subname,
                rrset.records.len()
            );
            buckets[index].push(rrset);
        }

        let buckets = self
            .zones
            .iter()
            .zip(buckets)
            .filter(|(_, rrsets)| !rrsets.is_empty())
            .map(|(zone, rrsets)| ZoneBucket {
                zone: zone.clone(),
                rrsets: if self.collapse_duplicates {
                    collapse(rrsets)
                } else {
                    rrsets
                },
            })
            .collect();

        WritePlan { buckets, skipped }
    }
}

/// Build the RRSet a change writes into `zone`
///
/// `zone` must own `endpoint.dns_name`.
pub fn build_rrset(zone: &str, kind: ChangeKind, endpoint: &Endpoint) -> RRSet {
    let records = match kind {
        ChangeKind::Delete => Vec::new(),
        ChangeKind::Create | ChangeKind::Update => endpoint.targets.clone(),
    };

    RRSet {
        domain: zone.to_string(),
        subname: subname(&endpoint.dns_name, zone),
        name: endpoint.dns_name.clone(),
        record_type: endpoint.record_type.clone(),
        records,
        ttl: endpoint.configured_ttl().unwrap_or(DEFAULT_RECORD_TTL),
        created: None,
        touched: None,
    }
}

/// Part of `dns_name` left of `"." + zone`; empty when the name is the apex
pub fn subname(dns_name: &str, zone: &str) -> String {
    let name = dns_name.trim_end_matches('.');
    let zone = zone.trim_end_matches('.');

    if name.len() <= zone.len() {
        return String::new();
    }
    name[..name.len() - zone.len() - 1].to_string()
}

/// Write one bucket
pub async fn write_bucket(
    api: &dyn ZoneApi,
    ctx: &RequestContext,
    bucket: &ZoneBucket,
) -> Result<Vec<RRSet>> {
    api.bulk_write_rrsets(ctx, &bucket.zone, &bucket.rrsets)
        .await
        .map_err(|e| Error::write(&bucket.zone, e))
}

/// Submit every bucket of `plan`, one bulk write per zone
///
/// Stops at the first failure with [`Error::Write`]. Zones already written
/// stay written; remaining buckets are abandoned. Returns the zones written.
pub async fn apply_plan(
    api: &dyn ZoneApi,
    ctx: &RequestContext,
    plan: &WritePlan,
) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(plan.buckets.len());

    for bucket in &plan.buckets {
        write_bucket(api, ctx, bucket).await?;
        info!(
            "Wrote {} rrset(s) to zone {} via {}",
            bucket.rrsets.len(),
            bucket.zone,
            api.provider_name()
        );
        written.push(bucket.zone.clone());
    }

    Ok(written)
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

fn is_within(name: &str, zone: &str) -> bool {
    name == zone
        || (name.len() > zone.len()
            && name.ends_with(zone)
            && name.as_bytes()[name.len() - zone.len() - 1] == b'.')
}

fn collapse(rrsets: Vec<RRSet>) -> Vec<RRSet> {
    let mut seen = HashSet::new();
    let mut kept: Vec<RRSet> = rrsets
        .into_iter()
        .rev()
        .filter(|r| seen.insert((r.subname.to_ascii_lowercase(), r.record_type.to_ascii_uppercase())))
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones(names: &[&str]) -> Vec<Zone> {
        names.iter().map(|n| Zone::new(*n)).collect()
    }

    #[test]
    fn subname_strips_zone_and_separator() {
        assert_eq!(subname("www.example.com", "example.com"), "www");
        assert_eq!(subname("a.b.example.com", "example.com"), "a.b");
        assert_eq!(subname("example.com", "example.com"), "");
        assert_eq!(subname("www.example.com.", "example.com"), "www");
    }

    #[test]
    fn longest_suffix_wins_regardless_of_catalog_order() {
        let reconciler = Reconciler::new(&zones(&["example.com", "b.example.com"]));
        assert_eq!(reconciler.resolve_zone("x.b.example.com"), Some("b.example.com"));
        assert_eq!(reconciler.resolve_zone("x.example.com"), Some("example.com"));
        assert_eq!(reconciler.resolve_zone("b.example.com"), Some("b.example.com"));
    }

    #[test]
    fn suffix_must_fall_on_label_boundary() {
        let reconciler = Reconciler::new(&zones(&["example.com"]));
        assert_eq!(reconciler.resolve_zone("notexample.com"), None);
        assert_eq!(reconciler.resolve_zone("WWW.Example.Com."), Some("example.com"));
    }

    #[test]
    fn delete_kind_ignores_targets() {
        let endpoint = Endpoint::new("foo.example.com", "A", ["1.2.3.4"]);
        let rrset = build_rrset("example.com", ChangeKind::Delete, &endpoint);
        assert!(rrset.records.is_empty());
        assert_eq!(rrset.subname, "foo");
    }

    #[test]
    fn configured_ttl_is_kept() {
        let endpoint = Endpoint::new("foo.example.com", "A", ["1.2.3.4"]).with_ttl(60);
        let rrset = build_rrset("example.com", ChangeKind::Create, &endpoint);
        assert_eq!(rrset.ttl, 60);
    }

    #[test]
    fn buckets_follow_catalog_order() {
        let reconciler = Reconciler::new(&zones(&["example.org", "example.com"]));
        let changes = Changes {
            create: vec![
                Endpoint::new("a.example.com", "A", ["1.1.1.1"]),
                Endpoint::new("a.example.org", "A", ["2.2.2.2"]),
            ],
            ..Changes::default()
        };

        let plan = reconciler.plan(&changes);
        let order: Vec<_> = plan.buckets().iter().map(|b| b.zone.as_str()).collect();
        assert_eq!(order, vec!["example.org", "example.com"]);
    }

    #[test]
    fn repeated_name_and_type_are_appended_in_precedence_order() {
        let reconciler = Reconciler::new(&zones(&["example.com"]));
        let changes = Changes {
            update_new: vec![Endpoint::new("www.example.com", "A", ["1.1.1.1"])],
            delete: vec![Endpoint::new("www.example.com", "A", Vec::<String>::new())],
            ..Changes::default()
        };

        let plan = reconciler.plan(&changes);
        let rrsets = &plan.bucket("example.com").unwrap().rrsets;
        assert_eq!(rrsets.len(), 2);
        assert_eq!(rrsets[0].records, vec!["1.1.1.1"]);
        assert!(rrsets[1].records.is_empty());
    }

    #[test]
    fn collapse_keeps_last_entry_per_name_and_type() {
        let reconciler =
            Reconciler::new(&zones(&["example.com"])).with_collapse_duplicates(true);
        let changes = Changes {
            create: vec![
                Endpoint::new("www.example.com", "A", ["1.1.1.1"]),
                Endpoint::new("www.example.com", "TXT", ["\"hello\""]),
            ],
            delete: vec![Endpoint::new("www.example.com", "A", Vec::<String>::new())],
            ..Changes::default()
        };

        let plan = reconciler.plan(&changes);
        let rrsets = &plan.bucket("example.com").unwrap().rrsets;
        assert_eq!(rrsets.len(), 2);
        assert_eq!(rrsets[0].record_type, "TXT");
        assert_eq!(rrsets[1].record_type, "A");
        assert!(rrsets[1].records.is_empty());
    }

    #[test]
    fn unmatched_changes_are_reported_as_skipped() {
        let reconciler = Reconciler::new(&zones(&["example.com"]));
        let changes = Changes {
            delete: vec![Endpoint::new("www.example.org", "CNAME", Vec::<String>::new())],
            ..Changes::default()
        };

        let plan = reconciler.plan(&changes);
        assert!(plan.is_empty());
        assert_eq!(
            plan.skipped(),
            &[SkippedChange {
                kind: ChangeKind::Delete,
                dns_name: "www.example.org".to_string(),
                record_type: "CNAME".to_string(),
            }]
        );
    }
}
