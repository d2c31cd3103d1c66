//! Record materializer
//!
//! Turns provider RRSet listings into generic [`Endpoint`]s for read-path
//! reporting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::model::{Endpoint, RRSet, Zone};

/// Record types understood by the wider orchestration system by default
pub const DEFAULT_SUPPORTED_TYPES: &[&str] =
    &["A", "AAAA", "CNAME", "SRV", "TXT", "NS", "PTR", "MX", "NAPTR"];

/// Explicit set of supported record-type tags
///
/// Membership is case-insensitive; tags are stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SupportedTypes(BTreeSet<String>);

impl SupportedTypes {
    /// Create a set from type tags
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            types
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, record_type: &str) -> bool {
        self.0.contains(&record_type.to_ascii_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for SupportedTypes {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORTED_TYPES)
    }
}

impl From<Vec<String>> for SupportedTypes {
    fn from(types: Vec<String>) -> Self {
        Self::new(types)
    }
}

impl From<SupportedTypes> for Vec<String> {
    fn from(types: SupportedTypes) -> Self {
        types.0.into_iter().collect()
    }
}

/// Convert one zone's RRSets into endpoints
///
/// Unsupported types are skipped silently. Names, TTLs and record values are
/// carried over verbatim, in RRSet order.
pub fn materialize(zone: &Zone, rrsets: &[RRSet], supported: &SupportedTypes) -> Vec<Endpoint> {
    rrsets
        .iter()
        .filter(|rrset| {
            let keep = supported.contains(&rrset.record_type);
            if !keep {
                debug!(
                    "Skipping unsupported {} rrset {} in zone {}",
                    rrset.record_type, rrset.name, zone.name
                );
            }
            keep
        })
        .map(|rrset| Endpoint {
            dns_name: rrset.name.clone(),
            record_type: rrset.record_type.clone(),
            targets: rrset.records.clone(),
            record_ttl: Some(rrset.ttl),
        })
        .collect()
}
