//! Data model shared by the catalog, materializer and reconciler
//!
//! [`Zone`] and [`RRSet`] mirror the provider's wire format. [`Endpoint`]
//! and [`Changes`] are the generic, provider-independent shapes handed to
//! us by the orchestrator that computes desired-vs-actual diffs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A DNS zone the credential may manage
///
/// Timestamps are provider-supplied and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Fully-qualified zone name (e.g. "example.com")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touched: Option<String>,

    /// Lowest TTL the provider accepts in this zone (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_ttl: Option<u32>,
}

impl Zone {
    /// Create a zone with only a name set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: None,
            published: None,
            touched: None,
            minimum_ttl: None,
        }
    }
}

/// A provider-native resource record set
///
/// `name == subname + "." + domain` for a non-empty subname and
/// `name == domain` at the zone apex. An empty `records` list deletes the
/// name+type when submitted in a bulk write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RRSet {
    /// Owning zone name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subname: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: String,

    /// Always serialized: an empty list is meaningful
    #[serde(default)]
    pub records: Vec<String>,

    #[serde(default)]
    pub ttl: u32,

    #[serde(default, skip_serializing)]
    pub created: Option<String>,

    #[serde(default, skip_serializing)]
    pub touched: Option<String>,
}

impl RRSet {
    /// Whether submitting this RRSet deletes the name+type
    pub fn is_deletion(&self) -> bool {
        self.records.is_empty()
    }
}

/// A generic DNS record as understood by the wider orchestration system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub dns_name: String,

    pub record_type: String,

    #[serde(default)]
    pub targets: Vec<String>,

    /// Explicit TTL override; `None` and `Some(0)` both mean unset
    #[serde(default, rename = "recordTTL", skip_serializing_if = "Option::is_none")]
    pub record_ttl: Option<u32>,
}

impl Endpoint {
    /// Create an endpoint without an explicit TTL
    pub fn new<I, S>(dns_name: impl Into<String>, record_type: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dns_name: dns_name.into(),
            record_type: record_type.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            record_ttl: None,
        }
    }

    /// Set an explicit TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = Some(ttl);
        self
    }

    /// The TTL override, if one is actually configured
    pub fn configured_ttl(&self) -> Option<u32> {
        self.record_ttl.filter(|ttl| *ttl > 0)
    }
}

/// Kind of a change, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// A change set computed by the external orchestrator
///
/// `update_old` carries the previous side of each update. It is kept so a
/// change document round-trips, but only `update_new` is ever written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes {
    #[serde(default)]
    pub create: Vec<Endpoint>,

    #[serde(default)]
    pub update_old: Vec<Endpoint>,

    #[serde(default)]
    pub update_new: Vec<Endpoint>,

    #[serde(default)]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Create an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there is nothing to write
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update_new.is_empty() && self.delete.is_empty()
    }

    /// Number of changes that will be considered for writing
    pub fn len(&self) -> usize {
        self.create.len() + self.update_new.len() + self.delete.len()
    }

    /// Iterate changes in precedence order: creates, updates, then deletions
    pub fn in_precedence_order(&self) -> impl Iterator<Item = (ChangeKind, &Endpoint)> {
        self.create
            .iter()
            .map(|ep| (ChangeKind::Create, ep))
            .chain(self.update_new.iter().map(|ep| (ChangeKind::Update, ep)))
            .chain(self.delete.iter().map(|ep| (ChangeKind::Delete, ep)))
    }
}
