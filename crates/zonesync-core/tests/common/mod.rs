//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides a scripted in-memory [`ZoneApi`] that records every
//! call made against it.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use zonesync_core::error::{Error, Result};
use zonesync_core::{Changes, Endpoint, RRSet, RequestContext, Zone, ZoneApi};

/// One recorded bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub zone: String,
    pub rrsets: Vec<RRSet>,
}

#[derive(Default)]
struct Inner {
    zones: Vec<Zone>,
    rrsets: HashMap<String, Vec<RRSet>>,
    failing_lists: HashSet<String>,
    failing_writes: HashMap<String, String>,
    list_zone_calls: usize,
    list_rrset_calls: Vec<String>,
    writes: Vec<WriteCall>,
}

/// A scripted ZoneApi that tracks calls
///
/// Clones share state, so a test can keep a handle after boxing one copy
/// into an engine.
#[derive(Clone, Default)]
pub struct RecordingZoneApi {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingZoneApi {
    pub fn with_zones(names: &[&str]) -> Self {
        let api = Self::default();
        api.inner.lock().unwrap().zones = names.iter().map(|n| Zone::new(*n)).collect();
        api
    }

    /// Serve `rrsets` for `zone` on the read path
    pub fn serve_rrsets(&self, zone: &str, rrsets: Vec<RRSet>) {
        self.inner
            .lock()
            .unwrap()
            .rrsets
            .insert(zone.to_string(), rrsets);
    }

    /// Make `list_rrsets` for `zone` fail
    pub fn fail_listing(&self, zone: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_lists
            .insert(zone.to_string());
    }

    /// Make the bulk write for `zone` fail with a provider body
    pub fn fail_write(&self, zone: &str, body: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_writes
            .insert(zone.to_string(), body.to_string());
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.inner.lock().unwrap().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().writes.len()
    }

    pub fn list_zone_calls(&self) -> usize {
        self.inner.lock().unwrap().list_zone_calls
    }

    pub fn list_rrset_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().list_rrset_calls.clone()
    }
}

#[async_trait]
impl ZoneApi for RecordingZoneApi {
    async fn list_zones(&self, ctx: &RequestContext) -> Result<Vec<Zone>> {
        ctx.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.list_zone_calls += 1;
        Ok(inner.zones.clone())
    }

    async fn list_rrsets(&self, ctx: &RequestContext, zone: &str) -> Result<Vec<RRSet>> {
        ctx.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.list_rrset_calls.push(zone.to_string());

        let path = format!("/domains/{}/rrsets/", zone);
        if inner.failing_lists.contains(zone) {
            return Err(Error::provider("GET", path, 500, "internal error"));
        }
        Ok(inner.rrsets.get(zone).cloned().unwrap_or_default())
    }

    async fn bulk_write_rrsets(
        &self,
        ctx: &RequestContext,
        zone: &str,
        rrsets: &[RRSet],
    ) -> Result<Vec<RRSet>> {
        ctx.check()?;
        let mut inner = self.inner.lock().unwrap();
        inner.writes.push(WriteCall {
            zone: zone.to_string(),
            rrsets: rrsets.to_vec(),
        });

        if let Some(body) = inner.failing_writes.get(zone) {
            let path = format!("/domains/{}/rrsets/", zone);
            return Err(Error::validation("PUT", path, body.clone()));
        }
        Ok(rrsets.to_vec())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A provider-side RRSet as returned by a listing
pub fn listed(zone: &str, subname: &str, record_type: &str, records: &[&str], ttl: u32) -> RRSet {
    let name = if subname.is_empty() {
        format!("{}.", zone)
    } else {
        format!("{}.{}.", subname, zone)
    };
    RRSet {
        domain: zone.to_string(),
        subname: subname.to_string(),
        name,
        record_type: record_type.to_string(),
        records: records.iter().map(|r| r.to_string()).collect(),
        ttl,
        created: Some("2024-01-01T00:00:00Z".to_string()),
        touched: Some("2024-01-01T00:00:00Z".to_string()),
    }
}

pub fn create(name: &str, record_type: &str, targets: &[&str]) -> Changes {
    Changes {
        create: vec![Endpoint::new(name, record_type, targets.iter().copied())],
        ..Changes::default()
    }
}

pub fn delete(name: &str, record_type: &str) -> Changes {
    Changes {
        delete: vec![Endpoint::new(name, record_type, Vec::<String>::new())],
        ..Changes::default()
    }
}
