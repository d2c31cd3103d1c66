//! Contract Test: Read Path
//!
//! Constraints verified:
//! - Records are reported in zone order, then RRSet order
//! - Unsupported record types are skipped silently
//! - Only managed zones are read
//! - Any zone's fetch failure aborts the whole read
//! - Zones are re-fetched on every pass

mod common;

use common::*;
use zonesync_core::{DomainFilter, Error, RequestContext, SupportedTypes, SyncConfig, SyncEngine};

#[tokio::test]
async fn records_concatenate_zones_in_catalog_order() {
    let api = RecordingZoneApi::with_zones(&["example.org", "example.com"]);
    api.serve_rrsets(
        "example.org",
        vec![listed("example.org", "", "TXT", &["\"v=spf1 -all\""], 3600)],
    );
    api.serve_rrsets(
        "example.com",
        vec![
            listed("example.com", "", "SOA", &["ns1.desec.io. ..."], 300),
            listed("example.com", "www", "A", &["1.2.3.4"], 60),
            listed("example.com", "www", "AAAA", &["::1"], 60),
        ],
    );

    let (engine, _events) = SyncEngine::new(Box::new(api.clone()), SyncConfig::default()).unwrap();
    let endpoints = engine.records(&RequestContext::new()).await.unwrap();

    let names: Vec<(&str, &str)> = endpoints
        .iter()
        .map(|e| (e.dns_name.as_str(), e.record_type.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("example.org.", "TXT"),
            ("www.example.com.", "A"),
            ("www.example.com.", "AAAA"),
        ]
    );
    assert_eq!(endpoints[1].record_ttl, Some(60));
    assert_eq!(endpoints[1].targets, vec!["1.2.3.4"]);
}

#[tokio::test]
async fn supported_types_are_configurable() {
    let api = RecordingZoneApi::with_zones(&["example.com"]);
    api.serve_rrsets(
        "example.com",
        vec![
            listed("example.com", "", "CAA", &["0 issue \"letsencrypt.org\""], 3600),
            listed("example.com", "www", "A", &["1.2.3.4"], 3600),
        ],
    );

    let config = SyncConfig {
        supported_types: SupportedTypes::new(["CAA"]),
        ..SyncConfig::default()
    };
    let (engine, _events) = SyncEngine::new(Box::new(api.clone()), config).unwrap();
    let endpoints = engine.records(&RequestContext::new()).await.unwrap();

    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].record_type, "CAA");
}

#[tokio::test]
async fn only_managed_zones_are_read() {
    let api = RecordingZoneApi::with_zones(&["example.com", "private.net"]);
    let config = SyncConfig::default().with_domain_filter(DomainFilter::new(["example.com"]));

    let (engine, _events) = SyncEngine::new(Box::new(api.clone()), config).unwrap();
    engine.records(&RequestContext::new()).await.unwrap();

    assert_eq!(api.list_rrset_calls(), vec!["example.com".to_string()]);
}

#[tokio::test]
async fn single_zone_failure_aborts_read() {
    let api = RecordingZoneApi::with_zones(&["one.test", "two.test", "three.test"]);
    api.serve_rrsets("one.test", vec![listed("one.test", "a", "A", &["1.1.1.1"], 60)]);
    api.fail_listing("two.test");

    let (engine, _events) = SyncEngine::new(Box::new(api.clone()), SyncConfig::default()).unwrap();
    let err = engine
        .records(&RequestContext::new())
        .await
        .expect_err("two.test fails");

    assert!(matches!(err, Error::Provider { status: 500, .. }));
    assert_eq!(
        api.list_rrset_calls(),
        vec!["one.test".to_string(), "two.test".to_string()]
    );
}

#[tokio::test]
async fn zones_are_fetched_fresh_every_pass() {
    let api = RecordingZoneApi::with_zones(&["example.com"]);
    let (engine, _events) = SyncEngine::new(Box::new(api.clone()), SyncConfig::default()).unwrap();
    let ctx = RequestContext::new();

    engine.records(&ctx).await.unwrap();
    engine
        .apply_changes(&ctx, &create("www.example.com", "A", &["1.2.3.4"]))
        .await
        .unwrap();
    engine.managed_zones(&ctx).await.unwrap();

    assert_eq!(api.list_zone_calls(), 3);
}
