//! Sync engine
//!
//! The SyncEngine is responsible for:
//! - Building the managed zone catalog for each pass
//! - Reporting current records (read path)
//! - Planning and submitting change sets (write path)
//! - Honoring dry-run mode
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!   Changes ──────────▶│  SyncEngine  │──── SyncEvent ───▶ (monitoring)
//!                      └──────────────┘
//!                             │
//!         ┌───────────────────┼────────────────────┐
//!         ▼                   ▼                    ▼
//! ┌──────────────┐    ┌──────────────┐    ┌────────────────┐
//! │ ZoneCatalog  │    │  Reconciler  │    │    ZoneApi     │
//! │ (filter)     │    │  (buckets)   │    │ (bulk write)   │
//! └──────────────┘    └──────────────┘    └────────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Fetch zones, keep the managed ones
//! 2. Bucket changes per zone
//! 3. One bulk write per non-empty bucket (skipped in dry-run)
//! 4. Abort on the first failed write

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::catalog::ZoneCatalog;
use crate::config::SyncConfig;
use crate::context::RequestContext;
use crate::error::Result;
use crate::materializer::materialize;
use crate::model::{Changes, Endpoint, Zone};
use crate::reconciler::{self, Reconciler, SkippedChange, WritePlan};
use crate::traits::ZoneApi;

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A write pass started
    PassStarted { changes: usize, zones: usize },

    /// A change matched no managed zone
    ChangeSkipped(SkippedChange),

    /// A zone's bucket was submitted
    ZoneWritten { zone: String, rrsets: usize },

    /// A zone's bulk write failed; the pass is aborted
    ZoneWriteFailed { zone: String, error: String },

    /// Dry-run: a bucket would have been submitted
    DryRunPlanned { zone: String, rrsets: usize },

    /// A write pass completed
    PassFinished { zones_written: usize },
}

/// Outcome of a successful write pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Zones written (or planned, in dry-run), in submission order
    pub zones: Vec<String>,

    /// RRSets submitted across all zones
    pub rrsets: usize,

    /// Changes outside every managed zone
    pub skipped: Vec<SkippedChange>,

    pub dry_run: bool,
}

/// Reconciliation engine bound to one provider
///
/// Each call is an independent pass: zones are re-fetched every time and no
/// state is kept between calls.
pub struct SyncEngine {
    api: Box<dyn ZoneApi>,

    config: SyncConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields sync events
    pub fn new(
        api: Box<dyn ZoneApi>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        if config.dry_run {
            warn!(
                "{} sync engine running in DRY-RUN mode - no changes will be made",
                api.provider_name()
            );
        }

        let engine = Self {
            api,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Zones this engine may manage, in provider order
    pub async fn managed_zones(&self, ctx: &RequestContext) -> Result<Vec<Zone>> {
        ZoneCatalog::new(self.api.as_ref(), &self.config.domain_filter)
            .list_managed_zones(ctx)
            .await
    }

    /// Current records of every managed zone as endpoints
    ///
    /// Zone order, then RRSet order within each zone. Any zone's fetch
    /// failure aborts the whole read.
    pub async fn records(&self, ctx: &RequestContext) -> Result<Vec<Endpoint>> {
        let zones = self.managed_zones(ctx).await?;

        let mut endpoints = Vec::new();
        for zone in &zones {
            let rrsets = self.api.list_rrsets(ctx, &zone.name).await?;
            let materialized = materialize(zone, &rrsets, &self.config.supported_types);
            debug!(
                "Zone {}: {} rrset(s), {} endpoint(s)",
                zone.name,
                rrsets.len(),
                materialized.len()
            );
            endpoints.extend(materialized);
        }

        debug!(
            "Endpoints generated from {}: {}",
            self.api.provider_name(),
            endpoints.len()
        );

        Ok(endpoints)
    }

    /// Bucket `changes` against the current managed zones without writing
    pub async fn plan_changes(&self, ctx: &RequestContext, changes: &Changes) -> Result<WritePlan> {
        let zones = self.managed_zones(ctx).await?;
        Ok(self.reconciler(&zones).plan(changes))
    }

    /// Run one reconciliation pass
    ///
    /// Fails with [`Error::Write`](crate::Error::Write) on the first zone
    /// whose bulk write fails. Zones written before the failure stay written.
    pub async fn apply_changes(
        &self,
        ctx: &RequestContext,
        changes: &Changes,
    ) -> Result<PassReport> {
        debug!(
            "Changes for {}: {} create, {} update, {} delete",
            self.api.provider_name(),
            changes.create.len(),
            changes.update_new.len(),
            changes.delete.len()
        );

        let zones = self.managed_zones(ctx).await?;
        self.emit_event(SyncEvent::PassStarted {
            changes: changes.len(),
            zones: zones.len(),
        });

        let plan = self.reconciler(&zones).plan(changes);
        for skipped in plan.skipped() {
            self.emit_event(SyncEvent::ChangeSkipped(skipped.clone()));
        }

        let mut report = PassReport {
            zones: Vec::with_capacity(plan.buckets().len()),
            rrsets: 0,
            skipped: plan.skipped().to_vec(),
            dry_run: self.config.dry_run,
        };

        for bucket in plan.buckets() {
            if self.config.dry_run {
                info!(
                    "[DRY-RUN] Would send PUT for zone {} with payload: {}",
                    bucket.zone,
                    serde_json::to_string(&bucket.rrsets)?
                );
                self.emit_event(SyncEvent::DryRunPlanned {
                    zone: bucket.zone.clone(),
                    rrsets: bucket.rrsets.len(),
                });
            } else {
                if let Err(e) = reconciler::write_bucket(self.api.as_ref(), ctx, bucket).await {
                    error!("Bulk write for zone {} failed: {}", bucket.zone, e);
                    self.emit_event(SyncEvent::ZoneWriteFailed {
                        zone: bucket.zone.clone(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                info!(
                    "Updated zone {}: {} rrset(s)",
                    bucket.zone,
                    bucket.rrsets.len()
                );
                self.emit_event(SyncEvent::ZoneWritten {
                    zone: bucket.zone.clone(),
                    rrsets: bucket.rrsets.len(),
                });
            }

            report.zones.push(bucket.zone.clone());
            report.rrsets += bucket.rrsets.len();
        }

        info!(
            "Pass finished: {} zone(s), {} rrset(s), {} skipped{}",
            report.zones.len(),
            report.rrsets,
            report.skipped.len(),
            if report.dry_run { " [DRY-RUN]" } else { "" }
        );
        self.emit_event(SyncEvent::PassFinished {
            zones_written: if report.dry_run { 0 } else { report.zones.len() },
        });

        Ok(report)
    }

    fn reconciler(&self, zones: &[Zone]) -> Reconciler {
        Reconciler::new(zones).with_collapse_duplicates(self.config.collapse_duplicates)
    }

    fn emit_event(&self, event: SyncEvent) {
        // Full channel: drop rather than block the pass
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
