// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental activity sync.
//!
//! One run resolves a fetch window from the newest stored activity, pulls
//! every page of summaries in that window, and reconciles them against the
//! keys already stored: new activities are created (and enriched when their
//! sport needs detail), edited ones get their editable fields patched, and
//! stored keys missing from the fetch are deleted.

pub mod enrich;
pub mod fetcher;
pub mod reconcile;
pub mod watermark;

pub use self::fetcher::FetchedWindow;
pub use self::reconcile::{Reconciler, SyncCounts};
pub use self::watermark::SyncWindow;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::db::ActivityStore;
use crate::error::AppError;
use crate::models::{StravaActivityDetail, StravaActivitySummary, StravaActivityZone};

/// Upper bound accepted for either day count in a sync request.
pub const MAX_SYNC_DAYS: i64 = 3650;

/// Remote source of truth for an athlete's activities.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// One page (1-indexed) of summaries starting at or after `after`
    /// (Unix seconds). An empty page means there are no more.
    async fn list_activities(
        &self,
        athlete_id: u64,
        after: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError>;

    async fn get_activity_detail(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<StravaActivityDetail, AppError>;

    async fn get_activity_zones(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<Vec<StravaActivityZone>, AppError>;
}

/// Tunables for sync runs.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Look-back for an athlete with nothing stored yet
    pub initial_sync_days: i64,
    /// Margin re-scanned before the newest stored activity
    pub edit_scan_window_days: i64,
    /// Summaries requested per page
    pub per_page: u32,
    /// Page ceiling; hitting it truncates the fetch
    pub max_pages: u32,
    /// Pause after each enrichment to stay under the Strava rate limit
    pub request_delay: Duration,
    /// Sport types that get detail and zone enrichment
    pub detail_sport_types: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            initial_sync_days: 30,
            edit_scan_window_days: 7,
            per_page: 200,
            max_pages: 5,
            request_delay: Duration::from_millis(100),
            detail_sport_types: ["Run", "Ride", "Swim", "WeightTraining"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SyncOptions {
    pub fn needs_detail(&self, sport_type: &str) -> bool {
        self.detail_sport_types.iter().any(|s| s == sport_type)
    }
}

/// Per-run overrides supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRequest {
    pub initial_sync_days: Option<i64>,
    pub edit_scan_window_days: Option<i64>,
}

impl SyncRequest {
    /// Reject day counts outside `1..=MAX_SYNC_DAYS`.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [
            ("initial_sync_days", self.initial_sync_days),
            ("edit_scan_window_days", self.edit_scan_window_days),
        ] {
            if let Some(days) = value {
                if !(1..=MAX_SYNC_DAYS).contains(&days) {
                    return Err(AppError::BadRequest(format!(
                        "{} must be between 1 and {}",
                        name, MAX_SYNC_DAYS
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Result of a completed sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncReport {
    pub success: bool,
    pub created: u32,
    pub updated: u32,
    pub deleted: u32,
    pub skipped: u32,
    pub errors: u32,
    /// Summaries fetched from Strava
    pub total: u32,
    /// The page ceiling was hit, so the fetched set may be incomplete
    pub truncated: bool,
    /// Deletions were not inferred because the fetch was truncated
    pub deletion_skipped: bool,
    /// Lower bound of the scanned window
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub window_start: DateTime<Utc>,
}

impl SyncReport {
    fn new(counts: SyncCounts, window: &SyncWindow, truncated: bool) -> Self {
        Self {
            success: true,
            created: counts.created,
            updated: counts.updated,
            deleted: counts.deleted,
            skipped: counts.skipped,
            errors: counts.errors,
            total: counts.total,
            truncated,
            deletion_skipped: counts.deletion_skipped,
            window_start: window.after,
        }
    }
}

/// Per-athlete single-flight locks for sync runs.
pub type RunLocks = Arc<DashMap<u64, Arc<Mutex<()>>>>;

/// Runs incremental syncs for one source/store pair.
#[derive(Clone)]
pub struct SyncEngine {
    source: Arc<dyn ActivitySource>,
    store: Arc<dyn ActivityStore>,
    options: SyncOptions,
    run_locks: RunLocks,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn ActivitySource>,
        store: Arc<dyn ActivityStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            store,
            options,
            run_locks: RunLocks::default(),
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run one sync for `athlete_id`.
    ///
    /// Fails with `Conflict` if a run for the same athlete is in progress.
    /// Window, key snapshot, page fetch and bulk delete failures abort the
    /// run; per-activity failures are counted in the report instead.
    pub async fn run(&self, athlete_id: u64, request: SyncRequest) -> Result<SyncReport, AppError> {
        let initial_sync_days = request
            .initial_sync_days
            .unwrap_or(self.options.initial_sync_days);
        let edit_scan_window_days = request
            .edit_scan_window_days
            .unwrap_or(self.options.edit_scan_window_days);

        // Merged values, so out-of-range defaults are rejected too
        SyncRequest {
            initial_sync_days: Some(initial_sync_days),
            edit_scan_window_days: Some(edit_scan_window_days),
        }
        .validate()?;

        let lock = self
            .run_locks
            .entry(athlete_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.try_lock_owned().map_err(|_| {
            AppError::Conflict(format!("Sync already running for athlete {}", athlete_id))
        })?;

        let window = watermark::resolve_window(
            self.store.as_ref(),
            athlete_id,
            initial_sync_days,
            edit_scan_window_days,
            Utc::now(),
        )
        .await?;

        tracing::info!(
            athlete_id,
            after = %window.after,
            initial = window.initial,
            "Starting activity sync"
        );

        // Snapshot before fetching; classification and deletion use this set only
        let existing_keys = self
            .store
            .list_keys_in_window(athlete_id, window.after)
            .await?;

        let fetched = fetcher::fetch_window(
            self.source.as_ref(),
            athlete_id,
            window.after.timestamp(),
            self.options.per_page,
            self.options.max_pages,
        )
        .await?;

        let reconciler = Reconciler::new(self.source.as_ref(), self.store.as_ref(), &self.options);
        let counts = reconciler
            .reconcile(athlete_id, &fetched, &existing_keys)
            .await?;

        let report = SyncReport::new(counts, &window, fetched.truncated);

        tracing::info!(
            athlete_id,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            skipped = report.skipped,
            errors = report.errors,
            total = report.total,
            truncated = report.truncated,
            deletion_skipped = report.deletion_skipped,
            "Activity sync complete"
        );

        Ok(report)
    }
}
