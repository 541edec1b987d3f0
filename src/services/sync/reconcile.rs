// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciliation of a fetched window against the stored activity keys.
//!
//! Items are processed one at a time in fetch order. Each fetched summary
//! ends up in exactly one of created, updated, skipped or errors; a failure
//! on one item is counted and the loop moves on. Stored keys in the window
//! that were not fetched are deleted, unless the fetch was truncated.

use chrono::Utc;
use std::collections::HashSet;

use crate::db::ActivityStore;
use crate::error::AppError;
use crate::models::{ActivityRecord, StravaActivitySummary};
use crate::services::sync::enrich::enrich_activity;
use crate::services::sync::{ActivitySource, FetchedWindow, SyncOptions};

/// Outcome counts of one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub created: u32,
    pub updated: u32,
    pub deleted: u32,
    pub skipped: u32,
    pub errors: u32,
    pub total: u32,
    pub deletion_skipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Created,
    Updated,
    Skipped,
}

/// Applies fetched summaries to the store.
pub struct Reconciler<'a> {
    source: &'a dyn ActivitySource,
    store: &'a dyn ActivityStore,
    options: &'a SyncOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        source: &'a dyn ActivitySource,
        store: &'a dyn ActivityStore,
        options: &'a SyncOptions,
    ) -> Self {
        Self {
            source,
            store,
            options,
        }
    }

    /// Reconcile `fetched` against `existing_keys`, the stored keys in the
    /// window as of before the fetch.
    ///
    /// Only a bulk delete failure is returned as an error.
    pub async fn reconcile(
        &self,
        athlete_id: u64,
        fetched: &FetchedWindow,
        existing_keys: &HashSet<String>,
    ) -> Result<SyncCounts, AppError> {
        let mut counts = SyncCounts {
            total: fetched.activities.len() as u32,
            ..SyncCounts::default()
        };
        let mut seen_keys = HashSet::with_capacity(fetched.activities.len());

        for summary in &fetched.activities {
            let key = summary.key();
            let is_new = !existing_keys.contains(&key);

            match self.process(athlete_id, summary, is_new).await {
                Ok(ItemOutcome::Created) => counts.created += 1,
                Ok(ItemOutcome::Updated) => counts.updated += 1,
                Ok(ItemOutcome::Skipped) => counts.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        athlete_id,
                        activity_id = %key,
                        is_new,
                        error = %e,
                        "Failed to sync activity"
                    );
                    counts.errors += 1;
                }
            }

            seen_keys.insert(key);
        }

        let mut deleted_keys: Vec<String> =
            existing_keys.difference(&seen_keys).cloned().collect();

        if !deleted_keys.is_empty() {
            if fetched.truncated {
                tracing::warn!(
                    athlete_id,
                    unseen = deleted_keys.len(),
                    "Fetch was truncated, not inferring deletions"
                );
                counts.deletion_skipped = true;
            } else {
                deleted_keys.sort();
                let removed = self.store.bulk_delete(athlete_id, &deleted_keys).await?;
                if removed != deleted_keys.len() {
                    tracing::debug!(
                        athlete_id,
                        requested = deleted_keys.len(),
                        removed,
                        "Some deleted activities were already gone"
                    );
                }
                counts.deleted = deleted_keys.len() as u32;
            }
        }

        Ok(counts)
    }

    async fn process(
        &self,
        athlete_id: u64,
        summary: &StravaActivitySummary,
        is_new: bool,
    ) -> Result<ItemOutcome, AppError> {
        if summary.athlete.id != athlete_id {
            return Err(AppError::BadRequest(format!(
                "Activity {} belongs to athlete {}",
                summary.id, summary.athlete.id
            )));
        }

        if is_new {
            self.create(athlete_id, summary).await
        } else {
            self.update(athlete_id, summary).await
        }
    }

    async fn create(
        &self,
        athlete_id: u64,
        summary: &StravaActivitySummary,
    ) -> Result<ItemOutcome, AppError> {
        let record = ActivityRecord::from_summary(summary, Utc::now());
        self.store.create_activity(&record).await?;

        if self.options.needs_detail(&summary.sport_type) {
            enrich_activity(self.source, self.store, athlete_id, &record.id).await?;

            if !self.options.request_delay.is_zero() {
                tokio::time::sleep(self.options.request_delay).await;
            }
        }

        Ok(ItemOutcome::Created)
    }

    async fn update(
        &self,
        athlete_id: u64,
        summary: &StravaActivitySummary,
    ) -> Result<ItemOutcome, AppError> {
        let key = summary.key();
        let stored = self
            .store
            .get_editable_fields(athlete_id, &key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} disappeared", key)))?;

        let incoming = summary.editable_fields();
        if stored == incoming {
            return Ok(ItemOutcome::Skipped);
        }

        tracing::debug!(
            athlete_id,
            activity_id = %key,
            changed = ?stored.changed_fields(&incoming),
            "Activity edited upstream"
        );

        self.store
            .update_editable_fields(athlete_id, &key, &incoming)
            .await?;

        Ok(ItemOutcome::Updated)
    }
}
