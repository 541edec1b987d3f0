// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage interfaces used by the sync engine and the API.
//!
//! Every operation is scoped by athlete: a record owned by another athlete
//! behaves as if it did not exist and is never modified.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::AppError;
use crate::models::{ActivityRecord, DetailFields, EditableFields, StravaTokens};

/// Hard cap on activities returned by one listing query.
pub const MAX_LIST_LIMIT: u32 = 200;

/// Filters for listing an athlete's activities, newest first.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    /// Exact sport type match
    pub sport_type: Option<String>,
    /// Inclusive lower bound on start time
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on start time
    pub end: Option<DateTime<Utc>>,
    /// Maximum number of results
    pub limit: u32,
}

/// Local activity storage.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Start time of the athlete's most recent stored activity.
    async fn find_most_recent_start(
        &self,
        athlete_id: u64,
    ) -> Result<Option<DateTime<Utc>>, AppError>;

    /// Keys of the athlete's activities starting at or after `after`.
    async fn list_keys_in_window(
        &self,
        athlete_id: u64,
        after: DateTime<Utc>,
    ) -> Result<HashSet<String>, AppError>;

    /// Insert a new record. Fails if the key already exists.
    async fn create_activity(&self, record: &ActivityRecord) -> Result<(), AppError>;

    /// Editable fields of a stored record, or None if absent.
    async fn get_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<Option<EditableFields>, AppError>;

    /// Overwrite only the editable fields of a stored record.
    async fn update_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        fields: &EditableFields,
    ) -> Result<(), AppError>;

    /// Store enrichment results and bump `last_synced_at`.
    async fn update_detail_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        detail: &DetailFields,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Delete the given records. Returns how many were removed.
    async fn bulk_delete(&self, athlete_id: u64, activity_ids: &[String])
        -> Result<usize, AppError>;

    /// List an athlete's activities, newest first.
    async fn list_activities(
        &self,
        athlete_id: u64,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, AppError>;
}

/// Storage for athletes' Strava OAuth tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_tokens(&self, athlete_id: u64) -> Result<Option<StravaTokens>, AppError>;

    async fn set_tokens(&self, athlete_id: u64, tokens: &StravaTokens) -> Result<(), AppError>;
}
