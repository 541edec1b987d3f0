// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local development and tests.
//!
//! Mirrors the Firestore semantics the sync engine relies on: create rejects
//! existing keys, partial updates touch only their fields, and every
//! operation is scoped by athlete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::store::{ActivityQuery, ActivityStore, TokenStore, MAX_LIST_LIMIT};
use crate::error::AppError;
use crate::models::{ActivityRecord, DetailFields, EditableFields, StravaTokens};

/// Activity and token storage backed by concurrent maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    activities: Arc<DashMap<String, ActivityRecord>>,
    tokens: Arc<DashMap<u64, StravaTokens>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record directly (seeding).
    pub fn put(&self, record: ActivityRecord) {
        self.activities.insert(record.id.clone(), record);
    }

    /// Snapshot of a stored record.
    pub fn get(&self, activity_id: &str) -> Option<ActivityRecord> {
        self.activities.get(activity_id).map(|r| r.clone())
    }

    /// Number of stored activities across all athletes.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    fn not_found(athlete_id: u64, activity_id: &str) -> AppError {
        AppError::NotFound(format!(
            "Activity {} for athlete {}",
            activity_id, athlete_id
        ))
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn find_most_recent_start(
        &self,
        athlete_id: u64,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        Ok(self
            .activities
            .iter()
            .filter(|r| r.athlete_id == athlete_id)
            .map(|r| r.start_date)
            .max())
    }

    async fn list_keys_in_window(
        &self,
        athlete_id: u64,
        after: DateTime<Utc>,
    ) -> Result<HashSet<String>, AppError> {
        let after_ts = after.timestamp();
        Ok(self
            .activities
            .iter()
            .filter(|r| r.athlete_id == athlete_id && r.start_ts >= after_ts)
            .map(|r| r.id.clone())
            .collect())
    }

    async fn create_activity(&self, record: &ActivityRecord) -> Result<(), AppError> {
        use dashmap::mapref::entry::Entry;

        match self.activities.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Database(format!(
                "Activity {} already exists",
                record.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<Option<EditableFields>, AppError> {
        Ok(self
            .activities
            .get(activity_id)
            .filter(|r| r.athlete_id == athlete_id)
            .map(|r| r.editable_fields()))
    }

    async fn update_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        fields: &EditableFields,
    ) -> Result<(), AppError> {
        match self.activities.get_mut(activity_id) {
            Some(mut record) if record.athlete_id == athlete_id => {
                record.apply_editable_fields(fields);
                Ok(())
            }
            _ => Err(Self::not_found(athlete_id, activity_id)),
        }
    }

    async fn update_detail_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        detail: &DetailFields,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        match self.activities.get_mut(activity_id) {
            Some(mut record) if record.athlete_id == athlete_id => {
                record.detail = Some(detail.clone());
                record.last_synced_at = synced_at;
                Ok(())
            }
            _ => Err(Self::not_found(athlete_id, activity_id)),
        }
    }

    async fn bulk_delete(
        &self,
        athlete_id: u64,
        activity_ids: &[String],
    ) -> Result<usize, AppError> {
        Ok(activity_ids
            .iter()
            .filter(|id| {
                self.activities
                    .remove_if(id.as_str(), |_, r| r.athlete_id == athlete_id)
                    .is_some()
            })
            .count())
    }

    async fn list_activities(
        &self,
        athlete_id: u64,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let start_ts = query.start.map(|d| d.timestamp());
        let end_ts = query.end.map(|d| d.timestamp());

        let mut records: Vec<ActivityRecord> = self
            .activities
            .iter()
            .filter(|r| r.athlete_id == athlete_id)
            .filter(|r| {
                query
                    .sport_type
                    .as_deref()
                    .is_none_or(|s| r.sport_type == s)
            })
            .filter(|r| start_ts.is_none_or(|ts| r.start_ts >= ts))
            .filter(|r| end_ts.is_none_or(|ts| r.start_ts <= ts))
            .map(|r| r.clone())
            .collect();

        records.sort_by(|a, b| b.start_ts.cmp(&a.start_ts).then_with(|| b.id.cmp(&a.id)));
        records.truncate(query.limit.min(MAX_LIST_LIMIT) as usize);
        Ok(records)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get_tokens(&self, athlete_id: u64) -> Result<Option<StravaTokens>, AppError> {
        Ok(self.tokens.get(&athlete_id).map(|t| t.clone()))
    }

    async fn set_tokens(&self, athlete_id: u64, tokens: &StravaTokens) -> Result<(), AppError> {
        self.tokens.insert(athlete_id, tokens.clone());
        Ok(())
    }
}
