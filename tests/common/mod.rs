// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stride_sync::config::Config;
use stride_sync::db::{ActivityQuery, ActivityStore, FirestoreDb, MemoryStore};
use stride_sync::error::AppError;
use stride_sync::models::{
    ActivityRecord, DetailFields, EditableFields, StravaActivityDetail, StravaActivitySummary,
    StravaActivityZone,
};
use stride_sync::routes::create_router;
use stride_sync::services::{ActivitySource, SyncEngine, SyncOptions};
use stride_sync::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[allow(dead_code)]
pub fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid RFC3339")
        .with_timezone(&Utc)
}

/// Build a Strava summary with the given identity; other fields defaulted.
#[allow(dead_code)]
pub fn summary(id: u64, athlete_id: u64, name: &str, sport_type: &str, start: &str) -> StravaActivitySummary {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "athlete": {"id": athlete_id},
        "name": name,
        "sport_type": sport_type,
        "start_date": start,
        "distance": 5000.0,
        "moving_time": 1500,
        "elapsed_time": 1600,
    }))
    .expect("valid summary")
}

/// Stored record equivalent to what a sync would have created.
#[allow(dead_code)]
pub fn record(id: u64, athlete_id: u64, name: &str, sport_type: &str, start: &str) -> ActivityRecord {
    ActivityRecord::from_summary(&summary(id, athlete_id, name, sport_type, start), Utc::now())
}

#[allow(dead_code)]
pub fn heartrate_zone() -> StravaActivityZone {
    serde_json::from_value(serde_json::json!({
        "type": "heartrate",
        "sensor_based": true,
        "distribution_buckets": [{"min": 0, "max": 140, "time": 600}, {"min": 140, "max": -1, "time": 900}]
    }))
    .expect("valid zone")
}

/// In-memory activity source with switchable failures.
///
/// `list_activities` returns stored summaries starting at or after `after`,
/// sliced into pages, in insertion order.
#[derive(Default)]
pub struct FakeSource {
    activities: Mutex<Vec<StravaActivitySummary>>,
    failing_details: Mutex<HashSet<String>>,
    pub fail_zones: AtomicBool,
    pub fail_listing: AtomicBool,
    pub list_calls: Mutex<Vec<(i64, u32, u32)>>,
    pub detail_calls: AtomicUsize,
    pub zone_calls: AtomicUsize,
    /// Notified on every page request
    pub listing_entered: tokio::sync::Notify,
    /// Held by a test to stall page requests
    pub listing_gate: tokio::sync::Mutex<()>,
}

#[allow(dead_code)]
impl FakeSource {
    pub fn new(activities: Vec<StravaActivitySummary>) -> Arc<Self> {
        let source = Self::default();
        *source.activities.lock().unwrap() = activities;
        Arc::new(source)
    }

    pub fn set_activities(&self, activities: Vec<StravaActivitySummary>) {
        *self.activities.lock().unwrap() = activities;
    }

    /// Apply `f` to the upstream summary with `id`.
    pub fn edit(&self, id: u64, f: impl FnOnce(&mut StravaActivitySummary)) {
        let mut activities = self.activities.lock().unwrap();
        let summary = activities
            .iter_mut()
            .find(|a| a.id == id)
            .expect("activity exists upstream");
        f(summary);
    }

    pub fn remove(&self, id: u64) {
        self.activities.lock().unwrap().retain(|a| a.id != id);
    }

    pub fn fail_detail_for(&self, activity_id: &str) {
        self.failing_details
            .lock()
            .unwrap()
            .insert(activity_id.to_string());
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.list_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, page, _)| *page)
            .collect()
    }
}

#[async_trait]
impl ActivitySource for FakeSource {
    async fn list_activities(
        &self,
        _athlete_id: u64,
        after: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        self.listing_entered.notify_one();
        let _gate = self.listing_gate.lock().await;

        self.list_calls.lock().unwrap().push((after, page, per_page));

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
        }

        let in_window: Vec<StravaActivitySummary> = self
            .activities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.start_date.timestamp() >= after)
            .cloned()
            .collect();

        let start = ((page - 1) * per_page) as usize;
        Ok(in_window
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect())
    }

    async fn get_activity_detail(
        &self,
        _athlete_id: u64,
        activity_id: &str,
    ) -> Result<StravaActivityDetail, AppError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_details.lock().unwrap().contains(activity_id) {
            return Err(AppError::StravaApi("HTTP 500: upstream error".to_string()));
        }

        let summary = self
            .activities
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.key() == activity_id)
            .cloned()
            .ok_or_else(|| AppError::StravaApi("HTTP 404: Record Not Found".to_string()))?;

        let mut value = serde_json::to_value(&summary).map_err(anyhow::Error::from)?;
        value["description"] = serde_json::json!(format!("Details for {}", summary.name));
        value["calories"] = serde_json::json!(512.0);
        Ok(serde_json::from_value(value).map_err(anyhow::Error::from)?)
    }

    async fn get_activity_zones(
        &self,
        _athlete_id: u64,
        _activity_id: &str,
    ) -> Result<Vec<StravaActivityZone>, AppError> {
        self.zone_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_zones.load(Ordering::SeqCst) {
            return Err(AppError::StravaApi(
                "HTTP 402: Payment Required".to_string(),
            ));
        }
        Ok(vec![heartrate_zone()])
    }
}

/// Store wrapper that fails chosen operations.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_creates: Mutex<HashSet<String>>,
    pub fail_bulk_delete: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            ..Self::default()
        })
    }

    pub fn fail_create_for(&self, activity_id: &str) {
        self.failing_creates
            .lock()
            .unwrap()
            .insert(activity_id.to_string());
    }
}

#[async_trait]
impl ActivityStore for FlakyStore {
    async fn find_most_recent_start(
        &self,
        athlete_id: u64,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        self.inner.find_most_recent_start(athlete_id).await
    }

    async fn list_keys_in_window(
        &self,
        athlete_id: u64,
        after: DateTime<Utc>,
    ) -> Result<HashSet<String>, AppError> {
        self.inner.list_keys_in_window(athlete_id, after).await
    }

    async fn create_activity(&self, record: &ActivityRecord) -> Result<(), AppError> {
        if self.failing_creates.lock().unwrap().contains(&record.id) {
            return Err(AppError::Database("write rejected".to_string()));
        }
        self.inner.create_activity(record).await
    }

    async fn get_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<Option<EditableFields>, AppError> {
        self.inner.get_editable_fields(athlete_id, activity_id).await
    }

    async fn update_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        fields: &EditableFields,
    ) -> Result<(), AppError> {
        self.inner
            .update_editable_fields(athlete_id, activity_id, fields)
            .await
    }

    async fn update_detail_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        detail: &DetailFields,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.inner
            .update_detail_fields(athlete_id, activity_id, detail, synced_at)
            .await
    }

    async fn bulk_delete(
        &self,
        athlete_id: u64,
        activity_ids: &[String],
    ) -> Result<usize, AppError> {
        if self.fail_bulk_delete.load(Ordering::SeqCst) {
            return Err(AppError::Database("batch commit failed".to_string()));
        }
        self.inner.bulk_delete(athlete_id, activity_ids).await
    }

    async fn list_activities(
        &self,
        athlete_id: u64,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        self.inner.list_activities(athlete_id, query).await
    }
}

/// Sync options for tests: no delay between enrichments.
#[allow(dead_code)]
pub fn test_options() -> SyncOptions {
    Config::test_default().sync
}

/// Engine over a fake source and the given store.
#[allow(dead_code)]
pub fn test_engine(source: Arc<FakeSource>, store: Arc<dyn ActivityStore>) -> SyncEngine {
    SyncEngine::new(source, store, test_options())
}

/// Create a test app backed by a fake source and an in-memory store.
/// Returns the router, the shared state, the source and the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<FakeSource>, MemoryStore) {
    let config = Config::test_default();
    let source = FakeSource::new(vec![]);
    let store = MemoryStore::new();
    let store_arc: Arc<dyn ActivityStore> = Arc::new(store.clone());

    let sync_engine = SyncEngine::new(source.clone(), store_arc.clone(), config.sync.clone());

    let state = Arc::new(AppState {
        config,
        store: store_arc,
        sync_engine,
    });

    (create_router(state.clone()), state, source, store)
}

/// Session JWT signed with the test config's key.
#[allow(dead_code)]
pub fn test_jwt(athlete_id: u64) -> String {
    stride_sync::middleware::auth::create_jwt(athlete_id, &Config::test_default().jwt_signing_key)
        .expect("jwt")
}
