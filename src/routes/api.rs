// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::db::store::MAX_LIST_LIMIT;
use crate::db::ActivityQuery;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityRecord, ActivityStats};
use crate::services::sync::{SyncReport, SyncRequest};
use crate::time_utils::{format_utc_rfc3339, parse_rfc3339_param};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sync", post(run_sync))
        .route("/api/activities", get(get_activities))
}

// ─── Sync ────────────────────────────────────────────────────

/// Run an incremental sync for the current athlete.
///
/// The body is optional; an absent body uses the configured defaults.
async fn run_sync(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<SyncReport>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    tracing::debug!(
        athlete_id = user.athlete_id,
        initial_sync_days = ?request.initial_sync_days,
        edit_scan_window_days = ?request.edit_scan_window_days,
        "Sync requested"
    );

    let report = state.sync_engine.run(user.athlete_id, request).await?;
    Ok(Json(report))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Filter by exact sport type
    sport_type: Option<String>,
    /// Inclusive lower bound on start date (RFC3339)
    start_date: Option<String>,
    /// Inclusive upper bound on start date (RFC3339)
    end_date: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivitySummary>,
    pub stats: ActivityStats,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub athlete_id: u64,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitySummary {
    pub id: String,
    pub name: String,
    pub sport_type: String,
    pub start_date: String,
    pub distance: f64,
    pub moving_time: u32,
    pub elapsed_time: u32,
    pub total_elevation_gain: f64,
    pub average_heartrate: Option<f64>,
    pub trainer: bool,
    pub commute: bool,
    pub private: bool,
    pub has_detail: bool,
}

impl From<&ActivityRecord> for ActivitySummary {
    fn from(record: &ActivityRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            sport_type: record.sport_type.clone(),
            start_date: format_utc_rfc3339(record.start_date),
            distance: record.distance,
            moving_time: record.moving_time,
            elapsed_time: record.elapsed_time,
            total_elevation_gain: record.total_elevation_gain,
            average_heartrate: record.average_heartrate,
            trainer: record.trainer,
            commute: record.commute,
            private: record.private,
            has_detail: record.has_detail(),
        }
    }
}

/// Get the athlete's stored activities, newest first, with totals.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>> {
    tracing::debug!(
        athlete_id = user.athlete_id,
        sport_type = ?params.sport_type,
        start_date = ?params.start_date,
        end_date = ?params.end_date,
        limit = params.limit,
        "Fetching activities"
    );

    let start = parse_rfc3339_param("start_date", params.start_date.as_deref())?;
    let end = parse_rfc3339_param("end_date", params.end_date.as_deref())?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::BadRequest(
                "'start_date' must not be after 'end_date'".to_string(),
            ));
        }
    }

    let query = ActivityQuery {
        sport_type: params.sport_type.filter(|s| !s.is_empty()),
        start,
        end,
        limit: params.limit.min(MAX_LIST_LIMIT),
    };

    let records = state
        .store
        .list_activities(user.athlete_id, &query)
        .await?;

    Ok(Json(ActivitiesResponse {
        stats: ActivityStats::from_records(&records),
        activities: records.iter().map(ActivitySummary::from).collect(),
        athlete_id: user.athlete_id,
    }))
}
