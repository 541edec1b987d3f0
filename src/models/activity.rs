// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stored activity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::strava::{
    Gear, Lap, PhotosSummary, SegmentEffort, Split, StravaActivityDetail, StravaActivitySummary,
    StravaActivityZone,
};

/// Stored activity record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    /// Strava activity ID (also used as document ID)
    pub id: String,
    /// Strava athlete ID (owner)
    pub athlete_id: u64,

    // ─── Editable ────────────────────────────────────────────────
    /// Activity name/title
    pub name: String,
    pub trainer: bool,
    pub commute: bool,
    pub private: bool,
    pub gear_id: Option<String>,
    pub photo_count: u32,
    pub total_photo_count: u32,

    // ─── Classification ──────────────────────────────────────────
    /// Sport type (Ride, Run, Swim, etc.)
    pub sport_type: String,
    /// Start date/time (UTC)
    pub start_date: DateTime<Utc>,
    /// Start time as Unix seconds, used for window queries
    pub start_ts: i64,
    pub start_date_local: Option<String>,
    pub timezone: Option<String>,

    // ─── Physical ────────────────────────────────────────────────
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: u32,
    /// Elapsed time in seconds
    pub elapsed_time: u32,
    pub total_elevation_gain: f64,
    pub elev_high: Option<f64>,
    pub elev_low: Option<f64>,
    pub average_speed: f64,
    pub max_speed: f64,
    pub average_watts: Option<f64>,
    pub max_watts: Option<f64>,
    pub weighted_average_watts: Option<f64>,
    pub kilojoules: Option<f64>,
    pub device_watts: bool,
    pub average_cadence: Option<f64>,
    pub has_heartrate: bool,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,

    // ─── Metadata ────────────────────────────────────────────────
    /// Device name (e.g. "Garmin Edge 530")
    pub device_name: Option<String>,
    pub manual: bool,
    pub workout_type: Option<u32>,
    pub achievement_count: u32,
    pub kudos_count: u32,
    pub comment_count: u32,
    pub summary_polyline: Option<String>,

    /// Detail data, present once the activity has been enriched
    #[serde(default)]
    pub detail: Option<DetailFields>,

    /// When this record was first stored
    pub created_at: DateTime<Utc>,
    /// When this record was last written from Strava data
    pub last_synced_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Map a Strava summary to a new record (no detail data yet).
    pub fn from_summary(summary: &StravaActivitySummary, now: DateTime<Utc>) -> Self {
        Self {
            id: summary.key(),
            athlete_id: summary.athlete.id,
            name: summary.name.clone(),
            trainer: summary.trainer,
            commute: summary.commute,
            private: summary.private,
            gear_id: summary.gear_id.clone(),
            photo_count: summary.photo_count,
            total_photo_count: summary.total_photo_count,
            sport_type: summary.sport_type.clone(),
            start_date: summary.start_date,
            start_ts: summary.start_date.timestamp(),
            start_date_local: summary.start_date_local.clone(),
            timezone: summary.timezone.clone(),
            distance: summary.distance,
            moving_time: summary.moving_time,
            elapsed_time: summary.elapsed_time,
            total_elevation_gain: summary.total_elevation_gain,
            elev_high: summary.elev_high,
            elev_low: summary.elev_low,
            average_speed: summary.average_speed,
            max_speed: summary.max_speed,
            average_watts: summary.average_watts,
            max_watts: summary.max_watts,
            weighted_average_watts: summary.weighted_average_watts,
            kilojoules: summary.kilojoules,
            device_watts: summary.device_watts,
            average_cadence: summary.average_cadence,
            has_heartrate: summary.has_heartrate,
            average_heartrate: summary.average_heartrate,
            max_heartrate: summary.max_heartrate,
            device_name: summary.device_name.clone(),
            manual: summary.manual,
            workout_type: summary.workout_type,
            achievement_count: summary.achievement_count,
            kudos_count: summary.kudos_count,
            comment_count: summary.comment_count,
            summary_polyline: summary
                .map
                .as_ref()
                .and_then(|m| m.summary_polyline.clone()),
            detail: None,
            created_at: now,
            last_synced_at: now,
        }
    }

    /// Current values of the user-editable fields.
    pub fn editable_fields(&self) -> EditableFields {
        EditableFields {
            name: self.name.clone(),
            trainer: self.trainer,
            commute: self.commute,
            private: self.private,
            gear_id: self.gear_id.clone(),
            photo_count: self.photo_count,
            total_photo_count: self.total_photo_count,
        }
    }

    /// Overwrite the user-editable fields, leaving everything else untouched.
    pub fn apply_editable_fields(&mut self, fields: &EditableFields) {
        self.name = fields.name.clone();
        self.trainer = fields.trainer;
        self.commute = fields.commute;
        self.private = fields.private;
        self.gear_id = fields.gear_id.clone();
        self.photo_count = fields.photo_count;
        self.total_photo_count = fields.total_photo_count;
    }

    /// True if the record carries enriched detail data.
    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }
}

/// Fields a user can change on Strava after the activity was uploaded.
///
/// Equality is over exactly these fields; a new editable field must be added
/// here and to [`EditableFields::FIELD_NAMES`] together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableFields {
    pub name: String,
    pub trainer: bool,
    pub commute: bool,
    pub private: bool,
    pub gear_id: Option<String>,
    pub photo_count: u32,
    pub total_photo_count: u32,
}

impl EditableFields {
    /// Document field paths written by an editable-field update.
    pub const FIELD_NAMES: [&'static str; 7] = [
        "name",
        "trainer",
        "commute",
        "private",
        "gear_id",
        "photo_count",
        "total_photo_count",
    ];

    /// Names of the fields that differ between `self` and `other`.
    pub fn changed_fields(&self, other: &EditableFields) -> Vec<&'static str> {
        let flags = [
            self.name != other.name,
            self.trainer != other.trainer,
            self.commute != other.commute,
            self.private != other.private,
            self.gear_id != other.gear_id,
            self.photo_count != other.photo_count,
            self.total_photo_count != other.total_photo_count,
        ];

        Self::FIELD_NAMES
            .iter()
            .zip(flags)
            .filter_map(|(name, changed)| changed.then_some(*name))
            .collect()
    }
}

/// Detail data merged into a record by enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetailFields {
    pub description: Option<String>,
    pub calories: Option<f64>,
    #[serde(default)]
    pub laps: Vec<Lap>,
    #[serde(default)]
    pub splits_metric: Vec<Split>,
    #[serde(default)]
    pub splits_standard: Vec<Split>,
    #[serde(default)]
    pub segment_efforts: Vec<SegmentEffort>,
    #[serde(default)]
    pub best_efforts: Vec<SegmentEffort>,
    pub photos: Option<PhotosSummary>,
    pub gear: Option<Gear>,
    /// None when the zone fetch failed or returned nothing usable
    pub zones: Option<Vec<StravaActivityZone>>,
}

impl DetailFields {
    /// Build detail fields from a detailed activity and optional zones.
    pub fn from_detail(detail: StravaActivityDetail, zones: Option<Vec<StravaActivityZone>>) -> Self {
        Self {
            description: detail.description,
            calories: detail.calories,
            laps: detail.laps.unwrap_or_default(),
            splits_metric: detail.splits_metric.unwrap_or_default(),
            splits_standard: detail.splits_standard.unwrap_or_default(),
            segment_efforts: detail.segment_efforts.unwrap_or_default(),
            best_efforts: detail.best_efforts.unwrap_or_default(),
            photos: detail.photos,
            gear: detail.gear,
            zones,
        }
    }
}
