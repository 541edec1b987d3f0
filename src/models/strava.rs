// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API payloads.
//!
//! Only the fields the sync pipeline stores are declared; everything else in
//! the Strava response is ignored. Most fields carry `#[serde(default)]`
//! because Strava omits them for manual and indoor activities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::EditableFields;

/// Athlete reference embedded in activity payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetaAthlete {
    pub id: u64,
}

/// Activity map with encoded polylines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolylineMap {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary_polyline: Option<String>,
    /// Only present on the detailed activity.
    #[serde(default)]
    pub polyline: Option<String>,
}

/// Summary activity returned by `GET /athlete/activities`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StravaActivitySummary {
    pub id: u64,
    pub athlete: MetaAthlete,
    pub name: String,
    pub sport_type: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub start_date_local: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,

    // User-editable after upload
    #[serde(default)]
    pub trainer: bool,
    #[serde(default)]
    pub commute: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub gear_id: Option<String>,
    #[serde(default)]
    pub photo_count: u32,
    #[serde(default)]
    pub total_photo_count: u32,

    // Recorded metrics
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub moving_time: u32,
    #[serde(default)]
    pub elapsed_time: u32,
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(default)]
    pub elev_high: Option<f64>,
    #[serde(default)]
    pub elev_low: Option<f64>,
    #[serde(default)]
    pub average_speed: f64,
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub max_watts: Option<f64>,
    #[serde(default)]
    pub weighted_average_watts: Option<f64>,
    #[serde(default)]
    pub kilojoules: Option<f64>,
    #[serde(default)]
    pub device_watts: bool,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub has_heartrate: bool,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,

    // Metadata
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub workout_type: Option<u32>,
    #[serde(default)]
    pub achievement_count: u32,
    #[serde(default)]
    pub kudos_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub athlete_count: u32,
    #[serde(default)]
    pub map: Option<PolylineMap>,
}

impl StravaActivitySummary {
    /// Local record key for this activity.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// The subset of fields a user can change after upload.
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
}

/// Detailed activity returned by `GET /activities/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivityDetail {
    #[serde(flatten)]
    pub summary: StravaActivitySummary,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub laps: Option<Vec<Lap>>,
    #[serde(default)]
    pub splits_metric: Option<Vec<Split>>,
    #[serde(default)]
    pub splits_standard: Option<Vec<Split>>,
    #[serde(default)]
    pub segment_efforts: Option<Vec<SegmentEffort>>,
    #[serde(default)]
    pub best_efforts: Option<Vec<SegmentEffort>>,
    #[serde(default)]
    pub photos: Option<PhotosSummary>,
    #[serde(default)]
    pub gear: Option<Gear>,
}

/// One lap of an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lap {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lap_index: u32,
    #[serde(default)]
    pub elapsed_time: u32,
    #[serde(default)]
    pub moving_time: u32,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub pace_zone: Option<u32>,
}

/// Per-kilometer or per-mile split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Split {
    #[serde(default)]
    pub split: Option<u32>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub elapsed_time: u32,
    #[serde(default)]
    pub moving_time: u32,
    #[serde(default)]
    pub elevation_difference: Option<f64>,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub pace_zone: Option<u32>,
}

/// Segment the effort was recorded on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentSummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub average_grade: Option<f64>,
    #[serde(default)]
    pub climb_category: Option<i32>,
}

/// Segment or best effort within an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentEffort {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elapsed_time: u32,
    #[serde(default)]
    pub moving_time: u32,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub pr_rank: Option<u32>,
    #[serde(default)]
    pub kom_rank: Option<u32>,
    #[serde(default)]
    pub segment: Option<SegmentSummary>,
}

/// Primary photo reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoPrimary {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub source: Option<u32>,
    /// Size ("100", "600") to URL.
    #[serde(default)]
    pub urls: HashMap<String, String>,
}

/// Photo summary on the detailed activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotosSummary {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub primary: Option<PhotoPrimary>,
}

/// Gear used for the activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Gear {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub primary: bool,
    /// Lifetime distance on this gear (meters)
    #[serde(default)]
    pub distance: f64,
}

/// Time spent in one zone range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneBucket {
    pub min: f64,
    pub max: f64,
    /// Seconds spent in the range
    pub time: f64,
}

/// Heart-rate or power zone distribution from `GET /activities/{id}/zones`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StravaActivityZone {
    /// "heartrate" or "power"
    #[serde(rename = "type")]
    pub zone_type: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub distribution_buckets: Vec<ZoneBucket>,
    #[serde(default)]
    pub sensor_based: Option<bool>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub custom_zones: Option<bool>,
    #[serde(default)]
    pub max: Option<f64>,
}
