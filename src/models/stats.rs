// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Summary statistics over a listed set of activities.
//!
//! Computed per request from the activities returned to the dashboard, so
//! they always agree with the list they accompany.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::ActivityRecord;

/// Aggregates for the activities in one listing response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityStats {
    /// Number of activities aggregated
    pub total: u32,
    /// Activity count per sport type
    pub sport_types: BTreeMap<String, u32>,
    /// Activity count per month ("YYYY-MM")
    pub by_month: BTreeMap<String, u32>,
    /// Total distance (meters)
    pub total_distance_meters: f64,
    /// Total moving time (seconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_moving_time_secs: u64,
}

impl ActivityStats {
    /// Aggregate a slice of stored activities.
    pub fn from_records(records: &[ActivityRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.add(record);
        }
        stats
    }

    /// Fold one activity into the totals.
    pub fn add(&mut self, record: &ActivityRecord) {
        self.total += 1;
        self.total_distance_meters += record.distance;
        self.total_moving_time_secs += u64::from(record.moving_time);

        *self
            .sport_types
            .entry(record.sport_type.clone())
            .or_insert(0) += 1;
        *self
            .by_month
            .entry(record.start_date.format("%Y-%m").to_string())
            .or_insert(0) += 1;
    }
}
