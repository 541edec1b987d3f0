// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod stats;
pub mod strava;
pub mod tokens;

pub use activity::{ActivityRecord, DetailFields, EditableFields};
pub use stats::ActivityStats;
pub use strava::{StravaActivityDetail, StravaActivitySummary, StravaActivityZone};
pub use tokens::StravaTokens;
