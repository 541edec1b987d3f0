// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod strava;
pub mod sync;

pub use strava::{StravaClient, StravaService};
pub use sync::{ActivitySource, SyncEngine, SyncOptions, SyncReport, SyncRequest};
