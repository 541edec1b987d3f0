// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stride-Sync: keep a local copy of an athlete's Strava activities current
//!
//! This crate provides the backend API that pulls activities from Strava,
//! reconciles them against the stored copy (creates, edits, deletions) and
//! serves the stored activities to the dashboard.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ActivityStore;
use services::SyncEngine;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ActivityStore>,
    pub sync_engine: SyncEngine,
}
