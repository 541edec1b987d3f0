// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets as environment variables via secret bindings,
//! so everything is read once at startup.

use crate::services::sync::{SyncOptions, MAX_SYNC_DAYS};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where activity and token documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (production, or the emulator).
    Firestore,
    /// Process-local store for development without GCP.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("ACTIVITY_STORE")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Activity store backend
    pub store_backend: StoreBackend,
    /// Timeout applied to every Strava HTTP request
    pub strava_http_timeout: Duration,

    // --- Sync defaults ---
    /// Engine defaults; per-run overrides come from the request body.
    pub sync: SyncOptions,

    // --- Secrets ---
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            strava_http_timeout: Duration::from_secs(30),
            sync: SyncOptions {
                request_delay: Duration::ZERO,
                ..SyncOptions::default()
            },
            strava_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = SyncOptions::default();
        let sync = SyncOptions {
            initial_sync_days: check_days(
                "INITIAL_SYNC_DAYS",
                parse_or("INITIAL_SYNC_DAYS", defaults.initial_sync_days)?,
            )?,
            edit_scan_window_days: check_days(
                "EDIT_SCAN_WINDOW_DAYS",
                parse_or("EDIT_SCAN_WINDOW_DAYS", defaults.edit_scan_window_days)?,
            )?,
            per_page: parse_or("SYNC_PAGE_SIZE", defaults.per_page)?,
            max_pages: parse_or("SYNC_MAX_PAGES", defaults.max_pages)?,
            request_delay: Duration::from_millis(parse_or(
                "SYNC_REQUEST_DELAY_MS",
                defaults.request_delay.as_millis() as u64,
            )?),
            detail_sport_types: match env::var("DETAIL_SPORT_TYPES") {
                Ok(raw) => parse_sport_types(&raw),
                Err(_) => defaults.detail_sport_types,
            },
        };

        if sync.per_page == 0 || sync.max_pages == 0 {
            return Err(ConfigError::Invalid("SYNC_PAGE_SIZE/SYNC_MAX_PAGES"));
        }

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend: env::var("ACTIVITY_STORE")
                .map(|v| v.parse())
                .unwrap_or(Ok(StoreBackend::Firestore))?,
            strava_http_timeout: Duration::from_secs(parse_or("STRAVA_HTTP_TIMEOUT_SECS", 30)?),
            sync,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Day counts share the bound applied to per-run overrides.
fn check_days(name: &'static str, days: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_SYNC_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::Invalid(name))
    }
}

/// Parse a comma-separated sport type list, ignoring blanks.
fn parse_sport_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
