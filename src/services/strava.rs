// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client and token-managing service.
//!
//! Handles:
//! - Paginated activity listing
//! - Detailed activity and zone fetches
//! - Token refresh when expired
//! - Rate limit and token error classification

use crate::error::AppError;
use crate::models::{StravaActivityDetail, StravaActivitySummary, StravaActivityZone};
use serde::Deserialize;
use std::time::Duration as StdDuration;

const DEFAULT_API_BASE: &str = "https://www.strava.com/api/v3";
const DEFAULT_OAUTH_BASE: &str = "https://www.strava.com";

/// Strava API client.
///
/// Stateless with respect to credentials: every call takes the access token
/// it should use.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(
        client_id: String,
        client_secret: String,
        timeout: StdDuration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: DEFAULT_API_BASE.to_string(),
            oauth_url: DEFAULT_OAUTH_BASE.to_string(),
            client_id,
            client_secret,
        })
    }

    /// Point the client at different API and OAuth hosts (mock servers in tests).
    pub fn with_base_urls(mut self, api_base: impl Into<String>, oauth_base: impl Into<String>) -> Self {
        self.base_url = api_base.into();
        self.oauth_url = oauth_base.into();
        self
    }

    /// List activities starting after `after` (paginated, 1-indexed pages).
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64, // Unix timestamp
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("after", after.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: &str,
    ) -> Result<StravaActivityDetail, AppError> {
        let url = format!(
            "{}/activities/{}?include_all_efforts=false",
            self.base_url, activity_id
        );
        self.get_json(&url, access_token).await
    }

    /// Get heart-rate/power zone distributions for an activity.
    pub async fn get_activity_zones(
        &self,
        access_token: &str,
        activity_id: &str,
    ) -> Result<Vec<StravaActivityZone>, AppError> {
        let url = format!("{}/activities/{}/zones", self.base_url, activity_id);
        self.get_json(&url, access_token).await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // Rate limit - the caller decides whether to retry later
            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
                return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
            }

            // Unauthorized - token may be expired or revoked
            if status.as_u16() == 401 {
                return Err(AppError::StravaApi(
                    AppError::STRAVA_TOKEN_ERROR.to_string(),
                ));
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - High-level service with token management
// ─────────────────────────────────────────────────────────────────────────────

use crate::db::TokenStore;
use crate::models::StravaTokens;
use crate::services::sync::ActivitySource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Cached access token with expiry information.
#[derive(Clone)]
pub struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Shared token cache type for use in AppState.
pub type TokenCache = Arc<DashMap<u64, CachedToken>>;

/// Shared refresh locks type for use in AppState.
pub type RefreshLocks = Arc<DashMap<u64, Arc<Mutex<()>>>>;

/// High-level Strava service that manages token lifecycle and API calls.
///
/// Every API call asks [`StravaService::get_valid_access_token`] for a token
/// first; no token is held by the client between calls.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    tokens: Arc<dyn TokenStore>,
    /// In-memory cache of access tokens (shared across requests).
    token_cache: TokenCache,
    /// Per-user mutex to serialize token refresh operations.
    refresh_locks: RefreshLocks,
}

impl StravaService {
    /// Create a new Strava service with shared token cache.
    ///
    /// The `token_cache` and `refresh_locks` should be shared across all
    /// `StravaService` instances in the process.
    pub fn new(
        client: StravaClient,
        tokens: Arc<dyn TokenStore>,
        token_cache: TokenCache,
        refresh_locks: RefreshLocks,
    ) -> Self {
        Self {
            client,
            tokens,
            token_cache,
            refresh_locks,
        }
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid (non-expired) access token for the given athlete.
    ///
    /// 1. Check in-memory cache (fast path - no I/O)
    /// 2. Acquire per-user lock to prevent duplicate refresh calls
    /// 3. Re-check cache after lock (another task may have refreshed)
    /// 4. Load stored tokens; if still valid, cache and return
    /// 5. Otherwise refresh with Strava, store and cache the new tokens
    /// 6. On `invalid_grant`, another refresher won: reload its tokens
    pub async fn get_valid_access_token(&self, athlete_id: u64) -> Result<String, AppError> {
        let now = Utc::now();
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        if let Some(cached) = self.token_cache.get(&athlete_id) {
            if now + margin < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let lock = self
            .refresh_locks
            .entry(athlete_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        if let Some(cached) = self.token_cache.get(&athlete_id) {
            if now + margin < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let tokens = self
            .tokens
            .get_tokens(athlete_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tokens for athlete {}", athlete_id)))?;

        if tokens.is_fresh(now, margin) {
            self.cache_token(athlete_id, &tokens);
            return Ok(tokens.access_token);
        }

        tracing::info!(athlete_id, "Access token expired, refreshing");

        let refreshed = match self.client.refresh_token(&tokens.refresh_token).await {
            Ok(t) => t,
            Err(AppError::StravaApi(ref msg)) if msg.contains("invalid_grant") => {
                tracing::info!(
                    athlete_id,
                    "Refresh token race detected - another instance won, fetching their tokens"
                );
                return self.fetch_and_cache_from_db(athlete_id).await;
            }
            Err(e) => return Err(e),
        };

        let updated = StravaTokens {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token,
            expires_at: DateTime::from_timestamp(refreshed.expires_at, 0).unwrap_or_default(),
            scopes: tokens.scopes,
        };

        self.tokens.set_tokens(athlete_id, &updated).await?;
        self.cache_token(athlete_id, &updated);

        tracing::info!(athlete_id, "Token refreshed and cached");
        Ok(updated.access_token)
    }

    /// Reload tokens from the store after losing a refresh race, and cache them.
    async fn fetch_and_cache_from_db(&self, athlete_id: u64) -> Result<String, AppError> {
        let tokens = self
            .tokens
            .get_tokens(athlete_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tokens for athlete {}", athlete_id)))?;

        self.cache_token(athlete_id, &tokens);
        Ok(tokens.access_token)
    }

    fn cache_token(&self, athlete_id: u64, tokens: &StravaTokens) {
        self.token_cache.insert(
            athlete_id,
            CachedToken {
                access_token: tokens.access_token.clone(),
                expires_at: tokens.expires_at,
            },
        );
    }

    /// Run an API call with a valid token, dropping the cached token if
    /// Strava rejects it so the next call reloads or refreshes.
    async fn with_token<T, F, Fut>(&self, athlete_id: u64, call: F) -> Result<T, AppError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let access_token = self.get_valid_access_token(athlete_id).await?;
        let result = call(access_token).await;

        if let Err(e) = &result {
            if e.is_strava_token_error() {
                self.token_cache.remove(&athlete_id);
            }
        }

        result
    }
}

#[async_trait]
impl ActivitySource for StravaService {
    async fn list_activities(
        &self,
        athlete_id: u64,
        after: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        // Strava's `after` is exclusive; the window start is inclusive
        self.with_token(athlete_id, |token| async move {
            self.client
                .list_activities(&token, after - 1, page, per_page)
                .await
        })
        .await
    }

    async fn get_activity_detail(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<StravaActivityDetail, AppError> {
        self.with_token(athlete_id, |token| async move {
            self.client.get_activity(&token, activity_id).await
        })
        .await
    }

    async fn get_activity_zones(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<Vec<StravaActivityZone>, AppError> {
        self.with_token(athlete_id, |token| async move {
            self.client.get_activity_zones(&token, activity_id).await
        })
        .await
    }
}
