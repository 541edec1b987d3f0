// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stored Strava OAuth tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An athlete's Strava OAuth tokens, keyed by athlete ID.
///
/// Written by the OAuth connect flow and rewritten here whenever the access
/// token is refreshed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StravaTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    /// Granted OAuth scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StravaTokens {
    /// True if the access token is still usable `margin` from `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}
