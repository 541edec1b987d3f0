// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::AppError;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an optional RFC3339 query parameter into UTC.
pub fn parse_rfc3339_param(
    name: &str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                AppError::BadRequest(format!(
                    "Invalid '{}' parameter: must be RFC3339 datetime",
                    name
                ))
            })
    })
    .transpose()
}
