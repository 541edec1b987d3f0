// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paginated fetch of a sync window.

use crate::error::AppError;
use crate::models::StravaActivitySummary;
use crate::services::sync::ActivitySource;

/// Summaries fetched for one window, in fetch order.
#[derive(Debug, Clone, Default)]
pub struct FetchedWindow {
    pub activities: Vec<StravaActivitySummary>,
    /// The page ceiling stopped the fetch, so more activities may exist
    pub truncated: bool,
}

/// Fetch pages 1.. until one comes back empty or `max_pages` is exceeded.
///
/// Any page error aborts the fetch.
pub async fn fetch_window(
    source: &dyn ActivitySource,
    athlete_id: u64,
    after: i64,
    per_page: u32,
    max_pages: u32,
) -> Result<FetchedWindow, AppError> {
    let mut fetched = FetchedWindow::default();
    let mut page = 1;

    loop {
        if page > max_pages {
            fetched.truncated = true;
            tracing::warn!(
                athlete_id,
                max_pages,
                fetched = fetched.activities.len(),
                "Page ceiling reached, fetched window may be incomplete"
            );
            break;
        }

        let batch = source
            .list_activities(athlete_id, after, page, per_page)
            .await?;

        tracing::debug!(athlete_id, page, count = batch.len(), "Fetched activity page");

        if batch.is_empty() {
            break;
        }

        fetched.activities.extend(batch);
        page += 1;
    }

    Ok(fetched)
}
