// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lower time bound for the next fetch.

use chrono::{DateTime, Duration, Utc};

use crate::db::ActivityStore;
use crate::error::AppError;

/// Time window scanned by one sync run: `[after, now)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub athlete_id: u64,
    pub after: DateTime<Utc>,
    /// True when nothing was stored yet and the initial look-back applied
    pub initial: bool,
}

/// Resolve the window for `athlete_id`.
///
/// With nothing stored the window starts `initial_sync_days` before `now`.
/// Otherwise it starts `edit_scan_window_days` before the newest stored
/// activity, so recent edits and deletions upstream are seen again.
pub async fn resolve_window(
    store: &dyn ActivityStore,
    athlete_id: u64,
    initial_sync_days: i64,
    edit_scan_window_days: i64,
    now: DateTime<Utc>,
) -> Result<SyncWindow, AppError> {
    let most_recent = store.find_most_recent_start(athlete_id).await?;

    Ok(SyncWindow {
        athlete_id,
        after: window_start(most_recent, initial_sync_days, edit_scan_window_days, now),
        initial: most_recent.is_none(),
    })
}

/// Window start for a given newest stored start time.
pub fn window_start(
    most_recent: Option<DateTime<Utc>>,
    initial_sync_days: i64,
    edit_scan_window_days: i64,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match most_recent {
        Some(latest) => latest - Duration::days(edit_scan_window_days),
        None => now - Duration::days(initial_sync_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{ActivityRecord, StravaActivitySummary};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_first_sync_uses_initial_look_back() {
        let now = ts("2024-06-30T12:00:00Z");
        assert_eq!(window_start(None, 30, 7, now), ts("2024-05-31T12:00:00Z"));
    }

    #[test]
    fn test_incremental_window_is_relative_to_latest_activity() {
        let now = ts("2024-06-30T12:00:00Z");
        let latest = ts("2024-06-01T07:31:15Z");

        let after = window_start(Some(latest), 30, 7, now);

        assert_eq!(after, ts("2024-05-25T07:31:15Z"));
        assert_ne!(after, now - Duration::days(7));
    }

    #[tokio::test]
    async fn test_resolve_window_reads_newest_stored_activity() {
        let store = MemoryStore::new();
        for (id, start) in [(1, "2024-06-01T07:31:15Z"), (2, "2024-05-20T10:00:00Z")] {
            let summary: StravaActivitySummary = serde_json::from_value(serde_json::json!({
                "id": id,
                "athlete": {"id": 42},
                "name": "Run",
                "sport_type": "Run",
                "start_date": start,
            }))
            .unwrap();
            store.put(ActivityRecord::from_summary(&summary, Utc::now()));
        }

        let now = ts("2024-06-30T12:00:00Z");
        let window = resolve_window(&store, 42, 30, 7, now).await.unwrap();
        assert_eq!(window.after, ts("2024-05-25T07:31:15Z"));
        assert!(!window.initial);

        let other = resolve_window(&store, 7, 30, 7, now).await.unwrap();
        assert_eq!(other.after, ts("2024-05-31T12:00:00Z"));
        assert!(other.initial);
    }
}
