// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Detail and zone enrichment for a stored activity.

use chrono::Utc;

use crate::db::ActivityStore;
use crate::error::AppError;
use crate::models::DetailFields;
use crate::services::sync::ActivitySource;

/// What an enrichment stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOutcome {
    pub zones_loaded: bool,
}

/// Fetch detail and zones concurrently and write them to the stored record.
///
/// A failed detail fetch is returned as an error. A failed zone fetch is
/// logged and the detail is stored without zones.
pub async fn enrich_activity(
    source: &dyn ActivitySource,
    store: &dyn ActivityStore,
    athlete_id: u64,
    activity_id: &str,
) -> Result<EnrichOutcome, AppError> {
    let (detail, zones) = tokio::join!(
        source.get_activity_detail(athlete_id, activity_id),
        source.get_activity_zones(athlete_id, activity_id),
    );

    let detail = detail?;

    let zones = match zones {
        Ok(zones) if !zones.is_empty() => Some(zones),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(
                athlete_id,
                activity_id,
                error = %e,
                "Zone fetch failed, storing detail without zones"
            );
            None
        }
    };

    let outcome = EnrichOutcome {
        zones_loaded: zones.is_some(),
    };

    store
        .update_detail_fields(
            athlete_id,
            activity_id,
            &DetailFields::from_detail(detail, zones),
            Utc::now(),
        )
        .await?;

    tracing::debug!(athlete_id, activity_id, zones = outcome.zones_loaded, "Enriched activity");

    Ok(outcome)
}
