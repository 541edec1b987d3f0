// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides storage for:
//! - Activities (synced Strava activities, keyed by Strava activity ID)
//! - Tokens (Strava OAuth tokens, keyed by athlete ID)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::FirestoreWritePrecondition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::db::collections;
use crate::db::store::{ActivityQuery, ActivityStore, TokenStore, MAX_LIST_LIMIT};
use crate::error::AppError;
use crate::models::{ActivityRecord, DetailFields, EditableFields, StravaTokens};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Key-only projection of an activity document.
#[derive(Debug, Deserialize)]
struct ActivityKey {
    id: String,
}

/// Partial document written by detail enrichment.
#[derive(Debug, Serialize, Deserialize)]
struct DetailPatch {
    detail: DetailFields,
    last_synced_at: DateTime<Utc>,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Fetch a record if it exists and belongs to `athlete_id`.
    async fn get_owned(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<Option<ActivityRecord>, AppError> {
        let record: Option<ActivityRecord> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(record.filter(|r| r.athlete_id == athlete_id))
    }

    /// Fail with NotFound unless the record exists and belongs to `athlete_id`.
    async fn require_owned(&self, athlete_id: u64, activity_id: &str) -> Result<(), AppError> {
        match self.get_owned(athlete_id, activity_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!(
                "Activity {} for athlete {}",
                activity_id, athlete_id
            ))),
        }
    }

    /// All activity keys owned by an athlete (key-only projection).
    async fn owned_keys(&self, athlete_id: u64) -> Result<HashSet<String>, AppError> {
        let keys: Vec<ActivityKey> = self
            .client
            .fluent()
            .select()
            .fields(["id"])
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("athlete_id").eq(athlete_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(keys.into_iter().map(|k| k.id).collect())
    }

    /// Delete documents in transactions of at most `BATCH_SIZE` writes.
    async fn batch_delete(&self, ids: &[String], collection: &str) -> Result<(), AppError> {
        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl ActivityStore for FirestoreDb {
    async fn find_most_recent_start(
        &self,
        athlete_id: u64,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let latest: Vec<ActivityRecord> = self
            .client
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("athlete_id").eq(athlete_id)]))
            .order_by([("start_ts", firestore::FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(latest.into_iter().next().map(|r| r.start_date))
    }

    async fn list_keys_in_window(
        &self,
        athlete_id: u64,
        after: DateTime<Utc>,
    ) -> Result<HashSet<String>, AppError> {
        let after_ts = after.timestamp();
        let keys: Vec<ActivityKey> = self
            .client
            .fluent()
            .select()
            .fields(["id"])
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("athlete_id").eq(athlete_id),
                    q.field("start_ts").greater_than_or_equal(after_ts),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(keys.into_iter().map(|k| k.id).collect())
    }

    async fn create_activity(&self, record: &ActivityRecord) -> Result<(), AppError> {
        // insert() maps to CreateDocument, which rejects an existing ID
        let _: () = self
            .client
            .fluent()
            .insert()
            .into(collections::ACTIVITIES)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to create activity {}: {}", record.id, e))
            })?;
        Ok(())
    }

    async fn get_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
    ) -> Result<Option<EditableFields>, AppError> {
        Ok(self
            .get_owned(athlete_id, activity_id)
            .await?
            .map(|r| r.editable_fields()))
    }

    async fn update_editable_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        fields: &EditableFields,
    ) -> Result<(), AppError> {
        self.require_owned(athlete_id, activity_id).await?;

        let _: () = self
            .client
            .fluent()
            .update()
            .fields(EditableFields::FIELD_NAMES)
            .in_col(collections::ACTIVITIES)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(activity_id)
            .object(fields)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_detail_fields(
        &self,
        athlete_id: u64,
        activity_id: &str,
        detail: &DetailFields,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.require_owned(athlete_id, activity_id).await?;

        let patch = DetailPatch {
            detail: detail.clone(),
            last_synced_at: synced_at,
        };

        let _: () = self
            .client
            .fluent()
            .update()
            .fields(["detail", "last_synced_at"])
            .in_col(collections::ACTIVITIES)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(activity_id)
            .object(&patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn bulk_delete(
        &self,
        athlete_id: u64,
        activity_ids: &[String],
    ) -> Result<usize, AppError> {
        if activity_ids.is_empty() {
            return Ok(0);
        }

        let owned = self.owned_keys(athlete_id).await?;
        let targets: Vec<String> = activity_ids
            .iter()
            .filter(|id| owned.contains(*id))
            .cloned()
            .collect();

        self.batch_delete(&targets, collections::ACTIVITIES).await?;

        tracing::debug!(athlete_id, count = targets.len(), "Deleted activities");
        Ok(targets.len())
    }

    async fn list_activities(
        &self,
        athlete_id: u64,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, AppError> {
        let sport_type = query.sport_type.clone();
        let start_ts = query.start.map(|d| d.timestamp());
        let end_ts = query.end.map(|d| d.timestamp());

        self.client
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("athlete_id").eq(athlete_id),
                    sport_type
                        .clone()
                        .and_then(|s| q.field("sport_type").eq(s)),
                    start_ts.and_then(|ts| q.field("start_ts").greater_than_or_equal(ts)),
                    end_ts.and_then(|ts| q.field("start_ts").less_than_or_equal(ts)),
                ])
            })
            .order_by([("start_ts", firestore::FirestoreQueryDirection::Descending)])
            .limit(query.limit.min(MAX_LIST_LIMIT))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for FirestoreDb {
    async fn get_tokens(&self, athlete_id: u64) -> Result<Option<StravaTokens>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::STRAVA_TOKENS)
            .obj()
            .one(&athlete_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_tokens(&self, athlete_id: u64, tokens: &StravaTokens) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::STRAVA_TOKENS)
            .document_id(athlete_id.to_string())
            .object(tokens)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
