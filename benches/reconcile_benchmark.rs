use async_trait::async_trait;
use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::collections::HashSet;
use std::hint::black_box;
use stride_sync::db::MemoryStore;
use stride_sync::error::AppError;
use stride_sync::models::{
    ActivityRecord, StravaActivityDetail, StravaActivitySummary, StravaActivityZone,
};
use stride_sync::services::sync::{ActivitySource, FetchedWindow, Reconciler, SyncOptions};

const ATHLETE: u64 = 42;
const ACTIVITIES: u64 = 1000;

/// Source that never gets called: the benchmark sports skip enrichment.
struct NoDetailSource;

#[async_trait]
impl ActivitySource for NoDetailSource {
    async fn list_activities(
        &self,
        _athlete_id: u64,
        _after: i64,
        _page: u32,
        _per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        Ok(vec![])
    }

    async fn get_activity_detail(
        &self,
        _athlete_id: u64,
        activity_id: &str,
    ) -> Result<StravaActivityDetail, AppError> {
        Err(AppError::NotFound(activity_id.to_string()))
    }

    async fn get_activity_zones(
        &self,
        _athlete_id: u64,
        _activity_id: &str,
    ) -> Result<Vec<StravaActivityZone>, AppError> {
        Ok(vec![])
    }
}

fn summaries() -> Vec<StravaActivitySummary> {
    let now = Utc::now();
    (1..=ACTIVITIES)
        .map(|id| {
            serde_json::from_value(serde_json::json!({
                "id": id,
                "athlete": {"id": ATHLETE},
                "name": format!("Walk {}", id),
                "sport_type": "Walk",
                "start_date": (now - Duration::hours(id as i64)).to_rfc3339(),
                "distance": 3000.0,
            }))
            .expect("valid summary")
        })
        .collect()
}

fn benchmark_reconcile(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let source = NoDetailSource;
    let options = SyncOptions::default();

    let fetched = FetchedWindow {
        activities: summaries(),
        truncated: false,
    };
    let all_keys: HashSet<String> = fetched.activities.iter().map(|s| s.key()).collect();

    let mut group = c.benchmark_group("reconcile");

    group.bench_function("first_sync_creates", |b| {
        b.iter_batched(
            MemoryStore::new,
            |store| {
                rt.block_on(async {
                    Reconciler::new(&source, &store, &options)
                        .reconcile(ATHLETE, black_box(&fetched), &HashSet::new())
                        .await
                        .expect("reconcile")
                })
            },
            BatchSize::SmallInput,
        )
    });

    // Everything already stored and unchanged: the steady-state run
    let synced = MemoryStore::new();
    for summary in &fetched.activities {
        synced.put(ActivityRecord::from_summary(summary, Utc::now()));
    }

    group.bench_function("unchanged_resync_skips", |b| {
        b.iter(|| {
            rt.block_on(async {
                Reconciler::new(&source, &synced, &options)
                    .reconcile(ATHLETE, black_box(&fetched), &all_keys)
                    .await
                    .expect("reconcile")
            })
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_reconcile);
criterion_main!(benches);
