//! Per-learner item usage: idempotent upsert fan-out plus a read-side
//! aggregation over the usage history.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;
use crate::store::{CatalogStore, LearnerStore};
use crate::types::{PracticeItem, UsageContext, UsageStats};

const RECENT_WINDOW_DAYS: i64 = 7;
const FREQUENT_THRESHOLD: u32 = 3;

/// Upsert one usage record per item id. Each upsert is atomic at the store
/// boundary, so concurrent assemblies for the same learner cannot lose
/// increments.
pub async fn record_usage(
    learners: &dyn LearnerStore,
    learner_id: &str,
    item_ids: &[String],
    context: UsageContext,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    for item_id in item_ids {
        learners
            .upsert_usage(learner_id, item_id, context, now)
            .await?;
    }
    tracing::debug!(
        learner_id,
        context = context.as_str(),
        items = item_ids.len(),
        "usage recorded"
    );
    Ok(())
}

/// Aggregate a learner's usage history into the stats surface the product
/// shows: totals, a recent-use window, overused items, and per-category /
/// per-type breakdowns.
pub async fn usage_stats(
    learners: &dyn LearnerStore,
    catalog: &dyn CatalogStore,
    learner_id: &str,
    now: DateTime<Utc>,
) -> Result<UsageStats, StoreError> {
    let records = learners.usage_records(learner_id).await?;
    let ids: Vec<String> = records.iter().map(|r| r.item_id.clone()).collect();
    let items: HashMap<String, PracticeItem> = catalog
        .items_by_ids(&ids)
        .await?
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let mut stats = UsageStats {
        total_used: records.len() as u64,
        ..Default::default()
    };

    for record in &records {
        if record.last_used_at > recent_cutoff {
            stats.recently_used += 1;
        }
        if record.usage_count > FREQUENT_THRESHOLD {
            stats.frequently_used += 1;
        }
        if let Some(item) = items.get(&record.item_id) {
            *stats.by_category.entry(item.category).or_default() += 1;
            *stats.by_type.entry(item.item_type).or_default() += 1;
        }
    }

    Ok(stats)
}
