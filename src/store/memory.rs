//! In-memory reference implementation of the store traits. Backs the demo
//! binary and the test suite; a production deployment points the engine at
//! its own persistence instead.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::{CatalogStore, ItemQuery, LearnerStore, ProgressStore};
use crate::types::{
    CandidateItem, LearnerProfile, PracticeItem, SubmissionRecord, UsageContext, UsageRecord,
    WeeklyProgressRecord,
};

#[derive(Default)]
struct Inner {
    /// Insertion order doubles as the catalog's fetch order.
    items: Vec<PracticeItem>,
    profiles: HashMap<String, LearnerProfile>,
    /// learner id -> submissions, most recent last.
    submissions: HashMap<String, Vec<SubmissionRecord>>,
    /// (learner id, item id) -> usage.
    usage: HashMap<(String, String), UsageRecord>,
    /// (learner id, week) -> progress row.
    progress: HashMap<(String, u32), WeeklyProgressRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&self, item: PracticeItem) {
        self.inner.write().items.push(item);
    }

    pub fn insert_profile(&self, profile: LearnerProfile) {
        self.inner
            .write()
            .profiles
            .insert(profile.learner_id.clone(), profile);
    }

    pub fn push_submission(&self, submission: SubmissionRecord) {
        self.inner
            .write()
            .submissions
            .entry(submission.learner_id.clone())
            .or_default()
            .push(submission);
    }

    pub fn usage_count(&self, learner_id: &str, item_id: &str) -> u32 {
        self.inner
            .read()
            .usage
            .get(&(learner_id.to_string(), item_id.to_string()))
            .map(|u| u.usage_count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn query_items(
        &self,
        learner_id: &str,
        query: &ItemQuery,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        let inner = self.inner.read();

        let mut global_counts: HashMap<&str, u64> = HashMap::new();
        for subs in inner.submissions.values() {
            for sub in subs {
                *global_counts.entry(sub.item_id.as_str()).or_default() += 1;
            }
        }

        let learner_subs = inner.submissions.get(learner_id);

        Ok(inner
            .items
            .iter()
            .filter(|item| query.matches(item))
            .map(|item| {
                let usage = inner
                    .usage
                    .get(&(learner_id.to_string(), item.id.clone()))
                    .cloned();
                let submissions = learner_subs
                    .map(|subs| {
                        subs.iter()
                            .filter(|s| s.item_id == item.id)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                CandidateItem {
                    total_submissions: global_counts.get(item.id.as_str()).copied().unwrap_or(0),
                    item: item.clone(),
                    usage,
                    submissions,
                }
            })
            .collect())
    }

    async fn items_by_ids(&self, ids: &[String]) -> Result<Vec<PracticeItem>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .items
            .iter()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LearnerStore for MemoryStore {
    async fn learner_profile(
        &self,
        learner_id: &str,
    ) -> Result<Option<LearnerProfile>, StoreError> {
        Ok(self.inner.read().profiles.get(learner_id).cloned())
    }

    async fn submissions(
        &self,
        learner_id: &str,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        let inner = self.inner.read();
        let mut subs: Vec<SubmissionRecord> = inner
            .submissions
            .get(learner_id)
            .cloned()
            .unwrap_or_default();
        subs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        subs.truncate(limit);
        Ok(subs)
    }

    async fn usage_records(&self, learner_id: &str) -> Result<Vec<UsageRecord>, StoreError> {
        let inner = self.inner.read();
        let mut records: Vec<UsageRecord> = inner
            .usage
            .values()
            .filter(|u| u.learner_id == learner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
        Ok(records)
    }

    async fn upsert_usage(
        &self,
        learner_id: &str,
        item_id: &str,
        context: UsageContext,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // Single write lock for the whole upsert keeps concurrent
        // increments from losing updates.
        let mut inner = self.inner.write();
        inner
            .usage
            .entry((learner_id.to_string(), item_id.to_string()))
            .and_modify(|u| {
                u.usage_count += 1;
                u.last_used_at = now;
                u.context = context;
            })
            .or_insert_with(|| UsageRecord {
                learner_id: learner_id.to_string(),
                item_id: item_id.to_string(),
                last_used_at: now,
                usage_count: 1,
                context,
            });
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn weekly_progress(
        &self,
        learner_id: &str,
    ) -> Result<Vec<WeeklyProgressRecord>, StoreError> {
        let inner = self.inner.read();
        let mut rows: Vec<WeeklyProgressRecord> = inner
            .progress
            .values()
            .filter(|p| p.learner_id == learner_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.week);
        Ok(rows)
    }

    async fn touch_week(
        &self,
        learner_id: &str,
        week: u32,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner
            .progress
            .entry((learner_id.to_string(), week))
            .and_modify(|p| p.updated_at = now)
            .or_insert_with(|| WeeklyProgressRecord {
                learner_id: learner_id.to_string(),
                week,
                completed: false,
                completed_at: None,
                updated_at: now,
            });
        Ok(())
    }

    async fn mark_week_completed(
        &self,
        learner_id: &str,
        week: u32,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let row = inner
            .progress
            .entry((learner_id.to_string(), week))
            .or_insert_with(|| WeeklyProgressRecord {
                learner_id: learner_id.to_string(),
                week,
                completed: false,
                completed_at: None,
                updated_at: now,
            });
        if !row.completed {
            row.completed = true;
            row.completed_at = Some(now);
        }
        row.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ItemType};
    use std::sync::Arc;

    fn item(id: &str, difficulty: u8) -> PracticeItem {
        PracticeItem {
            id: id.to_string(),
            item_type: ItemType::ShortAnswer,
            category: Category::LanguageUse,
            difficulty,
            points: 1,
            tags: vec!["grammar".to_string()],
            epoch: None,
        }
    }

    #[tokio::test]
    async fn upsert_usage_increments_and_overwrites() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store
            .upsert_usage("l1", "i1", UsageContext::Practice, t0)
            .await
            .unwrap();
        store
            .upsert_usage("l1", "i1", UsageContext::Exam, t0)
            .await
            .unwrap();

        let records = store.usage_records("l1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].usage_count, 2);
        assert_eq!(records[0].context, UsageContext::Exam);
    }

    #[tokio::test]
    async fn concurrent_upserts_lose_no_increments() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .upsert_usage("l1", "i1", UsageContext::Exam, now)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.usage_count("l1", "i1"), 32);
    }

    #[tokio::test]
    async fn query_filters_by_difficulty_and_type() {
        let store = MemoryStore::new();
        store.insert_item(item("a", 1));
        store.insert_item(item("b", 3));

        let query = ItemQuery {
            item_type: Some(ItemType::ShortAnswer),
            difficulty: Some(crate::types::DifficultyRange::new(2, 5)),
            ..Default::default()
        };
        let found = store.query_items("l1", &query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item.id, "b");
    }

    #[tokio::test]
    async fn completion_is_one_way() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store.mark_week_completed("l1", 2, t0).await.unwrap();
        let first = store.weekly_progress("l1").await.unwrap()[0].clone();

        store
            .mark_week_completed("l1", 2, t0 + chrono::Duration::days(1))
            .await
            .unwrap();
        let second = store.weekly_progress("l1").await.unwrap()[0].clone();

        assert!(second.completed);
        assert_eq!(first.completed_at, second.completed_at);
    }
}
