//! Abstract read/write boundary. The engine performs no I/O of its own:
//! scoring, assembly, and plan derivation are pure functions over snapshots
//! fetched through these traits, and the only mutations are the usage
//! upsert and the weekly completion flag.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::{
    CandidateItem, Category, DifficultyRange, ItemType, LearnerProfile, PracticeItem,
    SubmissionRecord, UsageContext, UsageRecord, WeeklyProgressRecord,
};

pub use memory::MemoryStore;

/// Catalog filter. Empty `categories` means any category; `required_tags`
/// items must carry every listed tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemQuery {
    pub item_type: Option<ItemType>,
    pub categories: Vec<Category>,
    pub difficulty: Option<DifficultyRange>,
    pub required_tags: Option<Vec<String>>,
}

impl ItemQuery {
    pub fn matches(&self, item: &PracticeItem) -> bool {
        if let Some(t) = self.item_type {
            if item.item_type != t {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&item.category) {
            return false;
        }
        if let Some(range) = self.difficulty {
            if !range.contains(item.difficulty) {
                return false;
            }
        }
        if let Some(tags) = &self.required_tags {
            if !tags.iter().all(|t| item.tags.contains(t)) {
                return false;
            }
        }
        true
    }
}

/// Read-only practice-item catalog with learner-scoped history embedded in
/// each result row.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn query_items(
        &self,
        learner_id: &str,
        query: &ItemQuery,
    ) -> Result<Vec<CandidateItem>, StoreError>;

    async fn items_by_ids(&self, ids: &[String]) -> Result<Vec<PracticeItem>, StoreError>;
}

/// Per-learner profile, submission history, and usage records.
#[async_trait]
pub trait LearnerStore: Send + Sync {
    async fn learner_profile(&self, learner_id: &str)
        -> Result<Option<LearnerProfile>, StoreError>;

    /// Most recent first, at most `limit`.
    async fn submissions(
        &self,
        learner_id: &str,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, StoreError>;

    async fn usage_records(&self, learner_id: &str) -> Result<Vec<UsageRecord>, StoreError>;

    /// Atomic upsert: increment `usage_count` and overwrite
    /// `last_used_at`/`context`, or create with count 1. Implementations
    /// must not read-modify-write across concurrent callers.
    async fn upsert_usage(
        &self,
        learner_id: &str,
        item_id: &str,
        context: UsageContext,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Weekly plan completion flags, the only plan state that outlives a request.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn weekly_progress(
        &self,
        learner_id: &str,
    ) -> Result<Vec<WeeklyProgressRecord>, StoreError>;

    /// Create the week row if absent, touch `updated_at` otherwise.
    async fn touch_week(
        &self,
        learner_id: &str,
        week: u32,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// One-way: a completed week stays completed, and the original
    /// `completed_at` is preserved.
    async fn mark_week_completed(
        &self,
        learner_id: &str,
        week: u32,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
