//! `PracticeEngine` wires the scoring, assembly, usage, weakness, and
//! planning modules onto the storage boundary and exposes the operations
//! the surrounding system calls. Every operation snapshots "now" once and
//! threads it through, keeping the inner derivations pure.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::assembly::TemplateAssembler;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::planner::StudyPlanner;
use crate::scoring::{DiversityScorer, TagCoverage};
use crate::store::{CatalogStore, LearnerStore, ProgressStore};
use crate::types::{
    ExamBlueprint, ExamSelection, LearnerProfile, StudyPlan, UsageContext, UsageStats,
    WeekProgress,
};
use crate::usage;

pub struct PracticeEngine {
    catalog: Arc<dyn CatalogStore>,
    learners: Arc<dyn LearnerStore>,
    progress: Arc<dyn ProgressStore>,
    config: EngineConfig,
    diversity: Arc<dyn DiversityScorer>,
}

impl PracticeEngine {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        learners: Arc<dyn LearnerStore>,
        progress: Arc<dyn ProgressStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            learners,
            progress,
            config,
            diversity: Arc::new(TagCoverage),
        }
    }

    /// Build the engine on a single store implementing all three traits.
    pub fn with_shared_store<S>(store: Arc<S>, config: EngineConfig) -> Self
    where
        S: CatalogStore + LearnerStore + ProgressStore + 'static,
    {
        Self::new(
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            Arc::clone(&store) as Arc<dyn LearnerStore>,
            store as Arc<dyn ProgressStore>,
            config,
        )
    }

    /// Swap the diversity strategy (default: deterministic tag coverage).
    pub fn with_diversity(mut self, diversity: Arc<dyn DiversityScorer>) -> Self {
        self.diversity = diversity;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fill the blueprint for a learner and record usage of everything
    /// selected. Underfilled requirements come back as shortfalls, never
    /// as an error.
    pub async fn select_items_for_exam(
        &self,
        learner_id: &str,
        blueprint: &ExamBlueprint,
    ) -> Result<ExamSelection, EngineError> {
        let now = Utc::now();
        let profile = self.learners.learner_profile(learner_id).await?;
        let recent_tags = self.recent_tags(learner_id).await?;

        let assembler =
            TemplateAssembler::new(&*self.catalog, &*self.diversity, &self.config);
        let selection = assembler
            .assemble(learner_id, blueprint, profile.as_ref(), &recent_tags, now)
            .await?;

        usage::record_usage(
            &*self.learners,
            learner_id,
            &selection.item_ids(),
            UsageContext::Exam,
            now,
        )
        .await?;

        tracing::info!(
            learner_id,
            blueprint = %blueprint.name,
            selected = selection.total_items(),
            requested = blueprint.requested_items(),
            shortfalls = selection.shortfalls.len(),
            "exam assembled"
        );
        Ok(selection)
    }

    /// Explicit usage recording hook for the exam-session flow.
    pub async fn record_exam_usage(
        &self,
        learner_id: &str,
        session_id: &str,
        item_ids: &[String],
    ) -> Result<(), EngineError> {
        let now = Utc::now();
        usage::record_usage(&*self.learners, learner_id, item_ids, UsageContext::Exam, now)
            .await?;
        tracing::info!(learner_id, session_id, items = item_ids.len(), "exam usage recorded");
        Ok(())
    }

    pub async fn learner_item_stats(&self, learner_id: &str) -> Result<UsageStats, EngineError> {
        let now = Utc::now();
        Ok(usage::usage_stats(&*self.learners, &*self.catalog, learner_id, now).await?)
    }

    /// `Ok(None)` when the learner has no profile or no exam deadline.
    pub async fn generate_study_plan(
        &self,
        learner_id: &str,
    ) -> Result<Option<StudyPlan>, EngineError> {
        let now = Utc::now();
        let Some(profile) = self.learners.learner_profile(learner_id).await? else {
            return Ok(None);
        };
        self.plan_for(learner_id, &profile, now).await
    }

    /// Record a practice event against a week and recompute that week's
    /// completion state. The recompute is advisory: storage failures there
    /// are logged and skipped so they never block the triggering write.
    pub async fn update_weekly_progress(
        &self,
        learner_id: &str,
        week: u32,
        item_id: &str,
        score: f64,
    ) -> Result<(), EngineError> {
        if week == 0 {
            return Err(EngineError::Validation("week index starts at 1".to_string()));
        }
        let now = Utc::now();
        self.progress.touch_week(learner_id, week, now).await?;
        tracing::debug!(learner_id, week, item_id, score, "weekly progress updated");

        if let Err(err) = self.recompute_week_completion(learner_id, week, now).await {
            tracing::warn!(
                learner_id,
                week,
                error = %err,
                "completion recompute skipped"
            );
        }
        Ok(())
    }

    async fn recompute_week_completion(
        &self,
        learner_id: &str,
        week: u32,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let Some(profile) = self.learners.learner_profile(learner_id).await? else {
            return Ok(());
        };
        let Some(plan) = self.plan_for(learner_id, &profile, now).await? else {
            return Ok(());
        };
        let Some(week_plan) = plan.weeks.iter().find(|w| w.week == week) else {
            return Ok(());
        };

        let state = WeekProgress::from_fraction(
            week_plan.completion_rate,
            self.config.planner.completion_threshold,
        );
        if !week_plan.completed && state == WeekProgress::Completed {
            self.progress
                .mark_week_completed(learner_id, week, now)
                .await?;
            tracing::info!(
                learner_id,
                week,
                rate = week_plan.completion_rate,
                "week marked completed"
            );
        }
        Ok(())
    }

    async fn plan_for(
        &self,
        learner_id: &str,
        profile: &LearnerProfile,
        now: DateTime<Utc>,
    ) -> Result<Option<StudyPlan>, EngineError> {
        let planner = StudyPlanner::new(
            &*self.catalog,
            &*self.learners,
            &*self.progress,
            &self.config,
        );
        planner.generate(learner_id, profile, now).await
    }

    /// Tags (and epochs) seen in the learner's most recent submissions;
    /// feeds the deterministic diversity bonus.
    async fn recent_tags(&self, learner_id: &str) -> Result<HashSet<String>, EngineError> {
        let submissions = self
            .learners
            .submissions(learner_id, self.config.planner.recent_tag_window)
            .await?;
        let ids: Vec<String> = submissions.iter().map(|s| s.item_id.clone()).collect();
        let mut tags = HashSet::new();
        for item in self.catalog.items_by_ids(&ids).await? {
            tags.extend(item.tags);
            if let Some(epoch) = item.epoch {
                tags.insert(epoch);
            }
        }
        Ok(tags)
    }
}
