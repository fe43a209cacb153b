//! Deadline-driven study plans: a phase sequence derived from
//! days-to-deadline, one plan entry per calendar week with a focus topic,
//! intensity regime, goal list, and item set. The whole derivation is a
//! stateless function of the read snapshot; only the weekly `completed`
//! flag persists between requests.

pub mod tables;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::{CatalogStore, ItemQuery, LearnerStore, ProgressStore};
use crate::types::{
    CandidateItem, FocusTopic, LearnerProfile, PhaseKind, PracticeItem, StudyPlan, SubmissionRecord,
    WeeklyPlan,
};
use crate::weakness;

use tables::{goals_for, phase_for_week, phase_plan, topics_for, FINAL_WEEK_REST_GOAL};

/// Submissions consulted when computing week completion rates.
const COMPLETION_SUBMISSION_WINDOW: usize = 500;

pub fn total_weeks(days_until: i64) -> u32 {
    ((days_until as f64 / 7.0).ceil() as u32).max(1)
}

/// 1-based index of the week containing "now". The plan is anchored at the
/// generation instant, so this lands on the first week.
pub fn current_week(days_until: i64, total: u32) -> u32 {
    let weeks_left = total_weeks(days_until);
    (total + 1).saturating_sub(weeks_left).max(1)
}

/// Focus for week `week` of `total` in the given phase. The last two weeks
/// always revise; the run-up to them drills weak points when any exist;
/// everything earlier rotates through the phase's topic list.
pub fn focus_for_week(week: u32, total: u32, kind: PhaseKind, has_weak_points: bool) -> FocusTopic {
    if week + 1 >= total {
        return FocusTopic::Revision;
    }
    if week + 4 > total && has_weak_points {
        return FocusTopic::WeakPoints;
    }
    let topics = topics_for(kind);
    topics[week as usize % topics.len()]
}

/// Pick a week's item set from the candidate pool: novel items first
/// (nothing submitted inside the novelty window), then remediation
/// backfill from previously-attempted items scored below the threshold.
/// This backfill is the only place already-seen items are deliberately
/// reintroduced.
pub fn select_week_items(
    candidates: Vec<CandidateItem>,
    count: usize,
    novelty_window_days: i64,
    remediation_threshold: f64,
    now: DateTime<Utc>,
) -> Vec<PracticeItem> {
    let cutoff = now - Duration::days(novelty_window_days);
    let recently_solved =
        |c: &CandidateItem| c.submissions.iter().any(|s| s.submitted_at > cutoff);

    let mut novel: Vec<&CandidateItem> =
        candidates.iter().filter(|c| !recently_solved(c)).collect();
    novel.sort_by_key(|c| c.item.difficulty);

    let mut picked: Vec<PracticeItem> = novel
        .into_iter()
        .take(count)
        .map(|c| c.item.clone())
        .collect();

    if picked.len() < count {
        let picked_ids: HashSet<&str> = picked.iter().map(|i| i.id.as_str()).collect();
        let mut remediation: Vec<&CandidateItem> = candidates
            .iter()
            .filter(|c| {
                !picked_ids.contains(c.item.id.as_str())
                    && c.submissions.iter().any(|s| s.score < remediation_threshold)
            })
            .collect();
        remediation.sort_by_key(|c| c.item.difficulty);
        picked.extend(
            remediation
                .into_iter()
                .take(count - picked.len())
                .map(|c| c.item.clone()),
        );
    }

    picked
}

/// Fraction of the week's items the learner has attempted at least once.
pub fn completion_rate(items: &[PracticeItem], submissions: &[SubmissionRecord]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let attempted: HashSet<&str> = submissions.iter().map(|s| s.item_id.as_str()).collect();
    let done = items
        .iter()
        .filter(|i| attempted.contains(i.id.as_str()))
        .count();
    done as f64 / items.len() as f64
}

pub struct StudyPlanner<'a> {
    catalog: &'a dyn CatalogStore,
    learners: &'a dyn LearnerStore,
    progress: &'a dyn ProgressStore,
    config: &'a EngineConfig,
}

impl<'a> StudyPlanner<'a> {
    pub fn new(
        catalog: &'a dyn CatalogStore,
        learners: &'a dyn LearnerStore,
        progress: &'a dyn ProgressStore,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            catalog,
            learners,
            progress,
            config,
        }
    }

    /// Derive the full plan for a learner. `Ok(None)` when no deadline is
    /// set; `DeadlinePassed` when it already went by.
    pub async fn generate(
        &self,
        learner_id: &str,
        profile: &LearnerProfile,
        now: DateTime<Utc>,
    ) -> Result<Option<StudyPlan>, EngineError> {
        let Some(exam_date) = profile.exam_date else {
            return Ok(None);
        };
        let days_until = (exam_date - now.date_naive()).num_days();
        if days_until < 0 {
            return Err(EngineError::DeadlinePassed {
                days_overdue: -days_until,
            });
        }

        let total = total_weeks(days_until);
        let phases = phase_plan(days_until, total);

        let mut weak_points = weakness::weak_points_for(
            self.learners,
            self.catalog,
            learner_id,
            &self.config.analyzer,
        )
        .await?;
        weak_points.truncate(self.config.analyzer.top_weak);
        let has_weak = !weak_points.is_empty();

        let submissions = self
            .learners
            .submissions(learner_id, COMPLETION_SUBMISSION_WINDOW)
            .await?;
        let completed_weeks: HashSet<u32> = self
            .progress
            .weekly_progress(learner_id)
            .await?
            .into_iter()
            .filter(|p| p.completed)
            .map(|p| p.week)
            .collect();

        let mut weeks = Vec::with_capacity(total as usize);
        for week in 1..=total {
            let kind = phase_for_week(&phases, week);
            let focus = focus_for_week(week, total, kind, has_weak);
            let intensity = kind.intensity();

            let candidates = self
                .catalog
                .query_items(
                    learner_id,
                    &ItemQuery {
                        categories: focus.categories().to_vec(),
                        difficulty: Some(intensity.difficulty_range()),
                        ..Default::default()
                    },
                )
                .await?;
            let items = select_week_items(
                candidates,
                intensity.items_per_week(),
                self.config.planner.novelty_window_days,
                self.config.planner.remediation_threshold,
                now,
            );

            let mut goals: Vec<String> = goals_for(focus).iter().map(|g| g.to_string()).collect();
            if week == total {
                goals.truncate(2);
                goals.push(FINAL_WEEK_REST_GOAL.to_string());
            }

            let rate = completion_rate(&items, &submissions);
            weeks.push(WeeklyPlan {
                week,
                focus,
                intensity,
                goals,
                items,
                estimated_hours: intensity.hours_per_week(),
                completed: completed_weeks.contains(&week),
                completion_rate: rate,
            });
        }

        tracing::info!(
            learner_id,
            days_until,
            total_weeks = total,
            phases = phases.len(),
            weak_categories = weak_points.len(),
            "study plan generated"
        );

        Ok(Some(StudyPlan {
            total_weeks: total,
            current_week: current_week(days_until, total),
            weeks,
            exam_date,
            days_until_exam: days_until,
            phases,
            weak_points,
        }))
    }
}
