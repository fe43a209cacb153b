//! Candidate ranking. A candidate starts at 100 points and four weighted
//! adjustments (recency, performance, difficulty fit, diversity) plus an
//! unweighted popularity penalty move it from there; the result never goes
//! below zero. All functions here are pure over the snapshot captured in
//! [`ScoringContext`].

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{PopularityParams, ScoringWeights};
use crate::types::{
    CandidateItem, LearnerProfile, PracticeItem, SubmissionRecord, UsageContext, UsageRecord,
};

const BASE_SCORE: f64 = 100.0;

/// Pluggable diversity bonus. Implementations return a value in [0, 20);
/// the weight applied on top comes from [`ScoringWeights::diversity`].
pub trait DiversityScorer: Send + Sync {
    fn bonus(&self, item: &PracticeItem, recent_tags: &HashSet<String>) -> f64;
}

/// Deterministic diversity: the bonus grows with the share of the item's
/// tags (and epoch) the learner has not seen recently. Two calls with the
/// same snapshot produce the same ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagCoverage;

impl DiversityScorer for TagCoverage {
    fn bonus(&self, item: &PracticeItem, recent_tags: &HashSet<String>) -> f64 {
        let mut total = item.tags.len();
        let mut fresh = item
            .tags
            .iter()
            .filter(|t| !recent_tags.contains(t.as_str()))
            .count();
        if let Some(epoch) = &item.epoch {
            total += 1;
            if !recent_tags.contains(epoch.as_str()) {
                fresh += 1;
            }
        }
        if total == 0 {
            return 0.0;
        }
        // Strictly below 20 even when every tag is fresh.
        20.0 * fresh as f64 / (total as f64 + 1.0)
    }
}

/// Reproducible stand-in for the shuffle behavior some products want: a
/// uniform jitter in [0, 20) drawn from an RNG seeded by (seed, item id).
#[derive(Debug, Clone, Copy)]
pub struct SeededJitter {
    seed: u64,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DiversityScorer for SeededJitter {
    fn bonus(&self, item: &PracticeItem, _recent_tags: &HashSet<String>) -> f64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        item.id.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        rng.random_range(0.0..20.0)
    }
}

/// Read snapshot the scorer ranks against.
pub struct ScoringContext<'a> {
    pub now: DateTime<Utc>,
    pub profile: Option<&'a LearnerProfile>,
    /// Tags (and epochs) appearing in the learner's recent submissions.
    pub recent_tags: &'a HashSet<String>,
    pub weights: ScoringWeights,
    pub popularity: PopularityParams,
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: CandidateItem,
    pub score: f64,
}

pub fn score_item(
    candidate: &CandidateItem,
    ctx: &ScoringContext<'_>,
    diversity: &dyn DiversityScorer,
) -> f64 {
    let mut score = BASE_SCORE;

    if let Some(usage) = &candidate.usage {
        score -= recency_penalty(usage, ctx.now) * ctx.weights.recency;
    }

    score += performance_bonus(&candidate.submissions) * ctx.weights.performance;

    if let Some(profile) = ctx.profile {
        score -= difficulty_fit_penalty(candidate.item.difficulty, profile) * ctx.weights.difficulty;
    }

    score += diversity.bonus(&candidate.item, ctx.recent_tags) * ctx.weights.diversity;

    score -= popularity_penalty(candidate.total_submissions, &ctx.popularity);

    score.max(0.0)
}

/// Score every candidate and sort descending. The sort is stable, so ties
/// keep the catalog's fetch order.
pub fn rank(
    candidates: Vec<CandidateItem>,
    ctx: &ScoringContext<'_>,
    diversity: &dyn DiversityScorer,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| ScoredCandidate {
            score: score_item(&candidate, ctx, diversity),
            candidate,
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Penalty for an item the learner has already seen: a days-since-last-use
/// bucket, plus frequency and exam-context surcharges.
pub fn recency_penalty(usage: &UsageRecord, now: DateTime<Utc>) -> f64 {
    let days = (now - usage.last_used_at).num_days();
    let mut penalty = match days {
        d if d < 7 => 80.0,
        d if d < 14 => 60.0,
        d if d < 30 => 40.0,
        d if d < 60 => 20.0,
        d if d < 90 => 10.0,
        _ => 0.0,
    };
    if usage.usage_count > 5 {
        penalty += 20.0;
    } else if usage.usage_count > 3 {
        penalty += 10.0;
    }
    if usage.context == UsageContext::Exam {
        penalty += 10.0;
    }
    penalty
}

/// Bonus derived from the learner's mean score on this item. Items in the
/// optimal-challenge zone rank highest; mastered or hopeless ones sink.
pub fn performance_bonus(submissions: &[SubmissionRecord]) -> f64 {
    if submissions.is_empty() {
        return 0.0;
    }
    let avg = submissions.iter().map(|s| s.score).sum::<f64>() / submissions.len() as f64;
    match avg {
        a if a < 0.5 => -10.0,
        a if a < 0.6 => 20.0,
        a if a <= 0.8 => 30.0,
        a if a <= 0.9 => 15.0,
        _ => -20.0,
    }
}

/// Distance from the track-adjusted target difficulty, 10 points per step.
pub fn difficulty_fit_penalty(difficulty: u8, profile: &LearnerProfile) -> f64 {
    let target = profile
        .level
        .saturating_add(profile.track.level_shift())
        .min(profile.track.level_cap());
    (difficulty as i16 - target as i16).unsigned_abs() as f64 * 10.0
}

pub fn popularity_penalty(total_submissions: u64, params: &PopularityParams) -> f64 {
    if total_submissions > params.heavy_threshold {
        params.heavy_penalty
    } else if total_submissions > params.light_threshold {
        params.light_penalty
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ItemType, Track};
    use chrono::Duration;

    fn item(id: &str, difficulty: u8) -> PracticeItem {
        PracticeItem {
            id: id.to_string(),
            item_type: ItemType::ShortAnswer,
            category: Category::LanguageUse,
            difficulty,
            points: 1,
            tags: vec!["metaphor".to_string(), "style".to_string()],
            epoch: None,
        }
    }

    fn usage(days_ago: i64, count: u32, context: UsageContext, now: DateTime<Utc>) -> UsageRecord {
        UsageRecord {
            learner_id: "l1".to_string(),
            item_id: "i1".to_string(),
            last_used_at: now - Duration::days(days_ago),
            usage_count: count,
            context,
        }
    }

    fn submission(score: f64, now: DateTime<Utc>) -> SubmissionRecord {
        SubmissionRecord {
            learner_id: "l1".to_string(),
            item_id: "i1".to_string(),
            score,
            rubric: None,
            submitted_at: now,
        }
    }

    fn candidate(item: PracticeItem) -> CandidateItem {
        CandidateItem {
            item,
            usage: None,
            submissions: Vec::new(),
            total_submissions: 0,
        }
    }

    fn ctx<'a>(recent_tags: &'a HashSet<String>) -> ScoringContext<'a> {
        ScoringContext {
            now: Utc::now(),
            profile: None,
            recent_tags,
            weights: ScoringWeights::default(),
            popularity: PopularityParams::default(),
        }
    }

    #[test]
    fn recency_buckets() {
        let now = Utc::now();
        let cases = [(3, 80.0), (10, 60.0), (20, 40.0), (45, 20.0), (75, 10.0), (120, 0.0)];
        for (days, expected) in cases {
            let u = usage(days, 1, UsageContext::Practice, now);
            assert_eq!(recency_penalty(&u, now), expected, "days={days}");
        }
    }

    #[test]
    fn recency_frequency_and_context_surcharges() {
        let now = Utc::now();
        assert_eq!(
            recency_penalty(&usage(120, 4, UsageContext::Practice, now), now),
            10.0
        );
        assert_eq!(
            recency_penalty(&usage(120, 6, UsageContext::Practice, now), now),
            20.0
        );
        assert_eq!(
            recency_penalty(&usage(120, 1, UsageContext::Exam, now), now),
            10.0
        );
    }

    #[test]
    fn performance_zone_rows() {
        let now = Utc::now();
        let avg = |score: f64| performance_bonus(&[submission(score, now)]);
        assert_eq!(avg(0.3), -10.0);
        assert_eq!(avg(0.55), 20.0);
        assert_eq!(avg(0.6), 30.0);
        assert_eq!(avg(0.7), 30.0);
        assert_eq!(avg(0.8), 30.0);
        assert_eq!(avg(0.85), 15.0);
        assert_eq!(avg(0.95), -20.0);
        assert_eq!(performance_bonus(&[]), 0.0);
    }

    #[test]
    fn performance_bonus_is_maximal_in_optimal_zone() {
        let now = Utc::now();
        let optimal = performance_bonus(&[submission(0.7, now)]);
        for outside in [0.2, 0.45, 0.55, 0.85, 0.95] {
            assert!(performance_bonus(&[submission(outside, now)]) < optimal);
        }
    }

    #[test]
    fn difficulty_fit_uses_track_target() {
        let profile = LearnerProfile {
            learner_id: "l1".to_string(),
            level: 4,
            average_score: 0.6,
            exam_date: None,
            track: Track::Standard,
        };
        // Standard cap is 3 even for a level-4 learner.
        assert_eq!(difficulty_fit_penalty(3, &profile), 0.0);
        assert_eq!(difficulty_fit_penalty(5, &profile), 20.0);

        let advanced = LearnerProfile {
            track: Track::Advanced,
            ..profile
        };
        // Advanced: level 4 + 1, capped at 5.
        assert_eq!(difficulty_fit_penalty(5, &advanced), 0.0);
        assert_eq!(difficulty_fit_penalty(2, &advanced), 30.0);
    }

    #[test]
    fn popularity_rows() {
        let params = PopularityParams::default();
        assert_eq!(popularity_penalty(10, &params), 0.0);
        assert_eq!(popularity_penalty(51, &params), 5.0);
        assert_eq!(popularity_penalty(101, &params), 10.0);
    }

    #[test]
    fn recently_used_scores_strictly_below_fresh() {
        let tags = HashSet::new();
        let context = ctx(&tags);

        let fresh = candidate(item("fresh", 3));
        let mut used = candidate(item("used", 3));
        used.usage = Some(usage(3, 1, UsageContext::Practice, context.now));

        let fresh_score = score_item(&fresh, &context, &TagCoverage);
        let used_score = score_item(&used, &context, &TagCoverage);
        assert!(used_score < fresh_score);
        // Bucket 80 at weight 0.4.
        assert!((fresh_score - used_score - 32.0).abs() < 1e-9);
    }

    #[test]
    fn heavily_reused_exam_item_trails_fresh_by_fixed_margin() {
        let tags = HashSet::new();
        let context = ctx(&tags);

        let fresh = candidate(item("fresh", 3));
        let mut worn = candidate(item("worn", 3));
        worn.usage = Some(usage(3, 6, UsageContext::Exam, context.now));

        let gap = score_item(&fresh, &context, &TagCoverage)
            - score_item(&worn, &context, &TagCoverage);
        // (80 recency + 20 frequency + 10 exam context) * 0.4.
        assert!(gap >= 44.0 - 1e-9);
    }

    #[test]
    fn score_never_negative() {
        let tags = HashSet::new();
        let profile = LearnerProfile {
            learner_id: "l1".to_string(),
            level: 1,
            average_score: 0.2,
            exam_date: None,
            track: Track::Standard,
        };
        let mut context = ctx(&tags);
        context.profile = Some(&profile);

        let mut worst = candidate(item("worst", 5));
        worst.usage = Some(usage(1, 9, UsageContext::Exam, context.now));
        worst.submissions = vec![submission(0.98, context.now)];
        worst.total_submissions = 500;

        assert!(score_item(&worst, &context, &TagCoverage) >= 0.0);
    }

    #[test]
    fn tag_coverage_stays_below_twenty() {
        let empty = HashSet::new();
        let all_fresh = TagCoverage.bonus(&item("a", 3), &empty);
        assert!(all_fresh > 0.0 && all_fresh < 20.0);

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert("metaphor".to_string());
        seen.insert("style".to_string());
        assert_eq!(TagCoverage.bonus(&item("a", 3), &seen), 0.0);
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let tags = HashSet::new();
        let a = SeededJitter::new(7).bonus(&item("a", 3), &tags);
        let b = SeededJitter::new(7).bonus(&item("a", 3), &tags);
        let c = SeededJitter::new(8).bonus(&item("a", 3), &tags);
        assert_eq!(a, b);
        assert!((0.0..20.0).contains(&a));
        assert!((0.0..20.0).contains(&c));
    }

    #[test]
    fn rank_is_stable_on_ties() {
        let tags = HashSet::new();
        let context = ctx(&tags);
        let ranked = rank(
            vec![candidate(item("first", 3)), candidate(item("second", 3))],
            &context,
            &TagCoverage,
        );
        assert_eq!(ranked[0].candidate.item.id, "first");
        assert_eq!(ranked[1].candidate.item.id, "second");
    }
}
