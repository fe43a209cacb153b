//! Aggregates a learner's recent submissions into ranked weak categories,
//! with rubric-dimension flags for essay work. The window is bounded (most
//! recent submissions only) so one bad month a year ago does not haunt the
//! plan forever.

use std::collections::HashMap;

use crate::config::AnalyzerParams;
use crate::error::StoreError;
use crate::store::{CatalogStore, LearnerStore};
use crate::types::{Category, RubricDimension, SubmissionRecord, WeakCategory};

#[derive(Default)]
struct CategoryAccumulator {
    score_sum: f64,
    score_count: usize,
    dimension_sums: HashMap<RubricDimension, (f64, usize)>,
}

/// Rank categories from weakest to strongest over the given submissions.
/// `categories` maps item id -> category; submissions for unknown items are
/// skipped. A rubric dimension is flagged weak when its average over the
/// window falls below `params.dimension_threshold` percent.
pub fn analyze_weak_points(
    submissions: &[SubmissionRecord],
    categories: &HashMap<String, Category>,
    params: &AnalyzerParams,
) -> Vec<WeakCategory> {
    let mut accumulators: HashMap<Category, CategoryAccumulator> = HashMap::new();

    for submission in submissions.iter().take(params.window) {
        let Some(category) = categories.get(&submission.item_id) else {
            continue;
        };
        let acc = accumulators.entry(*category).or_default();
        acc.score_sum += submission.score;
        acc.score_count += 1;

        if let Some(rubric) = &submission.rubric {
            for dim in RubricDimension::ALL {
                if let Some(value) = rubric.dimension(dim) {
                    let entry = acc.dimension_sums.entry(dim).or_insert((0.0, 0));
                    entry.0 += value;
                    entry.1 += 1;
                }
            }
        }
    }

    let mut ranked: Vec<WeakCategory> = accumulators
        .into_iter()
        .map(|(category, acc)| {
            let average_score = if acc.score_count > 0 {
                (acc.score_sum / acc.score_count as f64 * 100.0).round()
            } else {
                0.0
            };
            let mut weak_dimensions: Vec<RubricDimension> = RubricDimension::ALL
                .into_iter()
                .filter(|dim| {
                    acc.dimension_sums
                        .get(dim)
                        .map(|(sum, count)| sum / (*count as f64) < params.dimension_threshold)
                        .unwrap_or(false)
                })
                .collect();
            weak_dimensions.sort_by_key(|d| d.as_str());
            WeakCategory {
                category,
                average_score,
                weak_dimensions,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.average_score
            .partial_cmp(&b.average_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    ranked
}

/// Fetch the learner's window and run the analysis. Returns the full
/// ranking; callers usually keep the first `params.top_weak` entries.
pub async fn weak_points_for(
    learners: &dyn LearnerStore,
    catalog: &dyn CatalogStore,
    learner_id: &str,
    params: &AnalyzerParams,
) -> Result<Vec<WeakCategory>, StoreError> {
    let submissions = learners.submissions(learner_id, params.window).await?;
    let ids: Vec<String> = submissions.iter().map(|s| s.item_id.clone()).collect();
    let categories: HashMap<String, Category> = catalog
        .items_by_ids(&ids)
        .await?
        .into_iter()
        .map(|item| (item.id, item.category))
        .collect();
    Ok(analyze_weak_points(&submissions, &categories, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RubricScores;
    use chrono::Utc;

    fn submission(item_id: &str, score: f64, rubric: Option<RubricScores>) -> SubmissionRecord {
        SubmissionRecord {
            learner_id: "l1".to_string(),
            item_id: item_id.to_string(),
            score,
            rubric,
            submitted_at: Utc::now(),
        }
    }

    fn categories() -> HashMap<String, Category> {
        [
            ("lang".to_string(), Category::LanguageUse),
            ("hist".to_string(), Category::HistoricalLiterary),
            ("essay".to_string(), Category::Writing),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn weakest_category_ranks_first() {
        let subs = vec![
            submission("lang", 0.9, None),
            submission("hist", 0.3, None),
            submission("hist", 0.5, None),
            submission("essay", 0.6, None),
        ];
        let ranked = analyze_weak_points(&subs, &categories(), &AnalyzerParams::default());

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].category, Category::HistoricalLiterary);
        assert_eq!(ranked[0].average_score, 40.0);
        assert_eq!(ranked[2].category, Category::LanguageUse);
    }

    #[test]
    fn rubric_dimension_below_threshold_is_flagged() {
        let weak_composition = RubricScores {
            formal: Some(70.0),
            content: Some(65.0),
            composition: Some(30.0),
            language: Some(55.0),
        };
        let subs = vec![
            submission("essay", 0.5, Some(weak_composition)),
            submission(
                "essay",
                0.6,
                Some(RubricScores {
                    composition: Some(40.0),
                    ..Default::default()
                }),
            ),
        ];
        let ranked = analyze_weak_points(&subs, &categories(), &AnalyzerParams::default());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].weak_dimensions, vec![RubricDimension::Composition]);
    }

    #[test]
    fn window_bounds_the_analysis() {
        let params = AnalyzerParams {
            window: 2,
            ..Default::default()
        };
        // Only the first two (most recent) submissions count.
        let subs = vec![
            submission("lang", 1.0, None),
            submission("lang", 1.0, None),
            submission("lang", 0.0, None),
        ];
        let ranked = analyze_weak_points(&subs, &categories(), &params);
        assert_eq!(ranked[0].average_score, 100.0);
    }

    #[test]
    fn unknown_items_are_skipped() {
        let subs = vec![submission("ghost", 0.1, None)];
        let ranked = analyze_weak_points(&subs, &categories(), &AnalyzerParams::default());
        assert!(ranked.is_empty());
    }
}
