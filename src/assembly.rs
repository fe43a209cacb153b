//! Walks an exam blueprint section by section, requirement by requirement,
//! ranking catalog candidates and selecting the top of each pool while
//! keeping a cross-section exclusion set so no item appears twice in one
//! exam. Coming up short is reported, never fatal.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::error::StoreError;
use crate::scoring::{rank, DiversityScorer, ScoringContext};
use crate::store::{CatalogStore, ItemQuery};
use crate::types::{
    CandidateItem, ExamBlueprint, ExamSelection, LearnerProfile, Requirement, SectionSelection,
    SelectedItem, Shortfall,
};

pub struct TemplateAssembler<'a> {
    catalog: &'a dyn CatalogStore,
    diversity: &'a dyn DiversityScorer,
    config: &'a EngineConfig,
}

impl<'a> TemplateAssembler<'a> {
    pub fn new(
        catalog: &'a dyn CatalogStore,
        diversity: &'a dyn DiversityScorer,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            catalog,
            diversity,
            config,
        }
    }

    pub async fn assemble(
        &self,
        learner_id: &str,
        blueprint: &ExamBlueprint,
        profile: Option<&LearnerProfile>,
        recent_tags: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<ExamSelection, StoreError> {
        let ctx = ScoringContext {
            now,
            profile,
            recent_tags,
            weights: self.config.weights,
            popularity: self.config.popularity,
        };

        let mut chosen_ids: HashSet<String> = HashSet::new();
        let mut sections = Vec::with_capacity(blueprint.sections.len());
        let mut shortfalls = Vec::new();

        for section in &blueprint.sections {
            let mut items = Vec::new();

            for requirement in &section.requirements {
                let candidates = self
                    .catalog
                    .query_items(learner_id, &requirement_query(requirement))
                    .await?;
                let candidates: Vec<CandidateItem> = candidates
                    .into_iter()
                    .filter(|c| !chosen_ids.contains(&c.item.id))
                    .collect();

                let pool = relaxed_pool(candidates, requirement.count, now);
                let ranked = rank(pool, &ctx, self.diversity);

                let selected: Vec<SelectedItem> = ranked
                    .into_iter()
                    .take(requirement.count)
                    .map(|scored| SelectedItem {
                        item: scored.candidate.item,
                        points: requirement.points,
                    })
                    .collect();

                if selected.len() < requirement.count {
                    tracing::warn!(
                        section = %section.key,
                        item_type = requirement.item_type.as_str(),
                        requested = requirement.count,
                        available = selected.len(),
                        "candidate pool could not fill requirement"
                    );
                    shortfalls.push(Shortfall {
                        section_key: section.key.clone(),
                        item_type: requirement.item_type,
                        category: requirement.category,
                        requested: requirement.count,
                        missing: requirement.count - selected.len(),
                    });
                }

                chosen_ids.extend(selected.iter().map(|s| s.item.id.clone()));
                items.extend(selected);
            }

            sections.push(SectionSelection {
                key: section.key.clone(),
                items,
            });
        }

        Ok(ExamSelection {
            sections,
            shortfalls,
        })
    }
}

fn requirement_query(requirement: &Requirement) -> ItemQuery {
    ItemQuery {
        item_type: Some(requirement.item_type),
        categories: requirement.category.into_iter().collect(),
        difficulty: Some(requirement.difficulty),
        required_tags: requirement.tags.clone(),
    }
}

/// Freshness relaxation ladder. Prefer items the learner has never used;
/// widen to long-unused (>30d), then week-old (>7d), and finally the whole
/// pool — stopping at the first rung that can fill the requirement.
pub fn relaxed_pool(
    candidates: Vec<CandidateItem>,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<CandidateItem> {
    let days_since = |c: &CandidateItem| -> Option<i64> {
        c.usage.as_ref().map(|u| (now - u.last_used_at).num_days())
    };

    for min_days in [None, Some(30), Some(7)] {
        let rung: Vec<CandidateItem> = candidates
            .iter()
            .filter(|c| match (days_since(c), min_days) {
                (None, _) => true,
                (Some(days), Some(min)) => days > min,
                (Some(_), None) => false,
            })
            .cloned()
            .collect();
        if rung.len() >= count {
            return rung;
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::TagCoverage;
    use crate::store::MemoryStore;
    use crate::types::{
        BlueprintSection, Category, DifficultyRange, ItemType, Track, UsageContext, UsageRecord,
    };
    use chrono::Duration;

    fn item(id: &str, item_type: ItemType, category: Category, difficulty: u8) -> CandidateItem {
        CandidateItem {
            item: crate::types::PracticeItem {
                id: id.to_string(),
                item_type,
                category,
                difficulty,
                points: 1,
                tags: Vec::new(),
                epoch: None,
            },
            usage: None,
            submissions: Vec::new(),
            total_submissions: 0,
        }
    }

    fn used(mut candidate: CandidateItem, days_ago: i64, now: DateTime<Utc>) -> CandidateItem {
        candidate.usage = Some(UsageRecord {
            learner_id: "l1".to_string(),
            item_id: candidate.item.id.clone(),
            last_used_at: now - Duration::days(days_ago),
            usage_count: 1,
            context: UsageContext::Practice,
        });
        candidate
    }

    #[test]
    fn ladder_prefers_never_used() {
        let now = Utc::now();
        let fresh = item("fresh", ItemType::ShortAnswer, Category::LanguageUse, 2);
        let stale = used(
            item("stale", ItemType::ShortAnswer, Category::LanguageUse, 2),
            40,
            now,
        );
        let pool = relaxed_pool(vec![stale, fresh.clone()], 1, now);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].item.id, "fresh");
    }

    #[test]
    fn ladder_widens_until_it_can_fill() {
        let now = Utc::now();
        let fresh = item("fresh", ItemType::ShortAnswer, Category::LanguageUse, 2);
        let old = used(
            item("old", ItemType::ShortAnswer, Category::LanguageUse, 2),
            40,
            now,
        );
        let recent = used(
            item("recent", ItemType::ShortAnswer, Category::LanguageUse, 2),
            10,
            now,
        );
        let yesterday = used(
            item("yesterday", ItemType::ShortAnswer, Category::LanguageUse, 2),
            1,
            now,
        );

        let all = vec![fresh, old, recent, yesterday];
        // Two needed: never-used rung has 1, >30d rung has 2.
        let pool = relaxed_pool(all.clone(), 2, now);
        assert_eq!(pool.len(), 2);
        // Four needed: only the unrestricted rung has enough.
        let pool = relaxed_pool(all, 4, now);
        assert_eq!(pool.len(), 4);
    }

    fn seed_catalog(store: &MemoryStore, count: usize) {
        for i in 0..count {
            store.insert_item(crate::types::PracticeItem {
                id: format!("sa-{i}"),
                item_type: ItemType::ShortAnswer,
                category: Category::LanguageUse,
                difficulty: 2,
                points: 1,
                tags: vec!["grammar".to_string()],
                epoch: None,
            });
        }
    }

    fn single_requirement_blueprint(count: usize) -> ExamBlueprint {
        ExamBlueprint {
            name: "test".to_string(),
            track: Track::Standard,
            sections: vec![BlueprintSection {
                key: "s1".to_string(),
                requirements: vec![Requirement {
                    item_type: ItemType::ShortAnswer,
                    category: Some(Category::LanguageUse),
                    difficulty: DifficultyRange::new(2, 3),
                    count,
                    points: 2,
                    tags: None,
                }],
            }],
        }
    }

    #[tokio::test]
    async fn shortfall_reported_when_pool_is_small() {
        let store = MemoryStore::new();
        seed_catalog(&store, 3);
        let config = EngineConfig::default();
        let assembler = TemplateAssembler::new(&store, &TagCoverage, &config);

        let outcome = assembler
            .assemble(
                "l1",
                &single_requirement_blueprint(5),
                None,
                &HashSet::new(),
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.sections[0].items.len(), 3);
        assert_eq!(outcome.shortfalls.len(), 1);
        assert_eq!(outcome.shortfalls[0].requested, 5);
        assert_eq!(outcome.shortfalls[0].missing, 2);
    }

    #[tokio::test]
    async fn requirement_points_override_catalog_points() {
        let store = MemoryStore::new();
        seed_catalog(&store, 2);
        let config = EngineConfig::default();
        let assembler = TemplateAssembler::new(&store, &TagCoverage, &config);

        let outcome = assembler
            .assemble(
                "l1",
                &single_requirement_blueprint(2),
                None,
                &HashSet::new(),
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(outcome.sections[0].items.iter().all(|s| s.points == 2));
    }

    #[tokio::test]
    async fn no_item_repeats_across_requirements() {
        let store = MemoryStore::new();
        seed_catalog(&store, 4);
        let config = EngineConfig::default();
        let assembler = TemplateAssembler::new(&store, &TagCoverage, &config);

        // Two requirements drawing from the same pool of four.
        let mut blueprint = single_requirement_blueprint(3);
        let repeated = blueprint.sections[0].requirements[0].clone();
        blueprint.sections[0].requirements.push(repeated);

        let outcome = assembler
            .assemble("l1", &blueprint, None, &HashSet::new(), Utc::now())
            .await
            .unwrap();

        let ids = outcome.item_ids();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(unique.len(), ids.len());
        assert_eq!(outcome.shortfalls[0].missing, 2);
    }
}
