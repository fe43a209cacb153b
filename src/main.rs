//! Demo entry point: seeds the in-memory store with a small catalog and one
//! learner, then exercises each engine operation once.

use std::sync::Arc;

use chrono::{Duration, Utc};

use matura_practice_engine::logging;
use matura_practice_engine::types::{RubricScores, SubmissionRecord};
use matura_practice_engine::{
    Category, EngineConfig, ExamBlueprint, ItemType, LearnerProfile, MemoryStore, PracticeEngine,
    PracticeItem, Track,
};

const LEARNER: &str = "learner-demo";

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _log_guard = logging::init_tracing(&log_level);

    let config = EngineConfig::from_env();
    let store = Arc::new(MemoryStore::new());
    seed(&store);

    let engine = PracticeEngine::with_shared_store(Arc::clone(&store), config);

    let blueprint = ExamBlueprint::standard();
    match engine.select_items_for_exam(LEARNER, &blueprint).await {
        Ok(selection) => {
            for section in &selection.sections {
                tracing::info!(
                    section = %section.key,
                    items = section.items.len(),
                    "section filled"
                );
            }
            for shortfall in &selection.shortfalls {
                tracing::warn!(
                    section = %shortfall.section_key,
                    item_type = shortfall.item_type.as_str(),
                    missing = shortfall.missing,
                    "shortfall"
                );
            }
            tracing::debug!(
                selection = %serde_json::to_string(&selection).unwrap_or_default(),
                "assembled exam"
            );

            let session_id = uuid::Uuid::new_v4().to_string();
            if let Err(err) = engine
                .record_exam_usage(LEARNER, &session_id, &selection.item_ids())
                .await
            {
                tracing::error!(error = %err, "usage recording failed");
            }
        }
        Err(err) => tracing::error!(error = %err, "exam assembly failed"),
    }

    match engine.learner_item_stats(LEARNER).await {
        Ok(stats) => tracing::info!(
            total_used = stats.total_used,
            recently_used = stats.recently_used,
            "usage stats"
        ),
        Err(err) => tracing::error!(error = %err, "stats failed"),
    }

    match engine.generate_study_plan(LEARNER).await {
        Ok(Some(plan)) => {
            tracing::info!(
                total_weeks = plan.total_weeks,
                days_until_exam = plan.days_until_exam,
                phases = plan.phases.len(),
                weak_categories = plan.weak_points.len(),
                "study plan"
            );
            for week in plan.weeks.iter().take(4) {
                tracing::info!(
                    week = week.week,
                    focus = week.focus.display_name(),
                    intensity = week.intensity.as_str(),
                    items = week.items.len(),
                    hours = week.estimated_hours,
                    "week"
                );
            }
        }
        Ok(None) => tracing::info!("no deadline set, no plan"),
        Err(err) => tracing::error!(error = %err, "plan generation failed"),
    }

    if let Err(err) = engine
        .update_weekly_progress(LEARNER, 1, "lang-sa-0", 0.8)
        .await
    {
        tracing::error!(error = %err, "progress update failed");
    }
}

/// A compact catalog: enough spread over types, categories, and
/// difficulties to fill the standard blueprint and a few plan weeks.
fn seed(store: &MemoryStore) {
    let epochs = ["romanticism", "positivism", "modernism"];
    for i in 0..12 {
        store.insert_item(PracticeItem {
            id: format!("lang-sa-{i}"),
            item_type: ItemType::ShortAnswer,
            category: Category::LanguageUse,
            difficulty: 1 + (i % 3) as u8,
            points: 1,
            tags: vec!["style".to_string(), format!("device-{}", i % 4)],
            epoch: None,
        });
    }
    for i in 0..4 {
        store.insert_item(PracticeItem {
            id: format!("lang-syn-{i}"),
            item_type: ItemType::SynthesisNote,
            category: Category::LanguageUse,
            difficulty: 2 + (i % 3) as u8,
            points: 4,
            tags: vec!["synthesis".to_string()],
            epoch: None,
        });
    }
    for i in 0..6 {
        store.insert_item(PracticeItem {
            id: format!("lang-cm-{i}"),
            item_type: ItemType::ClosedMultiple,
            category: Category::LanguageUse,
            difficulty: 2 + (i % 2) as u8,
            points: 1,
            tags: vec!["grammar".to_string()],
            epoch: None,
        });
    }
    for i in 0..16 {
        store.insert_item(PracticeItem {
            id: format!("hist-cs-{i}"),
            item_type: ItemType::ClosedSingle,
            category: Category::HistoricalLiterary,
            difficulty: 1 + (i % 3) as u8,
            points: 1,
            tags: vec!["set-text".to_string()],
            epoch: Some(epochs[i % epochs.len()].to_string()),
        });
    }
    for i in 0..6 {
        store.insert_item(PracticeItem {
            id: format!("hist-cm-{i}"),
            item_type: ItemType::ClosedMultiple,
            category: Category::HistoricalLiterary,
            difficulty: 2 + (i % 3) as u8,
            points: 1,
            tags: vec!["epochs".to_string()],
            epoch: Some(epochs[i % epochs.len()].to_string()),
        });
    }
    for i in 0..6 {
        store.insert_item(PracticeItem {
            id: format!("hist-sa-{i}"),
            item_type: ItemType::ShortAnswer,
            category: Category::HistoricalLiterary,
            difficulty: 2 + (i % 3) as u8,
            points: 1,
            tags: vec!["quotation".to_string()],
            epoch: Some(epochs[i % epochs.len()].to_string()),
        });
    }
    for i in 0..4 {
        store.insert_item(PracticeItem {
            id: format!("essay-{i}"),
            item_type: ItemType::Essay,
            category: Category::Writing,
            difficulty: 3 + (i % 3) as u8,
            points: 35,
            tags: vec!["interpretation".to_string()],
            epoch: None,
        });
    }

    store.insert_profile(LearnerProfile {
        learner_id: LEARNER.to_string(),
        level: 2,
        average_score: 0.58,
        exam_date: Some(Utc::now().date_naive() + Duration::days(75)),
        track: Track::Standard,
    });

    let now = Utc::now();
    for (i, (item_id, score)) in [
        ("hist-cs-0", 0.4),
        ("hist-cs-1", 0.5),
        ("lang-sa-0", 0.7),
        ("essay-0", 0.55),
    ]
    .iter()
    .enumerate()
    {
        store.push_submission(SubmissionRecord {
            learner_id: LEARNER.to_string(),
            item_id: item_id.to_string(),
            score: *score,
            rubric: if item_id.starts_with("essay") {
                Some(RubricScores {
                    formal: Some(60.0),
                    content: Some(45.0),
                    composition: Some(40.0),
                    language: Some(70.0),
                })
            } else {
                None
            },
            submitted_at: now - Duration::days(3 + i as i64),
        });
    }
}
