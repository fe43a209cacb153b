//! Adaptive practice-item selection and study scheduling.
//!
//! Two jobs: assemble a personalized item set that fills an exam blueprint
//! using weighted scoring, and derive a deadline-driven multi-week study
//! plan that adapts to a learner's measured weaknesses. Grading, content
//! authoring, HTTP, and persistence all live outside; the engine consumes
//! them through the traits in [`store`].

pub mod assembly;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod planner;
pub mod scoring;
pub mod store;
pub mod types;
pub mod usage;
pub mod weakness;

pub use config::{EngineConfig, ScoringWeights};
pub use engine::PracticeEngine;
pub use error::{EngineError, StoreError};
pub use scoring::{DiversityScorer, SeededJitter, TagCoverage};
pub use store::{CatalogStore, ItemQuery, LearnerStore, MemoryStore, ProgressStore};
pub use types::{
    CandidateItem, Category, ExamBlueprint, ExamSelection, FocusTopic, Intensity, ItemType,
    LearnerProfile, Phase, PhaseKind, PracticeItem, Requirement, StudyPlan, SubmissionRecord,
    Track, UsageContext, UsageRecord, UsageStats, WeakCategory, WeeklyPlan,
};
