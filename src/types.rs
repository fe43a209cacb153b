use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    ClosedSingle,
    ClosedMultiple,
    ShortAnswer,
    SynthesisNote,
    Essay,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClosedSingle => "CLOSED_SINGLE",
            Self::ClosedMultiple => "CLOSED_MULTIPLE",
            Self::ShortAnswer => "SHORT_ANSWER",
            Self::SynthesisNote => "SYNTHESIS_NOTE",
            Self::Essay => "ESSAY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CLOSED_SINGLE" => Some(Self::ClosedSingle),
            "CLOSED_MULTIPLE" => Some(Self::ClosedMultiple),
            "SHORT_ANSWER" => Some(Self::ShortAnswer),
            "SYNTHESIS_NOTE" => Some(Self::SynthesisNote),
            "ESSAY" => Some(Self::Essay),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    LanguageUse,
    HistoricalLiterary,
    Writing,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LanguageUse => "LANGUAGE_USE",
            Self::HistoricalLiterary => "HISTORICAL_LITERARY",
            Self::Writing => "WRITING",
        }
    }

    pub const ALL: [Category; 3] = [
        Category::LanguageUse,
        Category::HistoricalLiterary,
        Category::Writing,
    ];
}

/// Weekly focus area. A superset of [`Category`]: the extra variants are
/// meta-topics that map onto one or more catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FocusTopic {
    LanguageUse,
    HistoricalLiterary,
    Writing,
    WeakPoints,
    Revision,
    MockExams,
    LiteraryEpochs,
}

impl FocusTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LanguageUse => "LANGUAGE_USE",
            Self::HistoricalLiterary => "HISTORICAL_LITERARY",
            Self::Writing => "WRITING",
            Self::WeakPoints => "WEAK_POINTS",
            Self::Revision => "REVISION",
            Self::MockExams => "MOCK_EXAMS",
            Self::LiteraryEpochs => "LITERARY_EPOCHS",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LanguageUse => "Language in Use",
            Self::HistoricalLiterary => "History and Literature",
            Self::Writing => "Essay Writing",
            Self::WeakPoints => "Weak Points",
            Self::Revision => "Revision",
            Self::MockExams => "Mock Exams",
            Self::LiteraryEpochs => "Literary Epochs",
        }
    }

    /// Catalog categories a weekly focus draws its items from.
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Self::LanguageUse => &[Category::LanguageUse],
            Self::HistoricalLiterary | Self::LiteraryEpochs => &[Category::HistoricalLiterary],
            Self::Writing => &[Category::Writing],
            Self::WeakPoints | Self::Revision => &Category::ALL,
            Self::MockExams => &[Category::Writing, Category::HistoricalLiterary],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageContext {
    Practice,
    Exam,
}

impl UsageContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "PRACTICE",
            Self::Exam => "EXAM",
        }
    }
}

/// Exam track. Controls the difficulty-fit target used by scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum Track {
    #[default]
    Standard,
    Advanced,
}

impl Track {
    /// Upper bound on the target difficulty for this track.
    pub fn level_cap(&self) -> u8 {
        match self {
            Self::Standard => 3,
            Self::Advanced => 5,
        }
    }

    /// Added to the learner level before capping.
    pub fn level_shift(&self) -> u8 {
        match self {
            Self::Standard => 0,
            Self::Advanced => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intensity {
    Low,
    Medium,
    High,
    Critical,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn difficulty_range(&self) -> DifficultyRange {
        match self {
            Self::Low => DifficultyRange { min: 1, max: 2 },
            Self::Medium => DifficultyRange { min: 2, max: 3 },
            Self::High => DifficultyRange { min: 3, max: 4 },
            Self::Critical => DifficultyRange { min: 3, max: 5 },
        }
    }

    pub fn items_per_week(&self) -> usize {
        match self {
            Self::Low => 21,
            Self::Medium => 35,
            Self::High => 49,
            Self::Critical => 70,
        }
    }

    pub fn hours_per_week(&self) -> f64 {
        match self {
            Self::Low => 10.5,
            Self::Medium => 14.0,
            Self::High => 21.0,
            Self::Critical => 28.0,
        }
    }
}

/// Inclusive difficulty band on the 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRange {
    pub min: u8,
    pub max: u8,
}

impl DifficultyRange {
    pub fn new(min: u8, max: u8) -> Self {
        debug_assert!((1..=5).contains(&min) && min <= max && max <= 5);
        Self { min, max }
    }

    pub fn contains(&self, difficulty: u8) -> bool {
        difficulty >= self.min && difficulty <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeItem {
    pub id: String,
    pub item_type: ItemType,
    pub category: Category,
    /// 1..=5.
    pub difficulty: u8,
    /// Catalog default; a blueprint requirement may override it per exam.
    pub points: u32,
    pub tags: Vec<String>,
    pub epoch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub learner_id: String,
    pub item_id: String,
    pub last_used_at: DateTime<Utc>,
    pub usage_count: u32,
    pub context: UsageContext,
}

/// Normalized rubric sub-scores in percent, produced by the external
/// grading collaborator for essay submissions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricScores {
    pub formal: Option<f64>,
    pub content: Option<f64>,
    pub composition: Option<f64>,
    pub language: Option<f64>,
}

impl RubricScores {
    pub fn dimension(&self, dim: RubricDimension) -> Option<f64> {
        match dim {
            RubricDimension::Formal => self.formal,
            RubricDimension::Content => self.content,
            RubricDimension::Composition => self.composition,
            RubricDimension::Language => self.language,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RubricDimension {
    Formal,
    Content,
    Composition,
    Language,
}

impl RubricDimension {
    pub const ALL: [RubricDimension; 4] = [
        RubricDimension::Formal,
        RubricDimension::Content,
        RubricDimension::Composition,
        RubricDimension::Language,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Content => "content",
            Self::Composition => "composition",
            Self::Language => "language",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub learner_id: String,
    pub item_id: String,
    /// Normalized to [0, 1].
    pub score: f64,
    pub rubric: Option<RubricScores>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub learner_id: String,
    pub level: u8,
    pub average_score: f64,
    pub exam_date: Option<NaiveDate>,
    pub track: Track,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub item_type: ItemType,
    pub category: Option<Category>,
    pub difficulty: DifficultyRange,
    /// How many items this requirement contributes. Always >= 1.
    pub count: usize,
    /// Effective point value stamped onto each selected item.
    pub points: u32,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintSection {
    pub key: String,
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamBlueprint {
    pub name: String,
    pub track: Track,
    pub sections: Vec<BlueprintSection>,
}

impl ExamBlueprint {
    /// Total item count the blueprint asks for.
    pub fn requested_items(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.requirements)
            .map(|r| r.count)
            .sum()
    }

    /// The standard-track mock exam: three sections mirroring the paper
    /// layout (language in use, literary-history test, essay).
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            track: Track::Standard,
            sections: vec![
                BlueprintSection {
                    key: "paper1_part1".to_string(),
                    requirements: vec![
                        Requirement {
                            item_type: ItemType::ShortAnswer,
                            category: Some(Category::LanguageUse),
                            difficulty: DifficultyRange::new(1, 3),
                            count: 3,
                            points: 1,
                            tags: None,
                        },
                        Requirement {
                            item_type: ItemType::SynthesisNote,
                            category: Some(Category::LanguageUse),
                            difficulty: DifficultyRange::new(2, 4),
                            count: 1,
                            points: 4,
                            tags: None,
                        },
                        Requirement {
                            item_type: ItemType::ClosedMultiple,
                            category: Some(Category::LanguageUse),
                            difficulty: DifficultyRange::new(2, 3),
                            count: 1,
                            points: 1,
                            tags: None,
                        },
                    ],
                },
                BlueprintSection {
                    key: "paper1_part2".to_string(),
                    requirements: vec![
                        Requirement {
                            item_type: ItemType::ClosedSingle,
                            category: Some(Category::HistoricalLiterary),
                            difficulty: DifficultyRange::new(1, 3),
                            count: 10,
                            points: 1,
                            tags: None,
                        },
                        Requirement {
                            item_type: ItemType::ClosedMultiple,
                            category: Some(Category::HistoricalLiterary),
                            difficulty: DifficultyRange::new(2, 4),
                            count: 3,
                            points: 1,
                            tags: None,
                        },
                        Requirement {
                            item_type: ItemType::ShortAnswer,
                            category: Some(Category::HistoricalLiterary),
                            difficulty: DifficultyRange::new(2, 4),
                            count: 2,
                            points: 1,
                            tags: None,
                        },
                    ],
                },
                BlueprintSection {
                    key: "paper2".to_string(),
                    requirements: vec![Requirement {
                        item_type: ItemType::Essay,
                        category: Some(Category::Writing),
                        difficulty: DifficultyRange::new(3, 5),
                        count: 1,
                        points: 35,
                        tags: None,
                    }],
                },
            ],
        }
    }

    /// The advanced-track mock exam.
    pub fn advanced() -> Self {
        Self {
            name: "advanced".to_string(),
            track: Track::Advanced,
            sections: vec![
                BlueprintSection {
                    key: "paper1_part1".to_string(),
                    requirements: vec![
                        Requirement {
                            item_type: ItemType::ShortAnswer,
                            category: Some(Category::LanguageUse),
                            difficulty: DifficultyRange::new(3, 5),
                            count: 4,
                            points: 2,
                            tags: None,
                        },
                        Requirement {
                            item_type: ItemType::SynthesisNote,
                            category: Some(Category::LanguageUse),
                            difficulty: DifficultyRange::new(4, 5),
                            count: 2,
                            points: 5,
                            tags: None,
                        },
                    ],
                },
                BlueprintSection {
                    key: "paper1_part2".to_string(),
                    requirements: vec![
                        Requirement {
                            item_type: ItemType::ClosedSingle,
                            category: Some(Category::HistoricalLiterary),
                            difficulty: DifficultyRange::new(3, 5),
                            count: 8,
                            points: 1,
                            tags: None,
                        },
                        Requirement {
                            item_type: ItemType::ClosedMultiple,
                            category: Some(Category::HistoricalLiterary),
                            difficulty: DifficultyRange::new(3, 5),
                            count: 4,
                            points: 2,
                            tags: None,
                        },
                        Requirement {
                            item_type: ItemType::ShortAnswer,
                            category: Some(Category::HistoricalLiterary),
                            difficulty: DifficultyRange::new(4, 5),
                            count: 5,
                            points: 2,
                            tags: None,
                        },
                    ],
                },
                BlueprintSection {
                    key: "paper2".to_string(),
                    requirements: vec![Requirement {
                        item_type: ItemType::Essay,
                        category: Some(Category::Writing),
                        difficulty: DifficultyRange::new(4, 5),
                        count: 1,
                        points: 40,
                        tags: None,
                    }],
                },
            ],
        }
    }
}

/// A catalog item with the point value the blueprint requirement assigned
/// to it for this exam instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItem {
    pub item: PracticeItem,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub section_key: String,
    pub item_type: ItemType,
    pub category: Option<Category>,
    pub requested: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSelection {
    pub key: String,
    pub items: Vec<SelectedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSelection {
    pub sections: Vec<SectionSelection>,
    pub shortfalls: Vec<Shortfall>,
}

impl ExamSelection {
    pub fn total_items(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn item_ids(&self) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.item.id.clone()))
            .collect()
    }
}

/// One row of a catalog query: the item plus the learner-scoped history the
/// scoring engine consumes, and the global submission count that feeds the
/// popularity penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    pub item: PracticeItem,
    pub usage: Option<UsageRecord>,
    pub submissions: Vec<SubmissionRecord>,
    pub total_submissions: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_used: u64,
    pub recently_used: u64,
    pub frequently_used: u64,
    pub by_category: HashMap<Category, u64>,
    pub by_type: HashMap<ItemType, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakCategory {
    pub category: Category,
    /// Mean normalized score over the analysis window, in percent.
    pub average_score: f64,
    pub weak_dimensions: Vec<RubricDimension>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekProgress {
    NotStarted,
    InProgress,
    Completed,
}

impl WeekProgress {
    /// Classify an attempted fraction against the completion threshold.
    pub fn from_fraction(fraction: f64, threshold: f64) -> Self {
        if fraction >= threshold {
            Self::Completed
        } else if fraction > 0.0 {
            Self::InProgress
        } else {
            Self::NotStarted
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseKind {
    Sprint,
    IntensiveReview,
    FinalSprint,
    GapFilling,
    WritingPractice,
    PreExamReview,
    Foundation,
    Development,
    Intensification,
    FinalReview,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sprint => "SPRINT",
            Self::IntensiveReview => "INTENSIVE_REVIEW",
            Self::FinalSprint => "FINAL_SPRINT",
            Self::GapFilling => "GAP_FILLING",
            Self::WritingPractice => "WRITING_PRACTICE",
            Self::PreExamReview => "PRE_EXAM_REVIEW",
            Self::Foundation => "FOUNDATION",
            Self::Development => "DEVELOPMENT",
            Self::Intensification => "INTENSIFICATION",
            Self::FinalReview => "FINAL_REVIEW",
        }
    }
}

/// A contiguous block of weeks sharing one intensity regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub kind: PhaseKind,
    pub weeks: u32,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub week: u32,
    pub focus: FocusTopic,
    pub intensity: Intensity,
    pub goals: Vec<String>,
    pub items: Vec<PracticeItem>,
    pub estimated_hours: f64,
    pub completed: bool,
    /// Fraction of the week's items the learner has attempted, in [0, 1].
    pub completion_rate: f64,
}

impl WeeklyPlan {
    pub fn progress(&self, threshold: f64) -> WeekProgress {
        if self.completed {
            WeekProgress::Completed
        } else {
            WeekProgress::from_fraction(self.completion_rate, threshold)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub total_weeks: u32,
    pub current_week: u32,
    pub weeks: Vec<WeeklyPlan>,
    pub exam_date: NaiveDate,
    pub days_until_exam: i64,
    pub phases: Vec<Phase>,
    pub weak_points: Vec<WeakCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgressRecord {
    pub learner_id: String,
    pub week: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_round_trip() {
        for t in [
            ItemType::ClosedSingle,
            ItemType::ClosedMultiple,
            ItemType::ShortAnswer,
            ItemType::SynthesisNote,
            ItemType::Essay,
        ] {
            assert_eq!(ItemType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ItemType::parse("OPEN_ENDED"), None);
    }

    #[test]
    fn track_caps() {
        assert_eq!(Track::Standard.level_cap(), 3);
        assert_eq!(Track::Standard.level_shift(), 0);
        assert_eq!(Track::Advanced.level_cap(), 5);
        assert_eq!(Track::Advanced.level_shift(), 1);
    }

    #[test]
    fn intensity_row_low() {
        assert_eq!(Intensity::Low.difficulty_range(), DifficultyRange::new(1, 2));
        assert_eq!(Intensity::Low.items_per_week(), 21);
        assert_eq!(Intensity::Low.hours_per_week(), 10.5);
    }

    #[test]
    fn intensity_row_medium() {
        assert_eq!(
            Intensity::Medium.difficulty_range(),
            DifficultyRange::new(2, 3)
        );
        assert_eq!(Intensity::Medium.items_per_week(), 35);
        assert_eq!(Intensity::Medium.hours_per_week(), 14.0);
    }

    #[test]
    fn intensity_row_high() {
        assert_eq!(
            Intensity::High.difficulty_range(),
            DifficultyRange::new(3, 4)
        );
        assert_eq!(Intensity::High.items_per_week(), 49);
        assert_eq!(Intensity::High.hours_per_week(), 21.0);
    }

    #[test]
    fn intensity_row_critical() {
        assert_eq!(
            Intensity::Critical.difficulty_range(),
            DifficultyRange::new(3, 5)
        );
        assert_eq!(Intensity::Critical.items_per_week(), 70);
        assert_eq!(Intensity::Critical.hours_per_week(), 28.0);
    }

    #[test]
    fn focus_category_mapping() {
        assert_eq!(FocusTopic::WeakPoints.categories(), &Category::ALL);
        assert_eq!(FocusTopic::Revision.categories(), &Category::ALL);
        assert_eq!(
            FocusTopic::MockExams.categories(),
            &[Category::Writing, Category::HistoricalLiterary]
        );
        assert_eq!(
            FocusTopic::LiteraryEpochs.categories(),
            &[Category::HistoricalLiterary]
        );
    }

    #[test]
    fn blueprint_presets_request_expected_totals() {
        assert_eq!(ExamBlueprint::standard().requested_items(), 21);
        assert_eq!(ExamBlueprint::advanced().requested_items(), 24);
        assert_eq!(ExamBlueprint::standard().sections.len(), 3);
        assert_eq!(ExamBlueprint::advanced().track, Track::Advanced);
    }

    #[test]
    fn week_progress_classification() {
        assert_eq!(
            WeekProgress::from_fraction(0.0, 0.8),
            WeekProgress::NotStarted
        );
        assert_eq!(
            WeekProgress::from_fraction(0.5, 0.8),
            WeekProgress::InProgress
        );
        assert_eq!(
            WeekProgress::from_fraction(0.8, 0.8),
            WeekProgress::Completed
        );
    }
}
