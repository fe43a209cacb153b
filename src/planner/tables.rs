//! The planner's decision tables: deadline band -> phase split, phase ->
//! intensity and topic rotation, focus -> weekly goals. Kept as literal
//! tables and small pure mappings so each row can be tested on its own.

use crate::types::{FocusTopic, Intensity, Phase, PhaseKind};

impl PhaseKind {
    pub fn intensity(&self) -> Intensity {
        match self {
            Self::Foundation => Intensity::Low,
            Self::Development | Self::GapFilling => Intensity::Medium,
            Self::Intensification | Self::WritingPractice | Self::IntensiveReview => {
                Intensity::High
            }
            Self::FinalReview | Self::PreExamReview | Self::FinalSprint | Self::Sprint => {
                Intensity::Critical
            }
        }
    }
}

/// Phase share tables per deadline band.
const MONTH_SPLIT: [(PhaseKind, f64); 2] = [
    (PhaseKind::IntensiveReview, 0.7),
    (PhaseKind::FinalSprint, 0.3),
];

const QUARTER_SPLIT: [(PhaseKind, f64); 3] = [
    (PhaseKind::GapFilling, 0.4),
    (PhaseKind::WritingPractice, 0.4),
    (PhaseKind::PreExamReview, 0.2),
];

const LONG_RANGE_SPLIT: [(PhaseKind, f64); 4] = [
    (PhaseKind::Foundation, 0.25),
    (PhaseKind::Development, 0.35),
    (PhaseKind::Intensification, 0.25),
    (PhaseKind::FinalReview, 0.15),
];

/// Derive the phase sequence for a deadline `days_until` days away across
/// `total_weeks` weeks. Week counts always sum to `total_weeks` exactly;
/// phases rounded down to zero weeks are dropped.
pub fn phase_plan(days_until: i64, total_weeks: u32) -> Vec<Phase> {
    if days_until <= 7 {
        return vec![Phase {
            kind: PhaseKind::Sprint,
            weeks: total_weeks,
            intensity: PhaseKind::Sprint.intensity(),
        }];
    }
    let split: &[(PhaseKind, f64)] = if days_until <= 30 {
        &MONTH_SPLIT
    } else if days_until <= 90 {
        &QUARTER_SPLIT
    } else {
        &LONG_RANGE_SPLIT
    };
    apportion(total_weeks, split)
}

/// Largest-remainder apportionment of `total` weeks over percentage
/// shares. Deterministic; ties go to the earlier phase.
fn apportion(total: u32, split: &[(PhaseKind, f64)]) -> Vec<Phase> {
    let ideals: Vec<f64> = split.iter().map(|(_, share)| total as f64 * share).collect();
    let mut weeks: Vec<u32> = ideals.iter().map(|v| v.floor() as u32).collect();
    let assigned: u32 = weeks.iter().sum();
    let mut remaining = total.saturating_sub(assigned);

    let mut order: Vec<usize> = (0..split.len()).collect();
    order.sort_by(|&a, &b| {
        let frac_a = ideals[a] - ideals[a].floor();
        let frac_b = ideals[b] - ideals[b].floor();
        frac_b
            .partial_cmp(&frac_a)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for idx in order {
        if remaining == 0 {
            break;
        }
        weeks[idx] += 1;
        remaining -= 1;
    }

    split
        .iter()
        .zip(weeks)
        .filter(|(_, w)| *w > 0)
        .map(|((kind, _), w)| Phase {
            kind: *kind,
            weeks: w,
            intensity: kind.intensity(),
        })
        .collect()
}

/// Which phase a given 1-based week falls into. Weeks past the final
/// boundary belong to the last phase.
pub fn phase_for_week(phases: &[Phase], week: u32) -> PhaseKind {
    let mut boundary = 0;
    for phase in phases {
        boundary += phase.weeks;
        if week <= boundary {
            return phase.kind;
        }
    }
    phases.last().map(|p| p.kind).unwrap_or(PhaseKind::Sprint)
}

/// Per-phase topic rotation, in order.
pub fn topics_for(kind: PhaseKind) -> &'static [FocusTopic] {
    use FocusTopic::*;
    match kind {
        PhaseKind::Foundation => &[LanguageUse, LiteraryEpochs, HistoricalLiterary],
        PhaseKind::Development => &[HistoricalLiterary, Writing, LanguageUse],
        PhaseKind::Intensification => &[Writing, WeakPoints, HistoricalLiterary],
        PhaseKind::FinalReview => &[Revision, MockExams, WeakPoints],
        PhaseKind::GapFilling => &[WeakPoints, HistoricalLiterary, LanguageUse],
        PhaseKind::WritingPractice => &[Writing, LanguageUse, HistoricalLiterary],
        PhaseKind::PreExamReview => &[Revision, MockExams],
        PhaseKind::IntensiveReview => &[Writing, WeakPoints],
        PhaseKind::FinalSprint => &[MockExams, Revision],
        PhaseKind::Sprint => &[Revision, MockExams, WeakPoints],
    }
}

pub const FINAL_WEEK_REST_GOAL: &str = "Rest the day before the exam";

/// Three goals per weekly focus.
pub fn goals_for(focus: FocusTopic) -> [&'static str; 3] {
    match focus {
        FocusTopic::LanguageUse => [
            "Master stylistic devices",
            "Practice linguistic analysis of texts",
            "Solve at least 5 tasks a day",
        ],
        FocusTopic::HistoricalLiterary => [
            "Review the literary epochs",
            "Analyse the key set texts",
            "Memorise important quotations",
        ],
        FocusTopic::Writing => [
            "Write 2 full essays",
            "Practice text interpretation",
            "Work on composition",
        ],
        FocusTopic::WeakPoints => [
            "Focus on your weakest areas",
            "Redo incorrectly solved tasks",
            "Do extra practice items",
        ],
        FocusTopic::Revision => [
            "Review all material",
            "Solve full past papers",
            "Check your level of preparation",
        ],
        FocusTopic::MockExams => [
            "Solve a complete exam paper",
            "Work under exam conditions",
            "Analyse your mistakes",
        ],
        FocusTopic::LiteraryEpochs => [
            "Review the characteristics of each epoch",
            "Learn the key dates",
            "Memorise the main representatives",
        ],
    }
}
