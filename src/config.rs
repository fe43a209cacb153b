use serde::{Deserialize, Serialize};

/// Relative weights of the four scoring adjustments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub recency: f64,
    pub performance: f64,
    pub difficulty: f64,
    pub diversity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            recency: 0.4,
            performance: 0.3,
            difficulty: 0.2,
            diversity: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularityParams {
    /// Total submissions (all learners) above which the heavy penalty applies.
    pub heavy_threshold: u64,
    pub heavy_penalty: f64,
    pub light_threshold: u64,
    pub light_penalty: f64,
}

impl Default for PopularityParams {
    fn default() -> Self {
        Self {
            heavy_threshold: 100,
            heavy_penalty: 10.0,
            light_threshold: 50,
            light_penalty: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerParams {
    /// Submission window, most recent first.
    pub window: usize,
    /// A rubric dimension averaging below this percentage is weak.
    pub dimension_threshold: f64,
    /// How many of the weakest categories the planner focuses on.
    pub top_weak: usize,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            window: 50,
            dimension_threshold: 50.0,
            top_weak: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerParams {
    /// Items solved within this many days are excluded from a week's novel pool.
    pub novelty_window_days: i64,
    /// Past attempts below this normalized score qualify for remediation backfill.
    pub remediation_threshold: f64,
    /// Attempted fraction at which a week counts as completed.
    pub completion_threshold: f64,
    /// How many of a learner's latest submissions seed the recent-tag set.
    pub recent_tag_window: usize,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            novelty_window_days: 14,
            remediation_threshold: 0.7,
            completion_threshold: 0.8,
            recent_tag_window: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub weights: ScoringWeights,
    pub popularity: PopularityParams,
    pub analyzer: AnalyzerParams,
    pub planner: PlannerParams,
}

impl EngineConfig {
    /// Defaults overridden by `ENGINE_*` environment variables where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_f64("ENGINE_RECENCY_WEIGHT") {
            config.weights.recency = v;
        }
        if let Some(v) = env_f64("ENGINE_PERFORMANCE_WEIGHT") {
            config.weights.performance = v;
        }
        if let Some(v) = env_f64("ENGINE_DIFFICULTY_WEIGHT") {
            config.weights.difficulty = v;
        }
        if let Some(v) = env_f64("ENGINE_DIVERSITY_WEIGHT") {
            config.weights.diversity = v;
        }
        config
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_match_documented_values() {
        let w = ScoringWeights::default();
        assert_eq!(w.recency, 0.4);
        assert_eq!(w.performance, 0.3);
        assert_eq!(w.difficulty, 0.2);
        assert_eq!(w.diversity, 0.1);
    }

    #[test]
    fn popularity_defaults() {
        let p = PopularityParams::default();
        assert_eq!(p.heavy_threshold, 100);
        assert_eq!(p.light_threshold, 50);
    }
}
