pub mod aggregate;
pub mod assemble;
pub mod extremes;
pub mod feedback;
pub mod generate;
pub mod normalize;
pub mod patterns;
pub mod period;

use uuid::Uuid;

/// Tunables for the analysis pipeline, injected once at startup rather
/// than scattered through the modules.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig {
    /// Scores at or above this are positive.
    pub neutral_threshold: f64,
    /// Most patterns kept in a report, ranked by impact.
    pub max_patterns: usize,
    /// Most pattern statements in the feedback list.
    pub pattern_feedback_cap: usize,
    /// Most extreme-day statements in the feedback list.
    pub extreme_feedback_cap: usize,
    /// Character budget for a day's content summary.
    pub summary_max_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            neutral_threshold: 5.0,
            max_patterns: 10,
            pattern_feedback_cap: 3,
            extreme_feedback_cap: 2,
            summary_max_chars: 100,
        }
    }
}

/// Identity fields a report is attributed to. API path fills this from the
/// verified token; batch path from the user directory. Never from request
/// parameters.
#[derive(Debug, Clone)]
pub struct ReportIdentity {
    pub user_id: Uuid,
    pub nickname: String,
    pub email: String,
}
