use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "evaluation", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    Positive,
    Negative,
}

impl Evaluation {
    pub fn label(&self) -> &'static str {
        match self {
            Evaluation::Positive => "positive",
            Evaluation::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Activity,
    Experience,
    Weather,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Correlation {
    Positive,
    Negative,
}

/// A tag value correlated with the week's day scores. Derived per report,
/// never stored outside of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub value: String,
    pub correlation: Correlation,
    pub frequency: usize,
    pub average_score: f64,
}

impl Pattern {
    /// Ranking weight: frequency scaled by distance from the neutral score.
    pub fn impact(&self, neutral_threshold: f64) -> f64 {
        self.frequency as f64 * (self.average_score - neutral_threshold).abs()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyAnalysis {
    pub date: NaiveDate,
    pub score: f64,
    pub sentiment: String,
    pub summary: String,
    pub key_themes: Vec<String>,
}

/// Fully assembled report, immutable once built. Persisting it yields a
/// `ReportRecord` with the server-assigned id.
#[derive(Debug, Clone)]
pub struct WeeklyReport {
    pub user_id: Uuid,
    pub nickname: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub average_score: f64,
    pub evaluation: Evaluation,
    pub daily_analysis: Vec<DailyAnalysis>,
    pub patterns: Vec<Pattern>,
    pub feedback: Vec<String>,
    pub has_partial_data: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReportRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub average_score: f64,
    pub evaluation: Evaluation,
    pub daily_analysis: Json<Vec<DailyAnalysis>>,
    pub patterns: Json<Vec<Pattern>>,
    pub feedback: Json<Vec<String>>,
    pub has_partial_data: bool,
    pub created_at: DateTime<Utc>,
}

/// Body for report generation. Send `{}` to target the previous
/// complete week.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReportListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WeekPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report_id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub week_period: WeekPeriod,
    pub average_score: f64,
    pub evaluation: Evaluation,
    pub daily_analysis: Vec<DailyAnalysis>,
    pub patterns: Vec<Pattern>,
    pub feedback: Vec<String>,
    pub has_partial_data: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ReportRecord> for ReportResponse {
    fn from(r: ReportRecord) -> Self {
        Self {
            report_id: r.id,
            user_id: r.user_id,
            nickname: r.nickname,
            week_period: WeekPeriod {
                start: r.week_start,
                end: r.week_end,
            },
            average_score: r.average_score,
            evaluation: r.evaluation,
            daily_analysis: r.daily_analysis.0,
            patterns: r.patterns.0,
            feedback: r.feedback.0,
            has_partial_data: r.has_partial_data,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateReportResponse {
    #[serde(flatten)]
    pub report: ReportResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportResponse>,
    pub total: i64,
}

/// Compact shape consumed by the dashboard's latest-report card.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub diary_content: Vec<String>,
    pub current_date: NaiveDate,
    pub author_nickname: String,
    pub average_score: f64,
    pub evaluation: Evaluation,
    pub week_period: WeekPeriod,
}

#[derive(Debug, Serialize)]
pub struct LatestReportResponse {
    pub report_id: Uuid,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub summary: ReportSummary,
}
