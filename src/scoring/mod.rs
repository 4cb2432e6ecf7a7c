pub mod flow;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Valid score domain; values outside it are clamped on ingest.
pub const SCORE_MIN: f64 = 1.0;
pub const SCORE_MAX: f64 = 10.0;

/// One diary entry formatted for the scoring flow. Field names follow the
/// flow's document schema.
#[derive(Debug, Clone, Serialize)]
pub struct DiaryDoc {
    #[serde(rename = "diaryContent")]
    pub content: String,
    #[serde(rename = "createdDate")]
    pub date: NaiveDate,
    #[serde(rename = "authorNickname")]
    pub nickname: String,
}

/// Per-day output of the scoring flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub score: f64,
    pub sentiment: String,
    #[serde(default)]
    pub key_themes: Vec<String>,
}

impl DailyScore {
    pub fn clamped(mut self) -> Self {
        self.score = self.score.clamp(SCORE_MIN, SCORE_MAX);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring request timed out")]
    Timeout,

    #[error("scoring service unavailable: {0}")]
    Unavailable(String),
}

/// The sentiment-scoring capability. One operation: a batch of documents
/// in, one score per entry-bearing date out. Implementations own their
/// transport; callers own the time budget.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, documents: &[DiaryDoc]) -> Result<Vec<DailyScore>, ScoringError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_score_parses_flow_json() {
        let parsed: DailyScore = serde_json::from_str(
            r#"{"date":"2026-01-06","score":7.2,"sentiment":"긍정적","key_themes":["운동","친구"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.date, "2026-01-06".parse().unwrap());
        assert!((parsed.score - 7.2).abs() < 1e-9);
        assert_eq!(parsed.key_themes, vec!["운동", "친구"]);
    }

    #[test]
    fn test_key_themes_default_to_empty() {
        let parsed: DailyScore =
            serde_json::from_str(r#"{"date":"2026-01-06","score":5.0,"sentiment":"중립"}"#)
                .unwrap();
        assert!(parsed.key_themes.is_empty());
    }

    #[test]
    fn test_scores_clamp_to_domain() {
        let low = DailyScore {
            date: "2026-01-06".parse().unwrap(),
            score: 0.2,
            sentiment: "부정적".into(),
            key_themes: vec![],
        };
        assert!((low.clamped().score - SCORE_MIN).abs() < 1e-9);

        let high = DailyScore {
            date: "2026-01-07".parse().unwrap(),
            score: 11.5,
            sentiment: "긍정적".into(),
            key_themes: vec![],
        };
        assert!((high.clamped().score - SCORE_MAX).abs() < 1e-9);
    }

    #[test]
    fn test_diary_doc_uses_flow_field_names() {
        let doc = DiaryDoc {
            content: "오늘은 날씨가 좋았다".into(),
            date: "2026-01-06".parse().unwrap(),
            nickname: "dawn".into(),
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("diaryContent").is_some());
        assert_eq!(value["createdDate"], "2026-01-06");
        assert_eq!(value["authorNickname"], "dawn");
    }
}
