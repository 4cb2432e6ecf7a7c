use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};

use crate::models::report::{DailyAnalysis, Pattern, WeeklyReport};
use crate::report::aggregate::WeekStats;
use crate::report::normalize::NormalizedEntry;
use crate::report::period::AnalysisPeriod;
use crate::report::{AnalysisConfig, ReportIdentity};
use crate::scoring::DailyScore;

/// Compose the immutable report from the pipeline outputs. Pure assembly:
/// no persistence, no notification.
pub fn assemble_report(
    identity: &ReportIdentity,
    period: &AnalysisPeriod,
    stats: &WeekStats,
    patterns: Vec<Pattern>,
    feedback: Vec<String>,
    entries: &[NormalizedEntry],
    scores: &BTreeMap<NaiveDate, DailyScore>,
    config: &AnalysisConfig,
) -> WeeklyReport {
    let daily_analysis = scores
        .iter()
        .map(|(date, day)| {
            let contents: Vec<&str> = entries
                .iter()
                .filter(|e| e.date == *date)
                .map(|e| e.content.as_str())
                .collect();
            DailyAnalysis {
                date: *date,
                score: day.score,
                sentiment: day.sentiment.clone(),
                summary: summarize_day(&contents, config.summary_max_chars),
                key_themes: day.key_themes.clone(),
            }
        })
        .collect();

    WeeklyReport {
        user_id: identity.user_id,
        nickname: identity.nickname.clone(),
        week_start: period.start,
        week_end: period.end,
        average_score: stats.average_score,
        evaluation: stats.evaluation,
        daily_analysis,
        patterns,
        feedback,
        has_partial_data: stats.has_partial_data,
        created_at: Utc::now(),
    }
}

/// Join a day's entry contents and cut to the character budget, appending
/// an ellipsis when anything was dropped. Cuts on char boundaries.
pub fn summarize_day(contents: &[&str], max_chars: usize) -> String {
    let joined = contents.join(" ");
    if joined.chars().count() <= max_chars {
        return joined;
    }
    let mut summary: String = joined.chars().take(max_chars).collect();
    summary.push_str("...");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::Evaluation;
    use uuid::Uuid;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(id: i64, date: &str, content: &str) -> NormalizedEntry {
        NormalizedEntry {
            id,
            date: d(date),
            content: content.into(),
            tags: vec![],
        }
    }

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<NaiveDate, DailyScore> {
        pairs
            .iter()
            .map(|(date, score)| {
                (
                    d(date),
                    DailyScore {
                        date: d(date),
                        score: *score,
                        sentiment: "긍정적".into(),
                        key_themes: vec!["운동".into()],
                    },
                )
            })
            .collect()
    }

    fn identity() -> ReportIdentity {
        ReportIdentity {
            user_id: Uuid::new_v4(),
            nickname: "dawn".into(),
            email: "dawn@example.com".into(),
        }
    }

    fn stats() -> WeekStats {
        WeekStats {
            average_score: 7.0,
            evaluation: Evaluation::Positive,
            has_partial_data: true,
        }
    }

    #[test]
    fn test_daily_analysis_is_date_ordered_with_joined_contents() {
        let period = AnalysisPeriod {
            start: d("2026-01-05"),
            end: d("2026-01-11"),
        };
        let entries = vec![
            entry(1, "2026-01-06", "오후에 산책"),
            entry(2, "2026-01-05", "아침 운동"),
            entry(3, "2026-01-05", "저녁에 독서"),
        ];
        let scores = scores(&[("2026-01-05", 8.0), ("2026-01-06", 6.0)]);

        let identity = identity();
        let report = assemble_report(
            &identity,
            &period,
            &stats(),
            vec![],
            vec![],
            &entries,
            &scores,
            &AnalysisConfig::default(),
        );

        assert_eq!(report.daily_analysis.len(), 2);
        assert_eq!(report.daily_analysis[0].date, d("2026-01-05"));
        assert_eq!(report.daily_analysis[0].summary, "아침 운동 저녁에 독서");
        assert_eq!(report.daily_analysis[1].date, d("2026-01-06"));
        assert_eq!(report.daily_analysis[1].sentiment, "긍정적");
        assert_eq!(report.daily_analysis[1].key_themes, vec!["운동"]);

        assert_eq!(report.user_id, identity.user_id);
        assert_eq!(report.nickname, "dawn");
        assert_eq!(report.week_start, d("2026-01-05"));
        assert_eq!(report.week_end, d("2026-01-11"));
        assert!(report.has_partial_data);
    }

    #[test]
    fn test_long_day_content_truncates_with_ellipsis() {
        let long = "가".repeat(150);
        let summary = summarize_day(&[long.as_str()], 100);
        assert_eq!(summary.chars().count(), 103);
        assert!(summary.ends_with("..."));
        assert!(summary.starts_with("가가가"));
    }

    #[test]
    fn test_short_day_content_is_untouched() {
        let summary = summarize_day(&["맑은 날"], 100);
        assert_eq!(summary, "맑은 날");
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        // 100 Hangul chars are 300 bytes; a byte cut would panic or garble.
        let exactly_100 = "힘".repeat(100);
        let summary = summarize_day(&[exactly_100.as_str()], 100);
        assert_eq!(summary, exactly_100);

        let over = "힘".repeat(101);
        let summary = summarize_day(&[over.as_str()], 100);
        assert_eq!(summary.chars().count(), 103);
    }
}
