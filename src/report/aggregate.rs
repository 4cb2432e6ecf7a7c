use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::models::report::Evaluation;
use crate::report::normalize::NormalizedEntry;
use crate::report::period::AnalysisPeriod;
use crate::report::AnalysisConfig;
use crate::scoring::DailyScore;

/// Week-level aggregate over the per-day scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekStats {
    pub average_score: f64,
    pub evaluation: Evaluation,
    pub has_partial_data: bool,
}

/// Compute the weekly average, evaluation, and coverage flag.
///
/// The mean is day-weighted: one score per date regardless of how many
/// entries that date has. Fails when the entry set is empty or when an
/// entry-bearing date is missing from `scores`.
pub fn aggregate_week(
    period: &AnalysisPeriod,
    entries: &[NormalizedEntry],
    scores: &BTreeMap<NaiveDate, DailyScore>,
    config: &AnalysisConfig,
) -> AppResult<WeekStats> {
    if entries.is_empty() {
        return Err(AppError::InsufficientData);
    }

    let entry_dates: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date).collect();

    let missing: Vec<NaiveDate> = entry_dates
        .iter()
        .filter(|d| !scores.contains_key(d))
        .copied()
        .collect();
    if let Some(first) = missing.first() {
        return Err(AppError::IncompleteScoring(format!(
            "no daily score for {} of {} entry dates (first missing: {})",
            missing.len(),
            entry_dates.len(),
            first
        )));
    }

    let sum: f64 = entry_dates
        .iter()
        .filter_map(|d| scores.get(d))
        .map(|s| s.score)
        .sum();
    let average_score = sum / entry_dates.len() as f64;

    let evaluation = if average_score < config.neutral_threshold {
        Evaluation::Negative
    } else {
        Evaluation::Positive
    };

    let has_partial_data = period.days().any(|d| !entry_dates.contains(&d));

    Ok(WeekStats {
        average_score,
        evaluation,
        has_partial_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(id: i64, date: &str) -> NormalizedEntry {
        NormalizedEntry {
            id,
            date: d(date),
            content: format!("entry {}", id),
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
                        sentiment: "중립".into(),
                        key_themes: vec![],
                    },
                )
            })
            .collect()
    }

    fn week() -> AnalysisPeriod {
        AnalysisPeriod {
            start: d("2026-01-05"),
            end: d("2026-01-11"),
        }
    }

    #[test]
    fn test_average_is_exact_mean_with_partial_week() {
        // Entries Mon-Wed only, scores 7/8/6.
        let entries = vec![
            entry(1, "2026-01-05"),
            entry(2, "2026-01-06"),
            entry(3, "2026-01-07"),
        ];
        let scores = scores(&[("2026-01-05", 7.0), ("2026-01-06", 8.0), ("2026-01-07", 6.0)]);

        let stats =
            aggregate_week(&week(), &entries, &scores, &AnalysisConfig::default()).unwrap();
        assert!((stats.average_score - 7.0).abs() < 1e-9);
        assert_eq!(stats.evaluation, Evaluation::Positive);
        assert!(stats.has_partial_data);
    }

    #[test]
    fn test_low_week_is_negative_with_exact_mean() {
        let dates = [
            "2026-01-05",
            "2026-01-06",
            "2026-01-07",
            "2026-01-08",
            "2026-01-09",
            "2026-01-10",
            "2026-01-11",
        ];
        let values = [2.0, 3.0, 1.0, 4.0, 2.0, 3.0, 2.0];
        let entries: Vec<NormalizedEntry> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| entry(i as i64, date))
            .collect();
        let pairs: Vec<(&str, f64)> = dates.iter().copied().zip(values).collect();
        let scores = scores(&pairs);

        let stats =
            aggregate_week(&week(), &entries, &scores, &AnalysisConfig::default()).unwrap();
        assert!((stats.average_score - 17.0 / 7.0).abs() < 1e-9);
        assert_eq!(stats.evaluation, Evaluation::Negative);
        assert!(!stats.has_partial_data);
    }

    #[test]
    fn test_threshold_is_inclusive_on_the_positive_side() {
        let entries = vec![entry(1, "2026-01-05"), entry(2, "2026-01-06")];
        let scores = scores(&[("2026-01-05", 4.0), ("2026-01-06", 6.0)]);

        let stats =
            aggregate_week(&week(), &entries, &scores, &AnalysisConfig::default()).unwrap();
        assert!((stats.average_score - 5.0).abs() < 1e-9);
        assert_eq!(stats.evaluation, Evaluation::Positive);
    }

    #[test]
    fn test_single_day_week_aggregates() {
        let entries = vec![entry(1, "2026-01-05")];
        let scores = scores(&[("2026-01-05", 4.0)]);

        let stats =
            aggregate_week(&week(), &entries, &scores, &AnalysisConfig::default()).unwrap();
        assert!((stats.average_score - 4.0).abs() < 1e-9);
        assert_eq!(stats.evaluation, Evaluation::Negative);
    }

    #[test]
    fn test_empty_entries_fail_with_insufficient_data() {
        let err = aggregate_week(&week(), &[], &scores(&[]), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientData));
    }

    #[test]
    fn test_unscored_entry_date_fails_with_incomplete_scoring() {
        let entries = vec![entry(1, "2026-01-05"), entry(2, "2026-01-06")];
        let scores = scores(&[("2026-01-05", 7.0)]);

        let err =
            aggregate_week(&week(), &entries, &scores, &AnalysisConfig::default()).unwrap_err();
        match err {
            AppError::IncompleteScoring(msg) => assert!(msg.contains("2026-01-06")),
            other => panic!("expected IncompleteScoring, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_entries_share_their_day_score() {
        // Two entries on Monday still count Monday's score once.
        let entries = vec![
            entry(1, "2026-01-05"),
            entry(2, "2026-01-05"),
            entry(3, "2026-01-06"),
        ];
        let scores = scores(&[("2026-01-05", 8.0), ("2026-01-06", 4.0)]);

        let stats =
            aggregate_week(&week(), &entries, &scores, &AnalysisConfig::default()).unwrap();
        assert!((stats.average_score - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_coverage_clears_partial_flag() {
        let entries: Vec<NormalizedEntry> = week()
            .days()
            .enumerate()
            .map(|(i, date)| NormalizedEntry {
                id: i as i64,
                date,
                content: "ok".into(),
                tags: vec![],
            })
            .collect();
        let pairs: Vec<(String, f64)> = week().days().map(|d| (d.to_string(), 6.0)).collect();
        let scores: BTreeMap<NaiveDate, DailyScore> = pairs
            .iter()
            .map(|(date, score)| {
                let date: NaiveDate = date.parse().unwrap();
                (
                    date,
                    DailyScore {
                        date,
                        score: *score,
                        sentiment: "중립".into(),
                        key_themes: vec![],
                    },
                )
            })
            .collect();

        let stats =
            aggregate_week(&week(), &entries, &scores, &AnalysisConfig::default()).unwrap();
        assert!(!stats.has_partial_data);
    }
}
