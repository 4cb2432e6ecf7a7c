use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::report::{Correlation, Pattern, PatternKind};
use crate::report::normalize::NormalizedEntry;
use crate::report::AnalysisConfig;
use crate::scoring::DailyScore;

// Tag keyword tables carried over from the original deployment, plus their
// English counterparts. Anything unmatched counts as an experience.
const WEATHER_KEYWORDS: &[&str] = &[
    "맑음", "흐림", "비", "눈", "더움", "추움", "날씨", "sunny", "cloudy", "rain", "snow",
    "hot", "cold", "weather",
];
const ACTIVITY_KEYWORDS: &[&str] = &[
    "운동", "산책", "독서", "영화", "게임", "요리", "청소", "workout", "exercise", "walk",
    "reading", "movie", "game", "cooking", "cleaning",
];

/// Classify a tag value by keyword containment, case-insensitive.
pub fn infer_kind(tag: &str) -> PatternKind {
    let tag = tag.to_lowercase();
    if WEATHER_KEYWORDS.iter().any(|k| tag.contains(k)) {
        PatternKind::Weather
    } else if ACTIVITY_KEYWORDS.iter().any(|k| tag.contains(k)) {
        PatternKind::Activity
    } else {
        PatternKind::Experience
    }
}

/// Correlate tag values with day scores across the week.
///
/// Each entry contributes its day's score once per tag it carries; entries
/// sharing a date share that date's score. Patterns are ranked by impact
/// (frequency x |mean - threshold|) descending, ties by frequency then tag
/// value, and capped at `config.max_patterns`.
pub fn detect_patterns(
    entries: &[NormalizedEntry],
    scores: &BTreeMap<NaiveDate, DailyScore>,
    config: &AnalysisConfig,
) -> Vec<Pattern> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for entry in entries {
        let Some(day) = scores.get(&entry.date) else {
            continue;
        };
        for tag in &entry.tags {
            groups.entry(tag.clone()).or_default().push(day.score);
        }
    }

    let mut patterns: Vec<Pattern> = groups
        .into_iter()
        .map(|(value, day_scores)| {
            let frequency = day_scores.len();
            let average_score = day_scores.iter().sum::<f64>() / frequency as f64;
            let correlation = if average_score >= config.neutral_threshold {
                Correlation::Positive
            } else {
                Correlation::Negative
            };
            Pattern {
                kind: infer_kind(&value),
                value,
                correlation,
                frequency,
                average_score,
            }
        })
        .collect();

    let threshold = config.neutral_threshold;
    patterns.sort_by(|a, b| {
        b.impact(threshold)
            .partial_cmp(&a.impact(threshold))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.frequency.cmp(&a.frequency))
            .then_with(|| a.value.cmp(&b.value))
    });
    patterns.truncate(config.max_patterns);

    patterns
}
