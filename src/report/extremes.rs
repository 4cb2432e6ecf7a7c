use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::report::Evaluation;
use crate::report::normalize::NormalizedEntry;
use crate::scoring::DailyScore;

/// Dates at the week's minimum score for a negative week, maximum for a
/// positive one. Exact ties all qualify; dates come back ascending.
pub fn extreme_days(
    evaluation: Evaluation,
    scores: &BTreeMap<NaiveDate, DailyScore>,
) -> Vec<NaiveDate> {
    let target = match evaluation {
        Evaluation::Negative => scores
            .values()
            .map(|s| s.score)
            .fold(f64::INFINITY, f64::min),
        Evaluation::Positive => scores
            .values()
            .map(|s| s.score)
            .fold(f64::NEG_INFINITY, f64::max),
    };

    scores
        .iter()
        .filter(|(_, s)| s.score == target)
        .map(|(date, _)| *date)
        .collect()
}

/// Tags shared across the extreme-day entries: any tag on at least two of
/// them, or every tag when a single entry qualifies. Ordered by occurrence
/// count descending, then by value.
pub fn shared_themes(extreme_dates: &[NaiveDate], entries: &[NormalizedEntry]) -> Vec<String> {
    let selected: Vec<&NormalizedEntry> = entries
        .iter()
        .filter(|e| extreme_dates.contains(&e.date))
        .collect();

    let min_count = if selected.len() == 1 { 1 } else { 2 };

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in &selected {
        for tag in &entry.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let mut themes: Vec<(&str, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .collect();
    themes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    themes.into_iter().map(|(tag, _)| tag.to_string()).collect()
}
