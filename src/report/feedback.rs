use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::report::{Correlation, Evaluation, Pattern};
use crate::report::aggregate::WeekStats;
use crate::report::normalize::NormalizedEntry;
use crate::report::AnalysisConfig;
use crate::scoring::DailyScore;

/// Build the ordered feedback list: top patterns first, then extreme days
/// and their shared themes, then the closing summary. Every statement cites
/// at least one concrete entry date; the text is template-composed and
/// deterministic.
pub fn compose_feedback(
    stats: &WeekStats,
    patterns: &[Pattern],
    extreme_dates: &[NaiveDate],
    themes: &[String],
    entries: &[NormalizedEntry],
    scores: &BTreeMap<NaiveDate, DailyScore>,
    config: &AnalysisConfig,
) -> Vec<String> {
    let mut feedback = Vec::new();

    for pattern in patterns.iter().take(config.pattern_feedback_cap) {
        let first_date = entries
            .iter()
            .filter(|e| e.tags.contains(&pattern.value))
            .map(|e| e.date)
            .min();
        let Some(first_date) = first_date else {
            continue;
        };

        let statement = match pattern.correlation {
            Correlation::Positive => format!(
                "'{}' came up {} starting {} and those days averaged {:.1}. Keep making room for it.",
                pattern.value,
                times(pattern.frequency),
                first_date,
                pattern.average_score,
            ),
            Correlation::Negative => format!(
                "'{}' appeared {} starting {}, with those days averaging only {:.1}. It may deserve a closer look.",
                pattern.value,
                times(pattern.frequency),
                first_date,
                pattern.average_score,
            ),
        };
        feedback.push(statement);
    }

    let cited_extremes = &extreme_dates[..extreme_dates.len().min(config.extreme_feedback_cap)];
    for date in cited_extremes {
        let Some(day) = scores.get(date) else {
            continue;
        };
        let statement = match stats.evaluation {
            Evaluation::Negative => format!(
                "{} was the hardest day of the week, scoring {:.1}. Worth revisiting what happened.",
                date, day.score,
            ),
            Evaluation::Positive => format!(
                "{} stood out as the best day, scoring {:.1}.",
                date, day.score,
            ),
        };
        feedback.push(statement);
    }

    if !themes.is_empty() && !cited_extremes.is_empty() {
        let dates = cited_extremes
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        feedback.push(format!(
            "Around {}, '{}' kept coming up.",
            dates,
            themes.join("', '"),
        ));
    }

    let anchor = extreme_dates
        .first()
        .copied()
        .or_else(|| scores.keys().next().copied());
    if let Some(anchor) = anchor {
        let statement = match stats.evaluation {
            Evaluation::Positive => format!(
                "All told this was a positive week: the average came to {:.1}, with {} the high point.",
                stats.average_score, anchor,
            ),
            Evaluation::Negative => format!(
                "A heavy week overall with an average of {:.1}; {} weighed the most.",
                stats.average_score, anchor,
            ),
        };
        feedback.push(statement);
    }

    feedback
}

fn times(n: usize) -> String {
    if n == 1 {
        "once".into()
    } else {
        format!("{} times", n)
    }
}
