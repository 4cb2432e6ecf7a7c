use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{AppError, AppResult};

/// Inclusive calendar window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisPeriod {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Resolve the analysis window. Explicit bounds must come as a pair and in
/// order; with neither, the most recent complete Monday-Sunday week before
/// `today` is used.
pub fn resolve_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<AnalysisPeriod> {
    match (start, end) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(AppError::InvalidPeriod(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
            Ok(AnalysisPeriod { start, end })
        }
        (None, None) => Ok(previous_week(today)),
        _ => Err(AppError::InvalidPeriod(
            "start_date and end_date must be provided together".into(),
        )),
    }
}

/// The last fully completed Monday-Sunday week strictly before `today`.
pub fn previous_week(today: NaiveDate) -> AnalysisPeriod {
    let days_since_monday = today.weekday().num_days_from_monday();
    let start = today - Duration::days(days_since_monday as i64 + 7);
    AnalysisPeriod {
        start,
        end: start + Duration::days(6),
    }
}
