use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::user::User;
use crate::report::generate::generate_for_period;
use crate::report::period::AnalysisPeriod;
use crate::report::ReportIdentity;
use crate::AppState;

/// Run one worker per input with at most `limit` running at a time.
/// Results come back in input order; a panicked worker surfaces as Err
/// in its own slot without touching the others.
pub async fn fan_out<T, R, F, Fut>(
    inputs: Vec<T>,
    limit: usize,
    worker: F,
) -> Vec<Result<R, JoinError>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));

    let mut handles = Vec::with_capacity(inputs.len());
    for input in inputs {
        let semaphore = semaphore.clone();
        let fut = worker(input);
        handles.push(tokio::spawn(async move {
            // Never closed here, so acquire only fails if the runtime is
            // shutting down; the task is being dropped anyway in that case.
            let _permit = semaphore.acquire_owned().await.ok();
            fut.await
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await);
    }
    results
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Generated,
    Skipped,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct UserOutcome {
    pub user_id: Uuid,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

impl UserOutcome {
    fn generated(user_id: Uuid, notification_error: Option<String>) -> Self {
        Self {
            user_id,
            status: OutcomeStatus::Generated,
            error: None,
            notification_error,
        }
    }

    fn skipped(user_id: Uuid) -> Self {
        Self {
            user_id,
            status: OutcomeStatus::Skipped,
            error: None,
            notification_error: None,
        }
    }

    fn failed(user_id: Uuid, error: &str) -> Self {
        Self {
            user_id,
            status: OutcomeStatus::Failed,
            error: Some(error.to_string()),
            notification_error: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_users: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<UserOutcome>,
}

impl BatchSummary {
    pub fn from_outcomes(period: AnalysisPeriod, outcomes: Vec<UserOutcome>) -> Self {
        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        let generated = count(OutcomeStatus::Generated);
        let skipped = count(OutcomeStatus::Skipped);
        let failed = count(OutcomeStatus::Failed);

        Self {
            week_start: period.start,
            week_end: period.end,
            total_users: outcomes.len(),
            generated,
            skipped,
            failed,
            outcomes,
        }
    }
}

/// Generate the week's report for every eligible user. Eligible means
/// not deleted and having at least one diary entry inside the period.
/// One user failing never stops the rest.
pub async fn run_weekly_batch(state: &AppState, period: AnalysisPeriod) -> AppResult<BatchSummary> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT DISTINCT u.id, u.email, u.nickname, u.deleted_at, u.created_at, u.updated_at
        FROM users u
        JOIN diary_entries d ON d.user_id = u.id
        WHERE d.entry_date BETWEEN $1 AND $2 AND u.deleted_at IS NULL
        ORDER BY u.id
        "#,
    )
    .bind(period.start)
    .bind(period.end)
    .fetch_all(&state.db)
    .await?;

    tracing::info!(
        week_start = %period.start,
        week_end = %period.end,
        user_count = users.len(),
        "Starting weekly report batch"
    );

    let user_ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let results = fan_out(users, state.config.batch_concurrency, |user| {
        let state = state.clone();
        async move { process_user(&state, user, period).await }
    })
    .await;

    let mut outcomes = Vec::with_capacity(results.len());
    for (user_id, result) in user_ids.into_iter().zip(results) {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Batch worker panicked");
                outcomes.push(UserOutcome::failed(user_id, "panic"));
            }
        }
    }

    let summary = BatchSummary::from_outcomes(period, outcomes);
    tracing::info!(
        week_start = %summary.week_start,
        total_users = summary.total_users,
        generated = summary.generated,
        skipped = summary.skipped,
        failed = summary.failed,
        "Weekly report batch finished"
    );
    Ok(summary)
}

/// True when one of `windows` covers exactly this period. A custom-period
/// report sharing the week's start date does not count.
fn has_report_for_window(windows: &[(NaiveDate, NaiveDate)], period: AnalysisPeriod) -> bool {
    windows
        .iter()
        .any(|(start, end)| *start == period.start && *end == period.end)
}

async fn process_user(state: &AppState, user: User, period: AnalysisPeriod) -> UserOutcome {
    let user_id = user.id;

    let windows: Vec<(NaiveDate, NaiveDate)> = match sqlx::query_as(
        "SELECT week_start, week_end FROM weekly_reports WHERE user_id = $1 AND week_start = $2",
    )
    .bind(user_id)
    .bind(period.start)
    .fetch_all(&state.db)
    .await
    {
        Ok(windows) => windows,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Batch report lookup failed");
            return UserOutcome::failed(user_id, "database_error");
        }
    };
    if has_report_for_window(&windows, period) {
        tracing::debug!(
            user_id = %user_id,
            week_start = %period.start,
            "Report already exists, skipping"
        );
        return UserOutcome::skipped(user_id);
    }

    let identity = ReportIdentity {
        user_id,
        nickname: user.display_name().to_string(),
        email: user.email.clone(),
    };
    match generate_for_period(state, &identity, period).await {
        Ok(output) => UserOutcome::generated(user_id, output.notification_error),
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                week_start = %period.start,
                error = %e,
                kind = e.kind(),
                "Batch report generation failed"
            );
            UserOutcome::failed(user_id, e.kind())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_skip_requires_an_exact_window_match() {
        let week = AnalysisPeriod {
            start: d("2026-01-05"),
            end: d("2026-01-11"),
        };

        // A Mon-Wed report shares the Monday but covers a different window,
        // so the weekly run must still generate.
        assert!(!has_report_for_window(
            &[(d("2026-01-05"), d("2026-01-07"))],
            week
        ));
        assert!(has_report_for_window(
            &[(d("2026-01-05"), d("2026-01-11"))],
            week
        ));
    }

    #[test]
    fn test_skip_checks_every_candidate_window() {
        let week = AnalysisPeriod {
            start: d("2026-01-05"),
            end: d("2026-01-11"),
        };
        let windows = vec![
            (d("2026-01-05"), d("2026-01-06")),
            (d("2026-01-05"), d("2026-01-11")),
        ];
        assert!(has_report_for_window(&windows, week));
        assert!(!has_report_for_window(&[], week));
    }

    #[tokio::test]
    async fn test_fan_out_preserves_input_order() {
        // Earlier inputs sleep longer, so completion order is reversed.
        let results = fan_out(vec![4u64, 3, 2, 1], 4, |n| async move {
            tokio::time::sleep(Duration::from_millis(n * 10)).await;
            n * 100
        })
        .await;

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![400, 300, 200, 100]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_respects_concurrency_limit() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let r = running.clone();
        let p = peak.clone();
        fan_out(vec![(); 12], 3, move |_| {
            let running = r.clone();
            let peak = p.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fan_out_isolates_panicking_workers() {
        let results = fan_out(vec![1u32, 2, 3], 2, |n| async move {
            if n == 2 {
                panic!("boom");
            }
            n
        })
        .await;

        assert_eq!(results[0].as_ref().unwrap(), &1);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap(), &3);
    }

    #[test]
    fn test_summary_counts_outcomes_by_status() {
        let period = AnalysisPeriod {
            start: "2026-01-05".parse().unwrap(),
            end: "2026-01-11".parse().unwrap(),
        };
        let outcomes = vec![
            UserOutcome::generated(Uuid::new_v4(), None),
            UserOutcome::generated(Uuid::new_v4(), Some("relay refused".into())),
            UserOutcome::skipped(Uuid::new_v4()),
            UserOutcome::failed(Uuid::new_v4(), "scoring_unavailable"),
        ];

        let summary = BatchSummary::from_outcomes(period, outcomes);
        assert_eq!(summary.total_users, 4);
        assert_eq!(summary.generated, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.outcomes[3].error.as_deref(), Some("scoring_unavailable"));
    }

    #[test]
    fn test_failed_outcomes_serialize_without_null_noise() {
        let outcome = UserOutcome::skipped(Uuid::new_v4());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert!(json.get("error").is_none());
        assert!(json.get("notification_error").is_none());
    }
}
