use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::diary::DiaryEntry;
use crate::models::report::{ReportRecord, WeeklyReport};
use crate::report::aggregate::aggregate_week;
use crate::report::assemble::assemble_report;
use crate::report::extremes::{extreme_days, shared_themes};
use crate::report::feedback::compose_feedback;
use crate::report::normalize::{normalize_entries, NormalizedEntry};
use crate::report::patterns::detect_patterns;
use crate::report::period::{resolve_period, AnalysisPeriod};
use crate::report::ReportIdentity;
use crate::scoring::{DailyScore, DiaryDoc, ScoringError};
use crate::AppState;

pub struct GenerationOutput {
    pub record: ReportRecord,
    /// Non-fatal: set when the report email could not be handed off.
    pub notification_error: Option<String>,
}

pub async fn generate_weekly_report(
    state: &AppState,
    identity: &ReportIdentity,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> AppResult<GenerationOutput> {
    let period = resolve_period(start, end, Utc::now().date_naive())?;
    generate_for_period(state, identity, period).await
}

/// Run the full single-user pipeline for a resolved period: fetch and
/// normalize entries, score them, analyze, assemble, persist, notify.
/// Nothing is persisted on any failure before the insert.
pub async fn generate_for_period(
    state: &AppState,
    identity: &ReportIdentity,
    period: AnalysisPeriod,
) -> AppResult<GenerationOutput> {
    tracing::info!(
        user_id = %identity.user_id,
        week_start = %period.start,
        week_end = %period.end,
        "Generating weekly report"
    );

    let rows = sqlx::query_as::<_, DiaryEntry>(
        r#"
        SELECT id, user_id, entry_date, content, tags
        FROM diary_entries
        WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
        ORDER BY entry_date, id
        "#,
    )
    .bind(identity.user_id)
    .bind(period.start)
    .bind(period.end)
    .fetch_all(&state.db)
    .await?;

    let entries = normalize_entries(rows);
    if entries.is_empty() {
        return Err(AppError::InsufficientData);
    }
    tracing::debug!(
        user_id = %identity.user_id,
        entry_count = entries.len(),
        "Diary entries ready for scoring"
    );

    let documents: Vec<DiaryDoc> = entries
        .iter()
        .map(|e| DiaryDoc {
            content: e.content.clone(),
            date: e.date,
            nickname: identity.nickname.clone(),
        })
        .collect();

    let scores = score_documents(state, &documents).await?;
    let scores = ingest_scores(scores, &entries);

    let stats = aggregate_week(&period, &entries, &scores, &state.analysis)?;
    let patterns = detect_patterns(&entries, &scores, &state.analysis);
    let extremes = extreme_days(stats.evaluation, &scores);
    let themes = shared_themes(&extremes, &entries);
    let feedback = compose_feedback(
        &stats,
        &patterns,
        &extremes,
        &themes,
        &entries,
        &scores,
        &state.analysis,
    );
    let report = assemble_report(
        identity,
        &period,
        &stats,
        patterns,
        feedback,
        &entries,
        &scores,
        &state.analysis,
    );

    let record = persist_report(state, report).await?;
    tracing::info!(
        user_id = %identity.user_id,
        report_id = %record.id,
        evaluation = record.evaluation.label(),
        has_partial_data = record.has_partial_data,
        "Weekly report stored"
    );

    let notification_error = match state
        .mailer
        .send_report_email(&identity.email, &record)
        .await
    {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(
                user_id = %identity.user_id,
                report_id = %record.id,
                error = %e,
                kind = "notification_failure",
                "Report email failed"
            );
            Some(e.to_string())
        }
    };

    Ok(GenerationOutput {
        record,
        notification_error,
    })
}

/// One scoring call for the whole week, bounded by the configured budget.
/// The engine never retries; the caller decides what a failure means.
async fn score_documents(state: &AppState, documents: &[DiaryDoc]) -> AppResult<Vec<DailyScore>> {
    let budget = Duration::from_secs(state.config.scoring_timeout_secs);
    match tokio::time::timeout(budget, state.scorer.score(documents)).await {
        Ok(Ok(scores)) => Ok(scores),
        Ok(Err(ScoringError::Timeout)) => Err(AppError::ScoringTimeout),
        Ok(Err(ScoringError::Unavailable(msg))) => Err(AppError::ScoringUnavailable(msg)),
        Err(_) => Err(AppError::ScoringTimeout),
    }
}

/// Index scores by date: clamp into domain, keep the first score per date,
/// drop scores for dates with no entries.
fn ingest_scores(
    scores: Vec<DailyScore>,
    entries: &[NormalizedEntry],
) -> BTreeMap<NaiveDate, DailyScore> {
    let entry_dates: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date).collect();

    let mut by_date = BTreeMap::new();
    let mut discarded = 0usize;
    for score in scores {
        if !entry_dates.contains(&score.date) {
            discarded += 1;
            continue;
        }
        if by_date.contains_key(&score.date) {
            tracing::warn!(date = %score.date, "Duplicate daily score ignored");
            continue;
        }
        by_date.insert(score.date, score.clamped());
    }
    if discarded > 0 {
        tracing::debug!(discarded, "Dropped scores for dates without entries");
    }

    by_date
}

async fn persist_report(state: &AppState, report: WeeklyReport) -> AppResult<ReportRecord> {
    sqlx::query_as::<_, ReportRecord>(
        r#"
        INSERT INTO weekly_reports
            (id, user_id, nickname, week_start, week_end, average_score, evaluation,
             daily_analysis, patterns, feedback, has_partial_data, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(report.user_id)
    .bind(&report.nickname)
    .bind(report.week_start)
    .bind(report.week_end)
    .bind(report.average_score)
    .bind(report.evaluation)
    .bind(Json(&report.daily_analysis))
    .bind(Json(&report.patterns))
    .bind(Json(&report.feedback))
    .bind(report.has_partial_data)
    .bind(report.created_at)
    .fetch_one(&state.db)
    .await
    .map_err(AppError::PersistenceFailure)
}
