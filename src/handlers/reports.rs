use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::report::{
    CreateReportRequest, CreateReportResponse, LatestReportResponse, ReportListQuery,
    ReportListResponse, ReportRecord, ReportResponse, ReportSummary, WeekPeriod,
};
use crate::report::generate::generate_weekly_report;
use crate::report::ReportIdentity;
use crate::AppState;

const DEFAULT_LIST_LIMIT: i64 = 10;
const MAX_LIST_LIMIT: i64 = 50;

/// Identity always comes from the verified token, never from the body.
fn identity_for(auth_user: &AuthUser) -> ReportIdentity {
    let nickname = auth_user
        .nickname
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&auth_user.email)
        .to_string();

    ReportIdentity {
        user_id: auth_user.id,
        nickname,
        email: auth_user.email.clone(),
    }
}

pub async fn create_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<CreateReportResponse>)> {
    let identity = identity_for(&auth_user);
    let output = generate_weekly_report(&state, &identity, body.start_date, body.end_date).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateReportResponse {
            report: output.record.into(),
            notification_error: output.notification_error,
        }),
    ))
}

pub async fn list_reports(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ReportListQuery>,
) -> AppResult<Json<ReportListResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let records = sqlx::query_as::<_, ReportRecord>(
        r#"
        SELECT * FROM weekly_reports
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(auth_user.id)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    let total =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM weekly_reports WHERE user_id = $1")
            .bind(auth_user.id)
            .fetch_one(&state.db)
            .await?;

    Ok(Json(ReportListResponse {
        reports: records.into_iter().map(ReportResponse::from).collect(),
        total,
    }))
}

pub async fn latest_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<LatestReportResponse>> {
    let record = sqlx::query_as::<_, ReportRecord>(
        r#"
        SELECT * FROM weekly_reports
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("No report yet".into()))?;

    Ok(Json(build_latest_response(record)))
}

pub async fn get_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<ReportResponse>> {
    let record = sqlx::query_as::<_, ReportRecord>("SELECT * FROM weekly_reports WHERE id = $1")
        .bind(report_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Report not found".into()))?;

    // Existing reports owned by someone else are forbidden, not hidden
    if record.user_id != auth_user.id {
        return Err(AppError::Forbidden);
    }

    Ok(Json(record.into()))
}

fn build_latest_response(record: ReportRecord) -> LatestReportResponse {
    let diary_content = record
        .daily_analysis
        .0
        .iter()
        .map(|d| d.summary.clone())
        .collect();

    LatestReportResponse {
        report_id: record.id,
        nickname: record.nickname.clone(),
        created_at: record.created_at,
        summary: ReportSummary {
            diary_content,
            // The lookup date, not the report's generation date.
            current_date: Utc::now().date_naive(),
            author_nickname: record.nickname,
            average_score: record.average_score,
            evaluation: record.evaluation,
            week_period: WeekPeriod {
                start: record.week_start,
                end: record.week_end,
            },
        },
    }
}
