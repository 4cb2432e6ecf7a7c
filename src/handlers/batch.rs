use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::{NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::batch::{run_weekly_batch, BatchSummary};
use crate::error::{AppError, AppResult};
use crate::report::period::resolve_period;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Default, Deserialize)]
pub struct BatchTriggerRequest {
    pub week_start: Option<NaiveDate>,
    pub week_end: Option<NaiveDate>,
}

/// Verify the scheduler's HMAC-SHA256 signature over the raw request body.
/// Header carries the lowercase hex digest.
fn verify_scheduler_signature(
    payload: &[u8],
    signature_hex: &str,
    secret: &str,
) -> Result<(), AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid scheduler secret")))?;
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks
    let valid = signature_hex.len() == expected.len()
        && signature_hex
            .as_bytes()
            .iter()
            .zip(expected.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0;

    if !valid {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub async fn trigger_weekly_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<BatchSummary>> {
    if !state.config.scheduler_secret.is_empty() {
        let signature = headers
            .get("x-scheduler-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        verify_scheduler_signature(&body, signature, &state.config.scheduler_secret)?;
    } else {
        tracing::warn!("Scheduler secret not configured, skipping signature verification");
    }

    let request: BatchTriggerRequest = if body.is_empty() {
        BatchTriggerRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid batch payload: {}", e)))?
    };

    let period = resolve_period(
        request.week_start,
        request.week_end,
        Utc::now().date_naive(),
    )?;

    let summary = run_weekly_batch(&state, period).await?;
    Ok(Json(summary))
}
