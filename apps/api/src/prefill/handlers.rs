//! Axum route handlers for the Prefill API consumed by the local agent.

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use prefill_protocol::{
    CreateIntentRequest, CreateIntentResponse, IntentPayload, ReportResultRequest,
    ReportResultResponse,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::intent::PrefillLogRow;
use crate::prefill::{intents, reporter};
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

/// POST /api/v1/prefill/create-intent
///
/// The response is the only place the plaintext token ever appears.
pub async fn handle_create_intent(
    State(state): State<AppState>,
    Json(request): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let issued =
        intents::create_intent(state.store.as_ref(), &state.tokens, request.application_id).await?;
    Ok(Json(CreateIntentResponse {
        intent_id: issued.intent_id,
        token: issued.token.into_inner(),
        expires_at: issued.expires_at,
        message: "Intent created. Use the token with the local agent; it will not be shown again."
            .to_string(),
    }))
}

/// GET /api/v1/prefill/intent/:intent_id
///
/// Requires `Authorization: Bearer <token>`. Reads do not consume the intent.
pub async fn handle_get_intent(
    State(state): State<AppState>,
    Path(intent_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<IntentPayload>, AppError> {
    let token = bearer_token(&headers)?;
    let intent = state.tokens.validate(intent_id, token).await?;
    Ok(Json(intents::intent_payload(&intent)?))
}

/// POST /api/v1/prefill/report-result
pub async fn handle_report_result(
    State(state): State<AppState>,
    Json(request): Json<ReportResultRequest>,
) -> Result<Json<ReportResultResponse>, AppError> {
    let response = reporter::report(state.store.as_ref(), &state.tokens, request).await?;
    Ok(Json(response))
}

/// GET /api/v1/prefill/logs/:log_id
pub async fn handle_get_log(
    State(state): State<AppState>,
    Path(log_id): Path<Uuid>,
) -> Result<Json<PrefillLogRow>, AppError> {
    let log = state
        .store
        .get_log(log_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prefill log {log_id} not found")))?;
    Ok(Json(log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_or_malformed_header_is_unauthorized() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Err(AppError::Unauthorized)));

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert!(matches!(bearer_token(&basic), Err(AppError::Unauthorized)));

        let mut empty = HeaderMap::new();
        empty.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(bearer_token(&empty), Err(AppError::Unauthorized)));
    }
}
