use super::error::ApiError;
use super::AppState;
use crate::core::lead_service::SubmitOutcome;
use crate::domain::model::{
    CheckUserRequest, CheckUserResponse, HasPlayedResponse, LeadSubmission, PlayLimitRequest,
    PlayLimitResponse, SubmitResponse, TrackRequest, TrackResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use tracing::{info, warn};

pub const ALREADY_PLAYED_MESSAGE: &str =
    "You have already played today. Please come back tomorrow!";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "service": "huat-leads",
        "transport": state.service.store_name(),
        "preview": state.preview,
    }))
}

pub async fn submit_to_sheets(
    State(state): State<AppState>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(lead) = payload?;
    if lead.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let outcome = state.service.submit(lead).await?;
    match &outcome {
        SubmitOutcome::Appended | SubmitOutcome::Updated { .. } => {
            info!(?outcome, "submission stored");
        }
        SubmitOutcome::DeadLettered { error } => {
            warn!(%error, "submission accepted but not stored");
        }
    }

    Ok(Json(SubmitResponse {
        success: true,
        error: None,
    }))
}

pub async fn check_user(
    State(state): State<AppState>,
    payload: Result<Json<CheckUserRequest>, JsonRejection>,
) -> Result<Json<CheckUserResponse>, ApiError> {
    let Json(request) = payload?;
    if request.email.trim().is_empty() || request.phone.trim().is_empty() {
        return Err(ApiError::bad_request("Email and phone are required"));
    }

    let exists = state
        .service
        .user_exists(&request.email, &request.phone)
        .await
        .map_err(|e| {
            warn!(error = %e, "check-user failed");
            ApiError::from(e)
        })?;

    Ok(Json(CheckUserResponse {
        success: true,
        exists,
    }))
}

/// 舊版端點：任何錯誤（包含無法解析的內容）都當作沒玩過
pub async fn check_duplicate(
    State(state): State<AppState>,
    payload: Result<Json<CheckUserRequest>, JsonRejection>,
) -> Json<HasPlayedResponse> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "check-duplicate failed open");
            return Json(HasPlayedResponse {
                has_played: false,
                error: Some(rejection.body_text()),
            });
        }
    };

    match state
        .service
        .user_exists(&request.email, &request.phone)
        .await
    {
        Ok(has_played) => Json(HasPlayedResponse {
            has_played,
            error: None,
        }),
        Err(e) => {
            warn!(error = %e, "check-duplicate failed open");
            Json(HasPlayedResponse {
                has_played: false,
                error: Some(e.to_string()),
            })
        }
    }
}

/// 檢查失敗時放行，並以 `preview: true` 標示
pub async fn check_play_limit(
    State(state): State<AppState>,
    payload: Result<Json<PlayLimitRequest>, JsonRejection>,
) -> Result<Json<PlayLimitResponse>, ApiError> {
    let open = PlayLimitResponse {
        can_play: true,
        message: None,
        preview: Some(true),
    };
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "play-limit check failed open");
            return Ok(Json(open));
        }
    };
    if request.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    if state.preview {
        info!("preview mode: allowing play without limit check");
        return Ok(Json(open));
    }

    let today = Utc::now().date_naive();
    match state.service.can_play(&request.email, today).await {
        Ok(true) => Ok(Json(PlayLimitResponse {
            can_play: true,
            message: None,
            preview: None,
        })),
        Ok(false) => Ok(Json(PlayLimitResponse {
            can_play: false,
            message: Some(ALREADY_PLAYED_MESSAGE.to_string()),
            preview: None,
        })),
        Err(e) => {
            warn!(error = %e, "play-limit check failed open");
            Ok(Json(open))
        }
    }
}

pub async fn track(
    State(state): State<AppState>,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<Json<TrackResponse>, ApiError> {
    let Json(request) = payload?;
    if request.key.trim().is_empty() {
        return Err(ApiError::bad_request("key is required"));
    }

    let updated = state.service.track(&request.key, &request.updates).await?;
    Ok(Json(TrackResponse { ok: true, updated }))
}
