use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::{debug, info};

use yoas_db::{CreateOutcome, MessageRow, NewUser, UserRow, UserWithMessages};
use yoas_types::api::{MessageResponse, UserCreate, UserFound, UserMessagesResponse, UserResponse};
use yoas_types::models::{display_time, unix_seconds};
use yoas_types::text::normalize_message_text;

use crate::AppState;
use crate::access::AccessGranted;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: i64,
}

/// POST /user?access_key=
pub async fn create_user(
    _access: AccessGranted,
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UserCreate>, AppError>,
) -> Result<impl IntoResponse> {
    let message = normalize_message_text(&req.message);
    if message.is_empty() {
        return Err(AppError::BadRequest("\"message\" must not be empty".into()));
    }

    let new = NewUser {
        user_id: req.user_id,
        ban_reason: req.ban_reason,
        additional_info: req.additional_info,
        message,
    };

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || db.db.create_user(&new)).await??;

    match outcome {
        CreateOutcome::Created { user, message } => {
            info!("Banned user {} recorded", user.user_id);
            Ok((StatusCode::CREATED, Json(user_response(user, message))))
        }
        CreateOutcome::AlreadyExists => Err(AppError::UserExists),
    }
}

/// DELETE /user?user_id=&access_key=
pub async fn delete_user(
    _access: AccessGranted,
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UserIdQuery>, AppError>,
) -> Result<Json<UserFound>> {
    let db = state.clone();
    let deleted = tokio::task::spawn_blocking(move || db.db.delete_user(query.user_id)).await??;

    let Some(deleted) = deleted else {
        return Err(AppError::UserNotFound);
    };

    Ok(Json(UserFound {
        found: true,
        user: Some(user_messages_response(deleted)),
    }))
}

/// GET /user?user_id=
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UserIdQuery>, AppError>,
) -> Result<(StatusCode, Json<UserFound>)> {
    let user_id = query.user_id;
    let db = state.clone();
    let found = tokio::task::spawn_blocking(move || db.db.get_user(user_id)).await??;

    Ok(match found {
        Some(user) => (
            StatusCode::OK,
            Json(UserFound {
                found: true,
                user: Some(user_messages_response(user)),
            }),
        ),
        None => {
            debug!("User {} not in ban-list", user_id);
            (StatusCode::NOT_FOUND, Json(UserFound::missing()))
        }
    })
}

fn message_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: row.id,
        text: row.text,
    }
}

fn user_response(user: UserRow, message: MessageRow) -> UserResponse {
    UserResponse {
        user_id: user.user_id,
        utc_created_at: unix_seconds(&user.utc_created_at),
        utc_created_at_formatted: display_time(&user.utc_created_at),
        ban_reason: user.ban_reason,
        additional_info: user.additional_info,
        message: message_response(message),
    }
}

fn user_messages_response(found: UserWithMessages) -> UserMessagesResponse {
    let UserWithMessages { user, messages } = found;
    UserMessagesResponse {
        user_id: user.user_id,
        utc_created_at: unix_seconds(&user.utc_created_at),
        utc_created_at_formatted: display_time(&user.utc_created_at),
        ban_reason: user.ban_reason,
        additional_info: user.additional_info,
        messages: messages.into_iter().map(message_response).collect(),
    }
}
