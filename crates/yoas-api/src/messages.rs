use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use yoas_types::api::MessageFound;
use yoas_types::text::normalize_message_text;

use crate::AppState;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub message_text: String,
}

/// GET /message?message_text= — is this text already on record?
pub async fn get_message(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<MessageQuery>, AppError>,
) -> Result<(StatusCode, Json<MessageFound>)> {
    let text = normalize_message_text(&query.message_text);

    let db = state.clone();
    let found = tokio::task::spawn_blocking(move || db.db.message_exists(&text)).await??;

    let status = if found { StatusCode::OK } else { StatusCode::NOT_FOUND };
    Ok((status, Json(MessageFound { found })))
}
