use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use yoas_types::api::WelcomeResponse;

use crate::AppState;

const INTRO: &str = "This is the YOAS (Your Own Anti-Spam System) API.";

/// GET / — points visitors at the full API address.
pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> Json<WelcomeResponse> {
    let origin = match state.main_address.as_deref() {
        Some(addr) => addr.trim_end_matches('/').to_string(),
        None => headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(|host| format!("http://{host}"))
            .unwrap_or_default(),
    };

    Json(WelcomeResponse {
        welcome_text: format!("{INTRO} Check {origin}{} for more info.", state.api_prefix),
    })
}

/// GET {prefix}
pub async fn api_root(State(state): State<AppState>) -> Json<WelcomeResponse> {
    let main_address = state
        .main_address
        .as_deref()
        .map(|addr| format!(" Main address: {addr}."))
        .unwrap_or_default();

    Json(WelcomeResponse {
        welcome_text: format!(
            "{INTRO}{main_address} It is something like a copy of CAS API to have your own \
             database of bans if you need it for some reason. More info about CAS and CAS API \
             can be found here: https://cas.chat"
        ),
    })
}
