pub mod access;
pub mod dump;
pub mod error;
pub mod messages;
pub mod root;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, routing::get};
use yoas_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub access_key: String,
    /// Route prefix, always starting with `/`.
    pub api_prefix: String,
    /// Public address advertised in the welcome text.
    pub main_address: Option<String>,
    pub dump_dir: PathBuf,
    /// Serializes dumps: purge, write and open happen as one step.
    pub dump_lock: tokio::sync::Mutex<()>,
}

impl AppStateInner {
    pub fn new(db: Database, access_key: String, api_prefix: String, dump_dir: PathBuf) -> Self {
        Self {
            db,
            access_key,
            api_prefix,
            main_address: None,
            dump_dir,
            dump_lock: tokio::sync::Mutex::new(()),
        }
    }
}

/// All routes: `GET /` plus the API nested under the configured prefix and
/// its `/latest` and `/v1` aliases.
pub fn router(state: AppState) -> Router {
    let api: Router<AppState> = Router::new()
        .route(
            "/user",
            get(users::get_user)
                .post(users::create_user)
                .delete(users::delete_user),
        )
        .route("/message", get(messages::get_message))
        .route("/dump", get(dump::database_dump));

    let base = if state.api_prefix == "/" {
        ""
    } else {
        state.api_prefix.as_str()
    };

    let mut app = Router::new().route("/", get(root::root));
    if base.is_empty() {
        app = app.merge(api.clone());
    } else {
        app = app.route(base, get(root::api_root)).nest(base, api.clone());
    }
    for alias in ["latest", "v1"] {
        let mount = format!("{base}/{alias}");
        app = app.route(&mount, get(root::api_root)).nest(&mount, api.clone());
    }

    app.with_state(state)
}
