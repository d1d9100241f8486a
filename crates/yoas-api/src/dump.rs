use axum::{
    body::Body,
    extract::State,
    http::header,
    response::IntoResponse,
};
use axum_extra::extract::{Query, WithRejection};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use yoas_dump::{DumpError, DumpRequest, Dumper, FileFormat, Table, dump_stem, purge_stale_dumps};

use crate::AppState;
use crate::error::{AppError, Result};

/// Query string of `GET /dump`. Lists come from repeated keys, e.g.
/// `?include=user_id&include=string_utc_created_at`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpQuery {
    pub table: Option<String>,
    pub file_format: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub original_db: bool,
    pub indent: Option<i64>,
}

impl DumpQuery {
    fn into_request(self) -> Result<DumpRequest> {
        let table: Table = self.table.as_deref().unwrap_or("users").parse()?;
        let format: FileFormat = self.file_format.as_deref().unwrap_or("csv").parse()?;
        Ok(DumpRequest {
            table,
            format,
            include: self.include,
            order_by: self.order_by,
            original_db: self.original_db,
            // Zero or negative widths mean single-line output
            indent: self.indent.and_then(|n| usize::try_from(n).ok()).filter(|n| *n > 0),
        })
    }
}

/// GET /dump — export one table (or the whole database) and stream the file.
///
/// `original_db` only applies to the `db` format and makes a 1:1 copy of the
/// database, ignoring `table`, `include` and `order_by`. `indent` only
/// applies to `json`; absent, zero or negative means a single line.
pub async fn database_dump(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DumpQuery>, AppError>,
) -> Result<impl IntoResponse> {
    let req = query.into_request()?;

    // Held until the file is opened so a concurrent purge can't remove it.
    let guard = state.dump_lock.lock().await;

    let db = state.clone();
    let path = tokio::task::spawn_blocking(move || -> std::result::Result<_, DumpError> {
        std::fs::create_dir_all(&db.dump_dir)?;
        purge_stale_dumps(&db.dump_dir)?;
        let stem = dump_stem(req.table, chrono::Utc::now());
        Dumper::new(&db.db).dump(&req, &db.dump_dir, &stem)
    })
    .await??;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        error!("Failed to open dump {}: {}", path.display(), e);
        AppError::Dump(e.into())
    })?;
    drop(guard);

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dump")
        .to_string();
    info!("Serving dump {}", filename);

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    ))
}
