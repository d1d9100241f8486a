//! Export of the ban-list tables to flat files.
//!
//! A dump reads every row of one table, keeps the requested fields in the
//! requested order, sorts by the requested keys and writes the result as
//! CSV, JSON or a standalone SQLite database.

pub mod fields;
pub mod writers;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use yoas_db::{Database, MessageColumn, UserColumn};

use crate::fields::{Field, MessageField, UserField, parse_list, quoted_list};
use crate::writers::{Column, Projection, write_csv, write_json, write_sqlite};

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("\"table\" parameter must be: {allowed}")]
    InvalidTable { allowed: String },
    #[error("\"file_format\" parameter must be: {allowed}")]
    InvalidFormat { allowed: String },
    #[error("\"{param}\" parameter has duplicate values")]
    Duplicate { param: &'static str },
    #[error("\"{param}\" parameter must be a list of: {allowed}")]
    UnknownField { param: &'static str, allowed: String },
    #[error(transparent)]
    Database(#[from] anyhow::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DumpError {
    /// True when the request itself was wrong, as opposed to a failure while
    /// reading the database or writing the file.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            Self::InvalidTable { .. }
                | Self::InvalidFormat { .. }
                | Self::Duplicate { .. }
                | Self::UnknownField { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Messages,
}

impl Table {
    pub const ALL: [Self; 2] = [Self::Users, Self::Messages];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Messages => "messages",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DumpError::InvalidTable {
                allowed: quoted_list(Self::ALL.iter().map(|t| t.as_str())),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// A new SQLite database file.
    Db,
    Csv,
    Json,
}

impl FileFormat {
    pub const ALL: [Self; 3] = [Self::Db, Self::Csv, Self::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Db => "db",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for FileFormat {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "sqlite" {
            return Ok(Self::Db);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == s)
            .ok_or_else(|| DumpError::InvalidFormat {
                allowed: quoted_list(Self::ALL.iter().map(|f| f.extension())),
            })
    }
}

/// Everything a dump needs besides the output location.
#[derive(Debug, Clone)]
pub struct DumpRequest {
    pub table: Table,
    pub format: FileFormat,
    /// Field names to keep, in output order. Empty keeps every field.
    pub include: Vec<String>,
    /// Sort keys, ascending, in priority order. Empty uses the table default.
    pub order_by: Vec<String>,
    /// `Db` format only: copy the whole database instead of one table.
    pub original_db: bool,
    /// `Json` format only.
    pub indent: Option<usize>,
}

impl DumpRequest {
    pub fn new(table: Table, format: FileFormat) -> Self {
        Self {
            table,
            format,
            include: Vec::new(),
            order_by: Vec::new(),
            original_db: false,
            indent: None,
        }
    }
}

pub struct Dumper<'a> {
    db: &'a Database,
}

impl<'a> Dumper<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Write `<dir>/<stem>.<ext>` and return its path. An existing file with
    /// that name is replaced.
    pub fn dump(&self, req: &DumpRequest, dir: &Path, stem: &str) -> Result<PathBuf, DumpError> {
        let path = dir.join(format!("{stem}.{}", req.format.extension()));

        if req.format == FileFormat::Db && req.original_db {
            self.db.copy_to(&path)?;
            info!("Dumped full database to {}", path.display());
            return Ok(path);
        }

        let projection = self.project(req)?;
        match req.format {
            FileFormat::Db => write_sqlite(&path, &projection)?,
            FileFormat::Csv => write_csv(&path, &projection)?,
            FileFormat::Json => write_json(&path, &projection, req.indent)?,
        }

        info!(
            "Dumped {} row(s) of {} to {}",
            projection.rows.len(),
            req.table,
            path.display()
        );
        Ok(path)
    }

    /// Validate the field lists and load the table as output-ready rows.
    pub fn project(&self, req: &DumpRequest) -> Result<Projection, DumpError> {
        match req.table {
            Table::Users => {
                let include = parse_list("include", &req.include, UserField::ALL)?;
                let order = parse_list("order_by", &req.order_by, &[UserColumn::UtcCreatedAt])?;
                debug!(?include, ?order, "Projecting users");

                let rows = self.db.users_for_dump(&order)?;
                Ok(Projection {
                    columns: include
                        .iter()
                        .map(|f| Column {
                            name: f.name(),
                            sqlite_name: f.name(),
                            sqlite_type: f.sqlite_type(),
                        })
                        .collect(),
                    rows: rows
                        .iter()
                        .map(|row| include.iter().map(|f| f.value(row)).collect())
                        .collect(),
                })
            }
            Table::Messages => {
                let include = parse_list("include", &req.include, MessageField::ALL)?;
                let order = parse_list("order_by", &req.order_by, &[MessageColumn::Id])?;
                debug!(?include, ?order, "Projecting messages");

                let rows = self.db.messages_for_dump(&order)?;
                Ok(Projection {
                    columns: include
                        .iter()
                        .map(|f| Column {
                            name: f.name(),
                            sqlite_name: f.sqlite_name(),
                            sqlite_type: f.sqlite_type(),
                        })
                        .collect(),
                    rows: rows
                        .iter()
                        .map(|row| include.iter().map(|f| f.value(row)).collect())
                        .collect(),
                })
            }
        }
    }
}

/// File name (without extension) for a dump taken at `now`.
pub fn dump_stem(table: Table, now: DateTime<Utc>) -> String {
    format!("{}-dump-{}", table, now.format("%d.%m.%Y-%H.%M.%S"))
}

/// Remove files left behind by earlier dumps. Returns how many were removed.
pub fn purge_stale_dumps(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let is_dump = name.contains("-dump-")
            && FileFormat::ALL
                .iter()
                .any(|f| name.ends_with(&format!(".{}", f.extension())));
        if is_dump {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    if removed > 0 {
        debug!("Removed {} stale dump file(s) from {}", removed, dir.display());
    }
    Ok(removed)
}
