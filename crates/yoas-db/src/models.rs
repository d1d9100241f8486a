//! Database row types. These map directly to SQLite rows and are kept apart
//! from the yoas-types API shapes so the DB layer stays independent.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for `utc_created_at`. Fixed width, so text order is time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: i64,
    pub ban_reason: Option<String>,
    pub additional_info: Option<String>,
    pub utc_created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserWithMessages {
    pub user: UserRow,
    pub messages: Vec<MessageRow>,
}

/// A user as seen by the dumper: the row plus the text of its latest message.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDumpRow {
    pub user: UserRow,
    pub last_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: i64,
    pub ban_reason: Option<String>,
    pub additional_info: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created { user: UserRow, message: MessageRow },
    AlreadyExists,
}

/// Sortable `users` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserColumn {
    UserId,
    BanReason,
    AdditionalInfo,
    UtcCreatedAt,
}

impl UserColumn {
    pub const COLUMNS: [Self; 4] = [
        Self::UserId,
        Self::BanReason,
        Self::AdditionalInfo,
        Self::UtcCreatedAt,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::BanReason => "ban_reason",
            Self::AdditionalInfo => "additional_info",
            Self::UtcCreatedAt => "utc_created_at",
        }
    }
}

/// Sortable `messages` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageColumn {
    Id,
    UserId,
    Text,
}

impl MessageColumn {
    pub const COLUMNS: [Self; 3] = [Self::Id, Self::UserId, Self::Text];

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UserId => "user_id",
            Self::Text => "text",
        }
    }
}

pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn decode_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|ndt| ndt.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
