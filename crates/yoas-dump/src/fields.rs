use std::collections::HashSet;
use std::hash::Hash;

use yoas_db::{MessageColumn, MessageRow, UserColumn, UserDumpRow};
use yoas_types::models::{display_time, unix_seconds};

use crate::DumpError;
use crate::writers::Cell;

/// A named, selectable column of a dump.
pub trait Field: Copy + Eq + Hash + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// Fields selectable with `include` on the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    UserId,
    BanReason,
    AdditionalInfo,
    LastMessage,
    TimestampUtcCreatedAt,
    StringUtcCreatedAt,
}

impl Field for UserField {
    const ALL: &'static [Self] = &[
        Self::UserId,
        Self::BanReason,
        Self::AdditionalInfo,
        Self::LastMessage,
        Self::TimestampUtcCreatedAt,
        Self::StringUtcCreatedAt,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::BanReason => "ban_reason",
            Self::AdditionalInfo => "additional_info",
            Self::LastMessage => "last_message",
            Self::TimestampUtcCreatedAt => "timestamp_utc_created_at",
            Self::StringUtcCreatedAt => "string_utc_created_at",
        }
    }
}

impl UserField {
    pub fn value(self, row: &UserDumpRow) -> Cell {
        match self {
            Self::UserId => Cell::Integer(row.user.user_id),
            Self::BanReason => row.user.ban_reason.clone().into(),
            Self::AdditionalInfo => row.user.additional_info.clone().into(),
            Self::LastMessage => row.last_message.clone().into(),
            Self::TimestampUtcCreatedAt => Cell::Real(unix_seconds(&row.user.utc_created_at)),
            Self::StringUtcCreatedAt => Cell::Text(display_time(&row.user.utc_created_at)),
        }
    }

    pub fn sqlite_type(self) -> &'static str {
        match self {
            Self::UserId => "INTEGER",
            Self::TimestampUtcCreatedAt => "REAL",
            Self::StringUtcCreatedAt => "VARCHAR(255)",
            Self::BanReason | Self::AdditionalInfo | Self::LastMessage => "TEXT",
        }
    }
}

/// Fields selectable with `include` on the messages table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageField {
    Id,
    UserId,
    Text,
}

impl Field for MessageField {
    const ALL: &'static [Self] = &[Self::Id, Self::UserId, Self::Text];

    fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UserId => "user_id",
            Self::Text => "text",
        }
    }
}

impl MessageField {
    pub fn value(self, row: &MessageRow) -> Cell {
        match self {
            Self::Id => Cell::Integer(row.id),
            Self::UserId => Cell::Integer(row.user_id),
            Self::Text => Cell::Text(row.text.clone()),
        }
    }

    /// `entries` already has its own `id` primary key.
    pub fn sqlite_name(self) -> &'static str {
        match self {
            Self::Id => "message_id",
            other => other.name(),
        }
    }

    pub fn sqlite_type(self) -> &'static str {
        match self {
            Self::Id | Self::UserId => "INTEGER",
            Self::Text => "TEXT",
        }
    }
}

impl Field for UserColumn {
    const ALL: &'static [Self] = &UserColumn::COLUMNS;

    fn name(self) -> &'static str {
        self.as_sql()
    }
}

impl Field for MessageColumn {
    const ALL: &'static [Self] = &MessageColumn::COLUMNS;

    fn name(self) -> &'static str {
        self.as_sql()
    }
}

/// Resolve a user-supplied, ordered field list.
///
/// An empty list means `default`. Duplicates are rejected before unknown
/// names so the caller sees the cheaper mistake first.
pub fn parse_list<F: Field>(
    param: &'static str,
    raw: &[String],
    default: &[F],
) -> Result<Vec<F>, DumpError> {
    if raw.is_empty() {
        return Ok(default.to_vec());
    }

    let mut seen = HashSet::with_capacity(raw.len());
    if !raw.iter().all(|name| seen.insert(name.as_str())) {
        return Err(DumpError::Duplicate { param });
    }

    raw.iter()
        .map(|name| {
            F::parse(name).ok_or_else(|| DumpError::UnknownField {
                param,
                allowed: quoted_list(F::ALL.iter().map(|f| f.name())),
            })
        })
        .collect()
}

pub(crate) fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(|n| format!("\"{n}\"")).collect::<Vec<_>>().join(", ")
}
