use crate::Database;
use crate::models::{
    CreateOutcome, MessageColumn, MessageRow, NewUser, UserColumn, UserDumpRow, UserRow,
    UserWithMessages, decode_timestamp, encode_timestamp,
};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use tracing::{debug, info};

impl Database {
    // -- Users --

    /// Insert a user together with its first message, atomically.
    pub fn create_user(&self, new: &NewUser) -> Result<CreateOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user(&tx, new.user_id)?.is_some() {
                debug!("User {} already present", new.user_id);
                return Ok(CreateOutcome::AlreadyExists);
            }

            let created_at = Utc::now();
            let inserted = tx.execute(
                "INSERT INTO users (user_id, ban_reason, additional_info, utc_created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    new.user_id,
                    new.ban_reason,
                    new.additional_info,
                    encode_timestamp(&created_at)
                ],
            );
            match inserted {
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation
                        && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
                {
                    return Ok(CreateOutcome::AlreadyExists);
                }
                other => {
                    other?;
                }
            }

            tx.execute(
                "INSERT INTO messages (user_id, text) VALUES (?1, ?2)",
                rusqlite::params![new.user_id, new.message],
            )?;
            let message_id = tx.last_insert_rowid();
            tx.commit()?;

            info!("User {} added with message {}", new.user_id, message_id);
            Ok(CreateOutcome::Created {
                user: UserRow {
                    user_id: new.user_id,
                    ban_reason: new.ban_reason.clone(),
                    additional_info: new.additional_info.clone(),
                    utc_created_at: created_at,
                },
                message: MessageRow {
                    id: message_id,
                    user_id: new.user_id,
                    text: new.message.clone(),
                },
            })
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserWithMessages>> {
        self.with_conn(|conn| query_user_with_messages(conn, user_id))
    }

    /// Delete a user (messages go with it through the cascade) and return
    /// what was removed.
    pub fn delete_user(&self, user_id: i64) -> Result<Option<UserWithMessages>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(snapshot) = query_user_with_messages(&tx, user_id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM users WHERE user_id = ?1", [user_id])?;
            tx.commit()?;

            info!(
                "User {} deleted together with {} message(s)",
                user_id,
                snapshot.messages.len()
            );
            Ok(Some(snapshot))
        })
    }

    // -- Messages --

    pub fn message_exists(&self, text: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM messages WHERE text = ?1 LIMIT 1", [text], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Dump support --

    /// Every user with its latest message text, sorted ascending by `order`.
    pub fn users_for_dump(&self, order: &[UserColumn]) -> Result<Vec<UserDumpRow>> {
        let sql = format!(
            "SELECT u.user_id, u.ban_reason, u.additional_info, u.utc_created_at,
                    (SELECT m.text FROM messages m
                     WHERE m.user_id = u.user_id
                     ORDER BY m.id DESC LIMIT 1)
             FROM users u
             {}",
            order_clause(order.iter().map(|c| c.as_sql()), "u.")
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserDumpRow {
                        user: user_from_row(row)?,
                        last_message: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn messages_for_dump(&self, order: &[MessageColumn]) -> Result<Vec<MessageRow>> {
        let sql = format!(
            "SELECT id, user_id, text FROM messages {}",
            order_clause(order.iter().map(|c| c.as_sql()), "")
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Write a consistent copy of the whole database to `dest`, replacing any
    /// file already there.
    pub fn copy_to(&self, dest: &Path) -> Result<()> {
        match std::fs::remove_file(dest) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("removing {}", dest.display())),
        }

        let dest_str = dest
            .to_str()
            .with_context(|| format!("non UTF-8 path: {}", dest.display()))?;
        self.with_conn(|conn| {
            conn.execute("VACUUM INTO ?1", [dest_str])?;
            Ok(())
        })?;

        info!("Database copied to {}", dest.display());
        Ok(())
    }
}

fn order_clause<'a>(columns: impl Iterator<Item = &'a str>, prefix: &str) -> String {
    let cols: Vec<String> = columns.map(|c| format!("{prefix}{c} ASC")).collect();
    if cols.is_empty() {
        String::new()
    } else {
        format!("ORDER BY {}", cols.join(", "))
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    let raw_created: String = row.get(3)?;
    Ok(UserRow {
        user_id: row.get(0)?,
        ban_reason: row.get(1)?,
        additional_info: row.get(2)?,
        utc_created_at: decode_timestamp(3, &raw_created)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
    })
}

fn query_user(conn: &Connection, user_id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, ban_reason, additional_info, utc_created_at FROM users WHERE user_id = ?1",
    )?;

    let row = stmt.query_row([user_id], user_from_row).optional()?;

    Ok(row)
}

fn query_user_with_messages(conn: &Connection, user_id: i64) -> Result<Option<UserWithMessages>> {
    let Some(user) = query_user(conn, user_id)? else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT id, user_id, text FROM messages WHERE user_id = ?1 ORDER BY id")?;
    let messages = stmt
        .query_map([user_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(UserWithMessages { user, messages }))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
