use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users + messages)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                user_id         INTEGER PRIMARY KEY NOT NULL,
                ban_reason      TEXT,
                additional_info TEXT,
                utc_created_at  TEXT NOT NULL
            );

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                user_id     INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                text        TEXT NOT NULL CHECK (length(text) > 0)
            );

            CREATE INDEX idx_messages_user ON messages(user_id);
            CREATE INDEX idx_messages_text ON messages(text);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
