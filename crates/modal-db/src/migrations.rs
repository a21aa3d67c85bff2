use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_profiles (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL,
            bio         TEXT,
            avatar_url  TEXT,
            join_date   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS security_questions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL,
            question1   TEXT,
            answer1     TEXT,
            question2   TEXT,
            answer2     TEXT,
            question3   TEXT,
            answer3     TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id    INTEGER NOT NULL,
            receiver_id  INTEGER NOT NULL,
            content      TEXT NOT NULL,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_pair
            ON messages(sender_id, receiver_id, created_at);

        -- answers holds a JSON document as text
        CREATE TABLE IF NOT EXISTS quiz_results (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          INTEGER NOT NULL,
            score            INTEGER NOT NULL,
            total_questions  INTEGER NOT NULL,
            answers          TEXT,
            created_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS online_users (
            user_id    INTEGER PRIMARY KEY,
            last_seen  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS calculation_history (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id      INTEGER NOT NULL,
            type         TEXT NOT NULL,
            input        TEXT NOT NULL,
            result       TEXT NOT NULL,
            description  TEXT,
            created_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_calculation_history_user
            ON calculation_history(user_id, created_at);

        CREATE TABLE IF NOT EXISTS user_preferences (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        INTEGER NOT NULL UNIQUE,
            theme          TEXT NOT NULL DEFAULT 'light',
            language       TEXT NOT NULL DEFAULT 'en',
            notifications  INTEGER NOT NULL DEFAULT 1,
            auto_save      INTEGER NOT NULL DEFAULT 1,
            updated_at     TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
