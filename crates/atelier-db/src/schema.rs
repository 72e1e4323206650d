//! Schema definition, portable across PostgreSQL and SQLite.
//!
//! Everything is TEXT-keyed: UUIDs and RFC 3339 timestamps are stored as
//! strings (see `atelier_common::models::row`). The unique indexes on
//! `team_members` and `conversation_participants` are the storage-level
//! backstop for the engine's check-then-insert idempotence guards.

use sqlx::AnyPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        program TEXT NOT NULL,
        skills TEXT NOT NULL DEFAULT '[]',
        bio TEXT NOT NULL DEFAULT '',
        studio_preferences TEXT NOT NULL DEFAULT '[]',
        avatar_url TEXT,
        portfolio_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        studio TEXT NOT NULL,
        looking_for TEXT NOT NULL DEFAULT '',
        skills_needed TEXT NOT NULL DEFAULT '[]',
        owner_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS team_members (
        team_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        role TEXT NOT NULL,
        status TEXT NOT NULL,
        joined_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_team_members_pair ON team_members (team_id, user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS matches (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        target_user_id TEXT NOT NULL,
        team_id TEXT,
        kind TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_matches_actor ON matches (user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS ix_matches_target ON matches (target_user_id, status)",
    r#"
    CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        match_id TEXT,
        team_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_conversations_team ON conversations (team_id, kind)",
    r#"
    CREATE TABLE IF NOT EXISTS conversation_participants (
        conversation_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        joined_at TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_participants_pair ON conversation_participants (conversation_id, user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL,
        sender_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_messages_conversation ON messages (conversation_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS message_reads (
        conversation_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        last_read_at TEXT NOT NULL,
        PRIMARY KEY (conversation_id, user_id)
    )
    "#,
];

/// Apply the schema. Safe to call repeatedly.
pub async fn migrate(pool: &AnyPool) -> Result<(), sqlx::Error> {
    tracing::info!("Applying schema ({} statements)", STATEMENTS.len());
    for stmt in STATEMENTS {
        sqlx::query(stmt).execute(pool).await?;
    }
    tracing::info!("Schema ready");
    Ok(())
}
