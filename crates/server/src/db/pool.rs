use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Accounts (role: 1 none .. 6 admin)
CREATE TABLE IF NOT EXISTS accounts (
    id            BIGSERIAL PRIMARY KEY,
    username      TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role          INTEGER NOT NULL DEFAULT 3,
    active        BOOLEAN NOT NULL DEFAULT TRUE,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Posts
CREATE TABLE IF NOT EXISTS posts (
    id          BIGSERIAL PRIMARY KEY,
    author_id   BIGINT NOT NULL REFERENCES accounts(id),
    title       TEXT NOT NULL,
    body        TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at DESC);

-- Uploaded game records; the row id is the game id
CREATE TABLE IF NOT EXISTS files (
    id            BIGSERIAL PRIMARY KEY,
    uploader_id   BIGINT NOT NULL REFERENCES accounts(id),
    post_id       BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    file_name     TEXT NOT NULL,
    file_contents TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_files_post_id ON files (post_id);

-- Runtime toggles editable from the admin panel
CREATE TABLE IF NOT EXISTS app_settings (
    key     TEXT PRIMARY KEY,
    enabled BOOLEAN NOT NULL
);

-- Game viewer cursor, one row per client session
CREATE TABLE IF NOT EXISTS view_sessions (
    session_id      TEXT PRIMARY KEY,
    tracked_game_id BIGINT,
    ply             INTEGER NOT NULL DEFAULT 0,
    cached_raw_text TEXT,
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_view_sessions_updated_at ON view_sessions(updated_at);
"#;
