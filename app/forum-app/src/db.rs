//! Database pool and forum schema

use crate::config::AppConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_open_conns)
        .min_connections(config.db_max_idle_conns.min(config.db_max_open_conns))
        .idle_timeout(config.db_max_idle_time)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Create question tables. Expects the `users` table from the auth migrations.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id BIGSERIAL PRIMARY KEY,
            content TEXT NOT NULL,
            location VARCHAR(255) NOT NULL DEFAULT '',
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            parent_id BIGINT REFERENCES questions(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_parent ON questions(parent_id);")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flagged_questions (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            parent_id BIGINT,
            location VARCHAR(255) NOT NULL DEFAULT '',
            reason TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Forum migrations completed");
    Ok(())
}
