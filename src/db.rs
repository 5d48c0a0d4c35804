use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Errors surfaced by the repositories.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the field name.
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    _ => "key",
                };
                return StoreError::Duplicate(field);
            }
        }
        StoreError::Backend(anyhow::Error::new(err).context("database query"))
    }
}

/// PostgreSQL-backed store; the repository traits are implemented per module.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}
