//! PostgreSQL storage layer

use anyhow::Context;
use async_trait::async_trait;
use registry_core::ports::UserStore;
use registry_core::{ReceivedUser, RegisteredUser, RegistryError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        tracing::info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        tracing::info!("PostgreSQL connection established, ensuring schema...");

        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!("Database initialization complete");

        Ok(Self { pool })
    }

    // The only schema management in the system. Registered and received
    // users are intentionally separate tables with no foreign key: they
    // arrive via independent paths.
    async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS RegisteredUser (
                username TEXT PRIMARY KEY
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ReceivedUser (
                username TEXT PRIMARY KEY
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl UserStore for Database {
    async fn add_registered(&self, username: &str) -> registry_core::Result<()> {
        sqlx::query("INSERT INTO RegisteredUser (username) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_registered(
        &self,
        username: &str,
    ) -> registry_core::Result<Option<RegisteredUser>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT username FROM RegisteredUser WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(row.map(|(username,)| RegisteredUser { username }))
    }

    async fn add_received(&self, username: &str) -> registry_core::Result<()> {
        sqlx::query("INSERT INTO ReceivedUser (username) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_received(&self) -> registry_core::Result<Vec<ReceivedUser>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT username FROM ReceivedUser")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(username,)| ReceivedUser { username })
            .collect())
    }
}
