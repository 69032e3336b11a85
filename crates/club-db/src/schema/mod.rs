//! Schema bootstrap
//!
//! Both binaries run [`ensure_schema`] at startup; the script only creates
//! what is missing.

use sqlx::PgPool;
use tracing::info;

/// Complete schema of the subscription store
pub const SCHEMA: &str = include_str!("schema.sql");

/// Create tables and indexes that do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("Database schema ensured");
    Ok(())
}
