//! # club-db
//!
//! Subscription store implemented on PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations of the repository traits
//! defined in `club-core`. It handles:
//!
//! - Connection pool management
//! - Idempotent schema bootstrap
//! - Database models with SQLx `FromRow` derives
//! - Row ↔ entity mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use club_db::{create_pool, ensure_schema, PgMemberRepository, PoolConfig};
//!
//! async fn example(settings: &club_common::DatabaseConfig) -> Result<(), sqlx::Error> {
//!     let pool = create_pool(&PoolConfig::from(settings)).await?;
//!     ensure_schema(&pool).await?;
//!     let member_repo = PgMemberRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use pool::{create_pool, PgPool, PoolConfig};
pub use repositories::{PgMemberRepository, PgPaymentRepository};
pub use schema::{ensure_schema, SCHEMA};
