//! Common library for the FrameLab services
//!
//! Shared infrastructure of the FrameLab binaries: the PostgreSQL pool behind
//! the generation history, its error type, and tracing initialisation.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     common::telemetry::init_tracing()?;
//!
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     tracing::info!("History database healthy: {}", health_check(&pool).await?);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod telemetry;
