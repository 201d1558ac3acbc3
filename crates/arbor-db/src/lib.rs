//! Arbor Database: SurrealDB connection management and the resource
//! repository.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - The [`ResourceRepository`](arbor_core::repository::ResourceRepository)
//!   implementation ([`repository::SurrealResourceRepository`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{SYSTEM_RESOURCE_IDS, run_migrations};
