//! SurrealDB repository implementations.

mod resource;

pub use resource::{SurrealResourceRepository, SurrealResourceTransaction};
