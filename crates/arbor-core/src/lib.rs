//! Arbor Core: resource tree models, traversal and mutation rules.
//!
//! This crate provides:
//! - Domain models ([`models::resource`])
//! - Error types and result tags ([`ResourceError`], [`StoreError`])
//! - Repository traits implemented by storage crates ([`repository`])
//! - Descendant traversal over in-memory snapshots ([`tree`])
//! - Input validation ([`validation`])
//! - The mutation engine ([`ResourceService`])

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod tree;
pub mod validation;

pub use error::{
    ResourceError, ResourceResult, SUCCESS_TAG, StorageStep, StoreError, StoreResult, result_tag,
};
pub use service::{ResourceService, ResourceServiceConfig};
