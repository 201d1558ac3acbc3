//! Repository trait definitions for resource-tree data access.
//!
//! All operations are async and free of tree semantics. Writes that must be
//! applied together go through a [`ResourceTransaction`] obtained from
//! [`ResourceRepository::begin`].

use crate::error::StoreResult;
use crate::models::resource::{ResourceNode, ResourceNodeSummary, UpdateResourceNode};

pub trait ResourceRepository: Send + Sync {
    type Transaction: ResourceTransaction;

    /// Every stored node, ordered by id.
    fn fetch_all(&self) -> impl Future<Output = StoreResult<Vec<ResourceNode>>> + Send;

    /// Nodes matching `id`. Empty when the node does not exist.
    fn fetch_one(&self, id: &str) -> impl Future<Output = StoreResult<Vec<ResourceNode>>> + Send;

    fn fetch_summaries(&self)
    -> impl Future<Output = StoreResult<Vec<ResourceNodeSummary>>> + Send;

    fn fetch_inner_flag(&self, id: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Service code of a node; empty when none is associated.
    fn fetch_service_code(&self, id: &str) -> impl Future<Output = StoreResult<String>> + Send;

    fn insert(&self, node: &ResourceNode) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrite name, parent and service code of an existing node.
    fn update(&self, input: &UpdateResourceNode) -> impl Future<Output = StoreResult<()>> + Send;

    fn begin(&self) -> impl Future<Output = StoreResult<Self::Transaction>> + Send;
}

/// A unit of work over the resource tables.
///
/// Nothing issued through a transaction is visible in the store until
/// [`commit`](ResourceTransaction::commit) succeeds.
pub trait ResourceTransaction: Send {
    /// Remove role assignment rows referencing the node.
    fn delete_role_relations(&mut self, id: &str)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove theme binding rows referencing the node.
    fn delete_theme_relations(&mut self, id: &str)
    -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_node(&mut self, id: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Apply every issued statement. Implementations that defer statements
    /// to commit report a rejected statement as
    /// [`StoreError::Statement`](crate::error::StoreError::Statement).
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;
}
