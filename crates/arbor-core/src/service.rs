//! Resource tree service: create, update and cascading delete.

use tracing::{debug, error, info, warn};

use crate::error::{ResourceError, ResourceResult, StorageStep, StoreError};
use crate::models::resource::{
    CreateResourceNode, ResourceNode, ResourceNodeSummary, UpdateResourceNode,
};
use crate::repository::{ResourceRepository, ResourceTransaction};
use crate::tree::{self, Descendants, ResourceForest};
use crate::validation;

/// Behaviour switches for [`ResourceService`].
#[derive(Debug, Clone, Default)]
pub struct ResourceServiceConfig {
    /// Fail with [`ResourceError::MalformedHierarchy`] when a traversal runs
    /// into a self-parented or cyclic node. When `false` the malformed branch
    /// is logged and skipped and the partial descendant set is used.
    pub strict_hierarchy: bool,
}

/// Resource tree service.
///
/// Generic over the repository implementation so that tree rules have no
/// dependency on the database crate.
pub struct ResourceService<R: ResourceRepository> {
    repo: R,
    config: ResourceServiceConfig,
}

impl<R: ResourceRepository> ResourceService<R> {
    pub fn new(repo: R, config: ResourceServiceConfig) -> Self {
        Self { repo, config }
    }

    /// Validate, derive type-dependent fields and store a new node.
    pub async fn create(&self, input: CreateResourceNode) -> ResourceResult<ResourceNode> {
        let node = validation::prepare_create(input).inspect_err(|e| {
            warn!(error = %e, "Rejected resource create");
        })?;

        self.repo.insert(&node).await.map_err(|e| {
            error!(resource_id = %node.id, error = %e, "Failed to insert resource");
            ResourceError::storage(StorageStep::Insert, e)
        })?;

        info!(
            resource_id = %node.id,
            parent_id = %node.parent_id,
            resource_type = %node.resource_type,
            "Resource created"
        );
        Ok(node)
    }

    /// Full detail rows for one resource id.
    pub async fn query(&self, id: &str) -> ResourceResult<Vec<ResourceNode>> {
        self.repo
            .fetch_one(id)
            .await
            .map_err(|e| fetch_failed(StorageStep::Fetch, e))
    }

    pub async fn inner_flag(&self, id: &str) -> ResourceResult<bool> {
        self.repo
            .fetch_inner_flag(id)
            .await
            .map_err(|e| fetch_failed(StorageStep::Fetch, e))
    }

    pub async fn service_code(&self, id: &str) -> ResourceResult<String> {
        self.repo
            .fetch_service_code(id)
            .await
            .map_err(|e| fetch_failed(StorageStep::Fetch, e))
    }

    /// All strict descendants of `root_id`.
    pub async fn get_children(&self, root_id: &str) -> ResourceResult<Vec<ResourceNode>> {
        let all = self.snapshot(StorageStep::Fetch).await?;
        let descendants = self.descendants(&all, root_id)?;
        Ok(descendants.nodes)
    }

    /// Candidate parents for `exclude_root_id`: every node outside its
    /// subtree. The root itself is kept.
    pub async fn get_nodes(&self, exclude_root_id: &str) -> ResourceResult<Vec<ResourceNodeSummary>> {
        let summaries = self
            .repo
            .fetch_summaries()
            .await
            .map_err(|e| fetch_failed(StorageStep::Fetch, e))?;

        let all = self.snapshot(StorageStep::Descendants).await?;
        let descendants = self.descendants(&all, exclude_root_id)?;
        let excluded = descendants.ids();

        Ok(summaries
            .into_iter()
            .filter(|s| !excluded.contains(s.id.as_str()))
            .collect())
    }

    /// Rename and/or reparent a node, refusing moves that would create a
    /// cycle. Subsystem nodes stay at the top level whatever parent is
    /// requested, and the inner flag is re-derived from the service code.
    pub async fn update(&self, input: UpdateResourceNode) -> ResourceResult<()> {
        let id = input.id.clone();
        let mut input = validation::prepare_update(input).inspect_err(|e| {
            warn!(resource_id = %id, error = %e, "Rejected resource update");
        })?;

        let all = self.snapshot(StorageStep::Descendants).await?;
        let forced = all
            .iter()
            .find(|n| n.id == input.id)
            .and_then(|n| n.resource_type.forced_parent());
        if let Some(forced) = forced.filter(|&forced| forced != input.parent_id) {
            debug!(
                resource_id = %input.id,
                requested = %input.parent_id,
                "Subsystem parent pinned to top level"
            );
            input.parent_id = forced.to_string();
        }

        let descendants = self.descendants(&all, &input.id)?;
        if descendants.contains(&input.parent_id) {
            warn!(
                resource_id = %input.id,
                parent_id = %input.parent_id,
                "Rejected move under own descendant"
            );
            return Err(ResourceError::Cycle {
                id: input.id,
                parent_id: input.parent_id,
            });
        }

        self.repo.update(&input).await.map_err(|e| {
            error!(resource_id = %input.id, error = %e, "Failed to update resource");
            ResourceError::storage(StorageStep::Update, e)
        })?;

        info!(
            resource_id = %input.id,
            parent_id = %input.parent_id,
            inner_flag = input.inner_flag(),
            "Resource updated"
        );
        Ok(())
    }

    /// Delete a node, its whole subtree and every role/theme row that
    /// references them, atomically.
    ///
    /// A system-owned node anywhere in the subtree aborts the delete and
    /// leaves the store untouched.
    pub async fn delete(&self, root_id: &str) -> ResourceResult<()> {
        debug!(resource_id = %root_id, "Delete: fetching snapshot");
        let all = self.snapshot(StorageStep::Fetch).await?;

        debug!(resource_id = %root_id, "Delete: computing subtree");
        let forest = ResourceForest::new(&all);
        let descendants = forest.descendants_of(root_id);
        self.check_hierarchy(&descendants)?;
        let mut doomed = descendants.nodes;
        if let Some(root) = forest.get(root_id) {
            doomed.push(root.clone());
        }

        let mut tx = self.repo.begin().await.map_err(|e| {
            error!(resource_id = %root_id, error = %e, "Failed to begin transaction");
            ResourceError::storage(StorageStep::Begin, e)
        })?;

        for (position, node) in doomed.iter().enumerate() {
            debug!(resource_id = %node.id, position, total = doomed.len(), "Delete: removing node");
            if let Err(err) = delete_one(&mut tx, node).await {
                error!(resource_id = %node.id, error = %err, "Delete aborted");
                return Err(rollback(tx, err).await);
            }
        }

        debug!(resource_id = %root_id, "Delete: committing");
        tx.commit().await.map_err(|e| {
            let step = e.failed_step().unwrap_or(StorageStep::Commit);
            error!(resource_id = %root_id, step = %step, error = %e, "Failed to commit delete");
            ResourceError::storage(step, e)
        })?;

        info!(resource_id = %root_id, removed = doomed.len(), "Resource subtree deleted");
        Ok(())
    }

    async fn snapshot(&self, step: StorageStep) -> ResourceResult<Vec<ResourceNode>> {
        self.repo.fetch_all().await.map_err(|e| fetch_failed(step, e))
    }

    fn descendants(&self, all: &[ResourceNode], root_id: &str) -> ResourceResult<Descendants> {
        let descendants = tree::descendants_of(all, root_id);
        self.check_hierarchy(&descendants)?;
        Ok(descendants)
    }

    fn check_hierarchy(&self, descendants: &Descendants) -> ResourceResult<()> {
        match descendants.malformed.first() {
            Some(id) if self.config.strict_hierarchy => {
                Err(ResourceError::MalformedHierarchy { id: id.clone() })
            }
            _ => Ok(()),
        }
    }
}

fn fetch_failed(step: StorageStep, source: StoreError) -> ResourceError {
    error!(error = %source, "Failed to read resources");
    ResourceError::storage(step, source)
}

async fn delete_one<T: ResourceTransaction>(tx: &mut T, node: &ResourceNode) -> ResourceResult<()> {
    if node.system_owned {
        return Err(ResourceError::SystemResourceProtected {
            id: node.id.clone(),
        });
    }
    tx.delete_role_relations(&node.id)
        .await
        .map_err(|e| ResourceError::storage(StorageStep::RoleRelation, e))?;
    tx.delete_theme_relations(&node.id)
        .await
        .map_err(|e| ResourceError::storage(StorageStep::ThemeRelation, e))?;
    tx.delete_node(&node.id)
        .await
        .map_err(|e| ResourceError::storage(StorageStep::NodeDelete, e))
}

/// Roll back `tx` and return the error to surface. A failed rollback wins
/// over `cause` since the store state is then unknown.
async fn rollback<T: ResourceTransaction>(tx: T, cause: ResourceError) -> ResourceError {
    match tx.rollback().await {
        Ok(()) => cause,
        Err(e) => {
            error!(error = %e, cause = %cause, "Rollback failed");
            ResourceError::storage(StorageStep::Rollback, e)
        }
    }
}
