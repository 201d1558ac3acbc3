//! Error types for the resource tree.
//!
//! Every [`ResourceError`] carries a machine-readable result tag (see
//! [`ResourceError::tag`]) so transport layers can branch on it and look up a
//! localized message without parsing display strings.

use std::fmt;

use thiserror::Error;

/// Result tag reported for every successful operation.
pub const SUCCESS_TAG: &str = "success";

/// Failure raised by a [`ResourceRepository`](crate::repository::ResourceRepository)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A statement of a committed batch failed. `step` names the statement
    /// that caused the batch to be rejected.
    #[error("{step} statement rejected: {message}")]
    Statement { step: StorageStep, message: String },
}

impl StoreError {
    /// The step a batched statement failure belongs to, if known.
    pub fn failed_step(&self) -> Option<StorageStep> {
        match self {
            Self::Statement { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The storage step a [`ResourceError::Storage`] failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageStep {
    Fetch,
    Descendants,
    Begin,
    RoleRelation,
    ThemeRelation,
    NodeDelete,
    Update,
    Insert,
    Commit,
    Rollback,
}

impl StorageStep {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Fetch => "error_resource_query",
            Self::Descendants => "error_resource_children",
            Self::Begin => "error_resource_begin",
            Self::RoleRelation => "error_resource_role_relation",
            Self::ThemeRelation => "error_resource_theme_relation",
            Self::NodeDelete => "error_resource_delete",
            Self::Update => "error_resource_update",
            Self::Insert => "error_resource_add",
            Self::Commit => "error_resource_commit",
            Self::Rollback => "error_resource_rollback",
        }
    }
}

impl fmt::Display for StorageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fetch => "fetch",
            Self::Descendants => "descendant computation",
            Self::Begin => "begin transaction",
            Self::RoleRelation => "role relation cleanup",
            Self::ThemeRelation => "theme relation cleanup",
            Self::NodeDelete => "node delete",
            Self::Update => "update",
            Self::Insert => "insert",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("resource id must be 1-30 letters or digits, got {id:?}")]
    InvalidIdentifier { id: String },

    #[error("required field is empty: {field}")]
    MissingField { field: &'static str },

    #[error("unknown resource type code: {code:?}")]
    UnknownType { code: String },

    #[error("resource {id} cannot be its own parent")]
    SelfParent { id: String },

    #[error("moving resource {id} under its descendant {parent_id} would create a cycle")]
    Cycle { id: String, parent_id: String },

    #[error("resource {id} is system owned and cannot be deleted")]
    SystemResourceProtected { id: String },

    #[error("storage failure during {step}: {source}")]
    Storage {
        step: StorageStep,
        #[source]
        source: StoreError,
    },

    #[error("malformed hierarchy at resource {id}")]
    MalformedHierarchy { id: String },
}

impl ResourceError {
    pub fn storage(step: StorageStep, source: StoreError) -> Self {
        Self::Storage { step, source }
    }

    /// Machine-readable result tag for this failure.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "error_resource_res_id",
            Self::MissingField { field } => match *field {
                "name" => "error_resource_desc_empty",
                "type" => "error_resource_type",
                "parent_id" => "error_resource_up_id",
                _ => "error_resource_field",
            },
            Self::UnknownType { .. } => "error_resource_type",
            Self::SelfParent { .. } => "error_resource_update_same",
            Self::Cycle { .. } => "error_resource_update_cycle",
            Self::SystemResourceProtected { .. } => "error_resource_forbid_system_resource",
            Self::Storage { step, .. } => step.tag(),
            Self::MalformedHierarchy { .. } => "error_resource_hierarchy",
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Result tag for any operation outcome: [`SUCCESS_TAG`] or the error's tag.
pub fn result_tag<T>(result: &ResourceResult<T>) -> &'static str {
    match result {
        Ok(_) => SUCCESS_TAG,
        Err(err) => err.tag(),
    }
}
