//! SurrealDB implementation of [`ResourceRepository`].

use std::collections::HashMap;

use arbor_core::error::{StorageStep, StoreError, StoreResult};
use arbor_core::models::resource::{
    NodeAttr, ResourceNode, ResourceNodeSummary, ResourceType, UpdateResourceNode,
};
use arbor_core::repository::{ResourceRepository, ResourceTransaction};
use surrealdb::{Connection, Surreal};
use surrealdb_types::{QueryError, SurrealValue, Value};
use tracing::debug;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ResourceRowWithId {
    record_id: String,
    name: String,
    attr: String,
    parent_id: String,
    resource_type: String,
    system_owned: bool,
    inner_flag: bool,
    service_code: Option<String>,
}

impl ResourceRowWithId {
    fn try_into_node(self) -> Result<ResourceNode, DbError> {
        let attr = NodeAttr::parse(&self.attr).ok_or_else(|| {
            DbError::Decode(format!("resource {}: invalid attr {:?}", self.record_id, self.attr))
        })?;
        let resource_type = ResourceType::from_code(&self.resource_type).ok_or_else(|| {
            DbError::Decode(format!(
                "resource {}: invalid type {:?}",
                self.record_id, self.resource_type
            ))
        })?;
        Ok(ResourceNode {
            id: self.record_id,
            name: self.name,
            attr,
            parent_id: self.parent_id,
            resource_type,
            system_owned: self.system_owned,
            inner_flag: self.inner_flag,
            service_code: self.service_code,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SummaryRow {
    record_id: String,
    name: String,
    parent_id: String,
}

fn not_found(id: &str) -> DbError {
    DbError::NotFound {
        entity: "resource".into(),
        id: id.into(),
    }
}

fn rows_into_nodes(rows: Vec<ResourceRowWithId>) -> StoreResult<Vec<ResourceNode>> {
    rows.into_iter()
        .map(|row| row.try_into_node())
        .collect::<Result<Vec<_>, DbError>>()
        .map_err(Into::into)
}

/// SurrealDB implementation of the resource repository.
#[derive(Clone)]
pub struct SurrealResourceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository for SurrealResourceRepository<C> {
    type Transaction = SurrealResourceTransaction<C>;

    async fn fetch_all(&self) -> StoreResult<Vec<ResourceNode>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM resource ORDER BY record_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_into_nodes(rows)
    }

    async fn fetch_one(&self, id: &str) -> StoreResult<Vec<ResourceNode>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('resource', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_into_nodes(rows)
    }

    async fn fetch_summaries(&self) -> StoreResult<Vec<ResourceNodeSummary>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, name, parent_id FROM resource \
                 ORDER BY record_id ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SummaryRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| ResourceNodeSummary {
                id: row.record_id,
                name: row.name,
                parent_id: row.parent_id,
            })
            .collect())
    }

    async fn fetch_inner_flag(&self, id: &str) -> StoreResult<bool> {
        let mut result = self
            .db
            .query("SELECT VALUE inner_flag FROM type::record('resource', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let flags: Vec<bool> = result.take(0).map_err(DbError::from)?;
        flags
            .into_iter()
            .next()
            .ok_or_else(|| not_found(id).into())
    }

    async fn fetch_service_code(&self, id: &str) -> StoreResult<String> {
        let mut result = self
            .db
            .query("SELECT VALUE service_code FROM type::record('resource', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let codes: Vec<Option<String>> = result.take(0).map_err(DbError::from)?;
        codes
            .into_iter()
            .next()
            .map(Option::unwrap_or_default)
            .ok_or_else(|| not_found(id).into())
    }

    async fn insert(&self, node: &ResourceNode) -> StoreResult<()> {
        let result = self
            .db
            .query(
                "CREATE type::record('resource', $id) SET \
                 name = $name, attr = $attr, parent_id = $parent_id, \
                 resource_type = $resource_type, system_owned = $system_owned, \
                 inner_flag = $inner_flag, service_code = $service_code",
            )
            .bind(("id", node.id.clone()))
            .bind(("name", node.name.clone()))
            .bind(("attr", node.attr.as_str()))
            .bind(("parent_id", node.parent_id.clone()))
            .bind(("resource_type", node.resource_type.code()))
            .bind(("system_owned", node.system_owned))
            .bind(("inner_flag", node.inner_flag))
            .bind(("service_code", node.service_code.clone()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, input: &UpdateResourceNode) -> StoreResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('resource', $id) SET \
                 name = $name, parent_id = $parent_id, \
                 service_code = $service_code, inner_flag = $inner_flag, \
                 updated_at = time::now()",
            )
            .bind(("id", input.id.clone()))
            .bind(("name", input.name.clone()))
            .bind(("parent_id", input.parent_id.clone()))
            .bind(("service_code", input.service_code.clone()))
            .bind(("inner_flag", input.inner_flag()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let updated: Vec<Value> = result.take(0).map_err(DbError::from)?;
        if updated.is_empty() {
            return Err(not_found(&input.id).into());
        }
        Ok(())
    }

    async fn begin(&self) -> StoreResult<SurrealResourceTransaction<C>> {
        Ok(SurrealResourceTransaction {
            db: self.db.clone(),
            statements: Vec::new(),
        })
    }
}

/// Buffers delete statements and submits them as one
/// `BEGIN TRANSACTION … COMMIT TRANSACTION` request.
///
/// Nothing reaches the database before [`commit`](ResourceTransaction::commit),
/// and any failing statement cancels the whole batch server-side.
pub struct SurrealResourceTransaction<C: Connection> {
    db: Surreal<C>,
    /// Statement `n` binds its id as `$id{n}`.
    statements: Vec<QueuedStatement>,
}

struct QueuedStatement {
    sql: String,
    id: String,
    step: StorageStep,
}

impl<C: Connection> SurrealResourceTransaction<C> {
    fn push(&mut self, step: StorageStep, template: &str, id: &str) {
        let param = format!("$id{}", self.statements.len());
        self.statements.push(QueuedStatement {
            sql: template.replace("$id", &param),
            id: id.to_string(),
            step,
        });
    }
}

impl<C: Connection> ResourceTransaction for SurrealResourceTransaction<C> {
    async fn delete_role_relations(&mut self, id: &str) -> StoreResult<()> {
        self.push(
            StorageStep::RoleRelation,
            "DELETE role_resource WHERE resource_id = $id",
            id,
        );
        Ok(())
    }

    async fn delete_theme_relations(&mut self, id: &str) -> StoreResult<()> {
        self.push(
            StorageStep::ThemeRelation,
            "DELETE theme_resource WHERE resource_id = $id",
            id,
        );
        Ok(())
    }

    async fn delete_node(&mut self, id: &str) -> StoreResult<()> {
        self.push(
            StorageStep::NodeDelete,
            "DELETE type::record('resource', $id)",
            id,
        );
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        if self.statements.is_empty() {
            return Ok(());
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for statement in &self.statements {
            sql.push_str(&statement.sql);
            sql.push_str(";\n");
        }
        sql.push_str("COMMIT TRANSACTION;");
        debug!(statements = self.statements.len(), "Committing resource transaction");

        let mut query = self.db.query(sql);
        for (idx, statement) in self.statements.iter().enumerate() {
            query = query.bind((format!("id{idx}"), statement.id.clone()));
        }

        let mut response = query.await.map_err(DbError::from)?;
        let errors = response.take_errors();
        if errors.is_empty() {
            return Ok(());
        }
        let steps: Vec<StorageStep> = self.statements.iter().map(|s| s.step).collect();
        Err(batch_failure(&steps, errors).into())
    }

    async fn rollback(self) -> StoreResult<()> {
        debug!(
            discarded = self.statements.len(),
            "Discarding resource transaction"
        );
        Ok(())
    }
}

/// Picks the statement that broke a batch out of its per-result errors.
///
/// Result 0 belongs to `BEGIN`, so statement `n` reports at index `n + 1`.
/// Every statement other than the culprit carries a "not executed"
/// placeholder. A culprit outside the queued statements is the `COMMIT`
/// itself and is reported without a step.
fn batch_failure(steps: &[StorageStep], errors: HashMap<usize, surrealdb::Error>) -> DbError {
    let mut errors: Vec<_> = errors.into_iter().collect();
    errors.sort_by_key(|(idx, _)| *idx);

    let culprit = errors
        .iter()
        .position(|(_, e)| !matches!(e.query_details(), Some(QueryError::NotExecuted)))
        .unwrap_or(0);
    let (idx, err) = errors.swap_remove(culprit);

    match idx.checked_sub(1).and_then(|n| steps.get(n)) {
        Some(&step) => DbError::Statement {
            step,
            message: err.to_string(),
        },
        None => DbError::Query(err.to_string()),
    }
}
