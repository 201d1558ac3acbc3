//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Enums are stored as strings
//! with ASSERT constraints. Relation rows reference resources by plain
//! `resource_id` strings and are cleaned up by the resource service, not by
//! the database.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "resource_tree",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "system_resources",
        sql: SEED_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1: resource tree and its dependent relation tables
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Resource nodes (menus, subsystems, buttons). Record key = resource id.
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD name ON TABLE resource TYPE string ASSERT $value != '';
DEFINE FIELD attr ON TABLE resource TYPE string \
    ASSERT $value IN ['Leaf', 'Container'];
DEFINE FIELD parent_id ON TABLE resource TYPE string;
DEFINE FIELD resource_type ON TABLE resource TYPE string \
    ASSERT $value IN ['0', '1', '2', '4'];
DEFINE FIELD system_owned ON TABLE resource TYPE bool DEFAULT false;
DEFINE FIELD inner_flag ON TABLE resource TYPE bool DEFAULT true;
DEFINE FIELD service_code ON TABLE resource TYPE option<string>;
DEFINE FIELD created_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resource_parent ON TABLE resource COLUMNS parent_id;

-- =======================================================================
-- Role -> resource assignments
-- =======================================================================
DEFINE TABLE role_resource SCHEMAFULL;
DEFINE FIELD role_id ON TABLE role_resource TYPE string;
DEFINE FIELD resource_id ON TABLE role_resource TYPE string;
DEFINE FIELD created_at ON TABLE role_resource TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_resource ON TABLE role_resource \
    COLUMNS role_id, resource_id UNIQUE;
DEFINE INDEX idx_role_resource_resource ON TABLE role_resource \
    COLUMNS resource_id;

-- =======================================================================
-- Theme -> resource bindings (per-theme presentation of a node)
-- =======================================================================
DEFINE TABLE theme_resource SCHEMAFULL;
DEFINE FIELD theme_id ON TABLE theme_resource TYPE string;
DEFINE FIELD resource_id ON TABLE theme_resource TYPE string;
DEFINE FIELD route ON TABLE theme_resource TYPE option<string>;
DEFINE FIELD open_type ON TABLE theme_resource TYPE option<string>;
DEFINE FIELD style_class ON TABLE theme_resource TYPE option<string>;
DEFINE FIELD icon ON TABLE theme_resource TYPE option<string>;
DEFINE FIELD group_id ON TABLE theme_resource TYPE option<int>;
DEFINE FIELD sort_id ON TABLE theme_resource TYPE int DEFAULT 0;
DEFINE INDEX idx_theme_resource ON TABLE theme_resource \
    COLUMNS theme_id, resource_id UNIQUE;
DEFINE INDEX idx_theme_resource_resource ON TABLE theme_resource \
    COLUMNS resource_id;
";

// -----------------------------------------------------------------------
// v2: system-owned administration menus
// -----------------------------------------------------------------------

/// Ids of the nodes seeded by [`SEED_V2`]. They are system owned and can
/// never be deleted through the resource service.
pub const SYSTEM_RESOURCE_IDS: &[&str] = &["sysadmin", "resourcemgr", "rolemgr"];

const SEED_V2: &str = "\
CREATE type::record('resource', 'sysadmin') SET \
    name = 'System Administration', attr = 'Container', parent_id = '-1', \
    resource_type = '0', system_owned = true, inner_flag = true;
CREATE type::record('resource', 'resourcemgr') SET \
    name = 'Resource Management', attr = 'Leaf', parent_id = 'sysadmin', \
    resource_type = '1', system_owned = true, inner_flag = true;
CREATE type::record('resource', 'rolemgr') SET \
    name = 'Role Management', attr = 'Leaf', parent_id = 'sysadmin', \
    resource_type = '1', system_owned = true, inner_flag = true;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies, in
/// order, each migration newer than the highest recorded version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        debug!(version = current, "Schema is up to date");
        return Ok(());
    }

    for migration in pending {
        apply(db, migration).await?;
    }
    Ok(())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(version = migration.version, name = migration.name, "Applying migration");

    let failed = |e: surrealdb::Error| {
        DbError::Migration(format!(
            "v{} '{}': {e}",
            migration.version, migration.name
        ))
    };

    db.query(migration.sql).await?.check().map_err(failed)?;
    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(failed)?;

    info!(version = migration.version, "Migration applied");
    Ok(())
}
