//! Arbor Server: Application entry point.
//!
//! Connects to SurrealDB, applies pending migrations and reports the shape of
//! the stored resource tree. Transport layers embed [`ResourceService`]
//! directly.

use arbor_core::models::resource::ROOT_PARENT_ID;
use arbor_core::{ResourceService, ResourceServiceConfig};
use arbor_db::repository::SurrealResourceRepository;
use arbor_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("arbor=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting Arbor server...");

    let config = DbConfig::from_env();
    let manager = DbManager::connect(&config).await?;
    arbor_db::run_migrations(manager.client()).await?;

    let service = ResourceService::new(
        SurrealResourceRepository::new(manager.client().clone()),
        ResourceServiceConfig {
            strict_hierarchy: std::env::var("ARBOR_STRICT_HIERARCHY").is_ok_and(|v| v == "true"),
        },
    );

    let tree = service.get_children(ROOT_PARENT_ID).await?;
    let top_level = tree.iter().filter(|n| n.is_top_level()).count();
    tracing::info!(
        nodes = tree.len(),
        top_level,
        system_owned = tree.iter().filter(|n| n.system_owned).count(),
        "Resource tree loaded"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Arbor server stopped.");
    Ok(())
}
