//! cms-persistence: open the content type store and report what it holds.
//!
//! Usage: `cms-persistence [config.json]`

use anyhow::{Context, Result};
use cms_persistence::application::cache::CacheKeys;
use cms_persistence::application::repositories::{ContentTypeRepository, EntityContainerRepository};
use cms_persistence::config::PersistenceConfig;
use cms_persistence::domain::{ComposableType, DocumentType, MediaType, MemberType};
use cms_persistence::infrastructure::persistence::{
    ContentTypeCompositionRepository, SqliteNodeStore,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::args().nth(1) {
        Some(path) => PersistenceConfig::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => PersistenceConfig::default(),
    };

    let store = match &config.database_path {
        Some(path) => {
            tracing::info!("Opening database {}", path.display());
            SqliteNodeStore::new_with_path(path)
                .with_context(|| format!("Failed to open database {}", path.display()))?
        }
        None => {
            tracing::info!("No database path configured, using an in-memory database");
            SqliteNodeStore::new_in_memory().context("Failed to open in-memory database")?
        }
    };
    let store = Arc::new(store);
    let keys = Arc::new(CacheKeys::new());
    let policies = &config.cache;

    let documents: ContentTypeCompositionRepository<DocumentType, _> =
        ContentTypeCompositionRepository::with_policies(
            Arc::clone(&store),
            Arc::clone(&keys),
            policies.document_types,
            policies.containers,
        )?;
    let media: ContentTypeCompositionRepository<MediaType, _> =
        ContentTypeCompositionRepository::with_policies(
            Arc::clone(&store),
            Arc::clone(&keys),
            policies.media_types,
            policies.containers,
        )?;
    let members: ContentTypeCompositionRepository<MemberType, _> =
        ContentTypeCompositionRepository::with_policies(
            store,
            keys,
            policies.member_types,
            policies.containers,
        )?;

    report(&documents)?;
    report(&media)?;
    report(&members)?;

    Ok(())
}

fn report<T: ComposableType>(
    repository: &ContentTypeCompositionRepository<T, SqliteNodeStore>,
) -> Result<()> {
    let types = repository.get_all()?;
    tracing::info!("{}: {} types", T::OBJECT_TYPE, types.len());
    for item in &types {
        let path = repository.path_of(item.parent_id())?;
        tracing::info!("  {} ({}) at {}", item.name(), item.alias(), path);
    }

    if let Some(containers) = repository.containers() {
        let all = containers.get_all()?;
        tracing::info!("{}: {} containers", T::OBJECT_TYPE, all.len());
    }
    Ok(())
}
