//! Service container for dependency injection
//!
//! Wires up the store and services from settings.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::ForestService;
use crate::config::{Settings, StoreBackend};
use crate::infrastructure::traits::NodeStore;
use crate::infrastructure::{InfraError, InfraResult, JsonFileNodeStore, MemoryNodeStore};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub forest: ForestService,
}

impl ServiceContainer {
    /// Create a service container with the store named by the settings.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let store: Arc<dyn NodeStore> = match settings.store.backend {
            StoreBackend::Memory => Arc::new(MemoryNodeStore::new()),
            StoreBackend::Json => {
                let path = &settings.store.path;
                let store = JsonFileNodeStore::open(path)
                    .map_err(|e| InfraError::io(format!("open store {}", path.display()), e))?;
                Arc::new(store)
            }
        };
        debug!("store backend: {}", settings.store.backend);
        Ok(Self::with_store(settings, store))
    }

    /// Create a service container with a custom store (for testing).
    pub fn with_store(settings: Settings, store: Arc<dyn NodeStore>) -> Self {
        Self {
            settings: Arc::new(settings),
            forest: ForestService::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Node;
    use tempfile::TempDir;

    #[test]
    fn given_memory_backend_when_building_then_forest_is_usable() {
        let mut settings = Settings::default();
        settings.store.backend = StoreBackend::Memory;

        let container = ServiceContainer::new(settings).unwrap();

        assert_eq!(container.settings.store.backend, StoreBackend::Memory);
        container.forest.create_node("root", None).unwrap();
        assert_eq!(container.forest.list().unwrap().len(), 1);
    }

    #[test]
    fn given_json_backend_when_creating_then_store_file_written() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.store.backend = StoreBackend::Json;
        settings.store.path = dir.path().join("forest.json");

        let container = ServiceContainer::new(settings).unwrap();
        container.forest.create_node("root", None).unwrap();

        assert!(container.settings.store.path.exists());
    }

    #[test]
    fn given_custom_store_when_building_then_service_reads_it() {
        let node = Node::new("seed").unwrap();
        let store = Arc::new(MemoryNodeStore::with_nodes([node.clone()]));

        let container = ServiceContainer::with_store(Settings::default(), store);

        assert_eq!(container.forest.get(node.id).unwrap(), node);
    }
}
