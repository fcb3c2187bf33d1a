//! Service container for dependency injection
//!
//! Wires up services with their collaborators.

use std::sync::Arc;

use crate::application::services::{AdjacencyService, NestedSetService};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::cache::{MemoryCache, NullCache};
use crate::infrastructure::traits::{Cache, JsonDirFetcher, RowFetcher};

/// Container holding settings and shared collaborators.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Query layer
    pub fetcher: Arc<dyn RowFetcher>,

    /// Tree cache
    pub cache: Arc<dyn Cache>,
}

impl ServiceContainer {
    /// Create a container reading tables from `settings.data_dir`.
    ///
    /// With `adjacency.cache_active` off, a `NullCache` is used.
    pub fn new(settings: Settings) -> Self {
        let fetcher = Arc::new(JsonDirFetcher::new(&settings.data_dir));
        let cache: Arc<dyn Cache> = if settings.adjacency.cache_active {
            Arc::new(MemoryCache::new(settings.cache_capacity))
        } else {
            Arc::new(NullCache)
        };
        Self::with_deps(settings, fetcher, cache)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fetcher: Arc<dyn RowFetcher>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fetcher,
            cache,
        }
    }

    pub fn nested_set_service(&self, model: &str) -> ApplicationResult<NestedSetService> {
        NestedSetService::new(
            Arc::clone(&self.fetcher),
            model,
            self.settings.fields.clone(),
            self.settings.nested_set.clone(),
            self.settings.selection.clone(),
        )
    }

    pub fn adjacency_service(&self, model: &str) -> ApplicationResult<AdjacencyService> {
        AdjacencyService::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.cache),
            model,
            self.settings.fields.clone(),
            self.settings.adjacency.clone(),
            self.settings.selection.clone(),
        )
    }
}
