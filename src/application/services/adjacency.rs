//! Adjacency-list tree service
//!
//! Builds the flat node list for a model, serving it from the cache when
//! possible, and marks the request's selection on the result.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::application::resolvable::Resolvable;
use crate::application::services::ensure_table;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::{validate_fields, AdjacencyConfig, RowFilter, SelectionConfig};
use crate::domain::{annotate_flat, AdjacencyGrouper, AdjacencyRow, FieldMap, FlatTree, Selection};
use crate::infrastructure::traits::{Cache, RequestContext, RowFetcher, RowQuery};

/// Tag shared by every cached tree of a model.
pub fn common_tag(model: &str) -> String {
    format!("CommonTag:{model}")
}

/// Service rendering one adjacency-list model as a flat node list.
pub struct AdjacencyService {
    fetcher: Arc<dyn RowFetcher>,
    cache: Arc<dyn Cache>,
    model: String,
    fields: FieldMap,
    config: AdjacencyConfig,
    selection: SelectionConfig,
    cache_key: Resolvable<String>,
    filter: Resolvable<RowFilter>,
    grouper: AdjacencyGrouper,
}

impl AdjacencyService {
    /// Create the service; the model's table must exist.
    pub fn new(
        fetcher: Arc<dyn RowFetcher>,
        cache: Arc<dyn Cache>,
        model: impl Into<String>,
        fields: FieldMap,
        config: AdjacencyConfig,
        selection: SelectionConfig,
    ) -> ApplicationResult<Self> {
        let model = model.into();
        validate_fields(&fields)?;
        if config.sort_order.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "adjacency.sort_order must not be empty".into(),
            });
        }
        ensure_table(fetcher.as_ref(), &model, &[])?;

        Ok(Self {
            fetcher,
            cache,
            model,
            fields,
            cache_key: Resolvable::Static(config.cache_key.clone()),
            filter: Resolvable::Static(config.filter.clone()),
            config,
            selection,
            grouper: AdjacencyGrouper::new(),
        })
    }

    /// Replace the configured cache key prefix, e.g. with a per-tenant closure.
    pub fn with_cache_key(mut self, cache_key: Resolvable<String>) -> Self {
        self.cache_key = cache_key;
        self
    }

    /// Replace the configured filter, e.g. with a closure evaluated per request.
    pub fn with_filter(mut self, filter: Resolvable<RowFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full cache key: prefix, model and sort column.
    pub fn cache_key(&self) -> String {
        format!(
            "AdjacencyFullTreeData:{}:{}:{}",
            self.cache_key.resolve(),
            self.model,
            self.config.sort_order
        )
    }

    fn ttl(&self) -> Option<Duration> {
        match self.config.cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Fetch and group the rows, bypassing the cache.
    pub fn build(&self) -> ApplicationResult<FlatTree> {
        let query = RowQuery::new(&self.model)
            .filter(self.filter.resolve())
            .order_by(&self.config.sort_order);
        let records = self
            .fetcher
            .fetch(&query)
            .with_model_context("fetch adjacency rows", &self.model)?;
        let rows: Vec<AdjacencyRow> = records
            .iter()
            .map(|record| AdjacencyRow::from_record(record, &self.fields))
            .collect();
        Ok(self.grouper.group(&rows))
    }

    fn cached(&self, key: &str) -> Option<FlatTree> {
        let payload = self.cache.get(key)?;
        match serde_json::from_str(&payload) {
            Ok(tree) => Some(tree),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn store(&self, key: &str, tree: &FlatTree) {
        let payload = match serde_json::to_string(tree) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "cannot serialize tree for caching");
                return;
            }
        };
        let tags = [common_tag(&self.model)];
        if let Err(e) = self.cache.set(key, payload, self.ttl(), &tags) {
            warn!(key, error = %e, "cache write failed");
        }
    }

    /// Tree for the current data, from the cache or freshly built.
    pub fn tree(&self) -> ApplicationResult<FlatTree> {
        let key = self.cache_key();
        if let Some(tree) = self.cached(&key) {
            debug!(key = %key, "cache hit");
            return Ok(tree);
        }
        debug!(key = %key, "cache miss");
        let tree = self.build()?;
        if self.config.cache_active {
            self.store(&key, &tree);
        }
        Ok(tree)
    }

    /// Drop every cached tree of this model, e.g. after the table changed.
    pub fn invalidate(&self) {
        let tag = common_tag(&self.model);
        if let Err(e) = self.cache.invalidate_tag(&tag) {
            warn!(tag = %tag, error = %e, "cache invalidation failed");
        }
    }

    /// Selection of one request: primary id from the selected-id parameter,
    /// falling back to the parent parameter.
    pub fn selection(&self, request: &dyn RequestContext) -> Selection {
        let primary = request
            .query_param(&self.config.selected_id_param)
            .or_else(|| request.query_param(&self.config.parent_param));
        let selected = request.query_param(&self.selection.selected_param);
        Selection::parse(primary.as_deref(), selected.as_deref())
    }

    /// Build the annotated flat tree for one request.
    #[instrument(level = "debug", skip(self, request), fields(model = %self.model))]
    pub fn run(&self, request: &dyn RequestContext) -> ApplicationResult<FlatTree> {
        let mut tree = self.tree()?;
        annotate_flat(&mut tree, &self.selection(request));
        Ok(tree)
    }
}
