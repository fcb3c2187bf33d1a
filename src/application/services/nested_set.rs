//! Nested-set tree service
//!
//! Fetches a nested-set table ordered by (root, left), rebuilds the forest and
//! marks the selected nodes of the request.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::services::ensure_table;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::{validate_fields, NestedSetConfig, SelectionConfig};
use crate::domain::{
    annotate_forest, validate_bounds, FieldMap, Forest, NestedSetReconstructor, Row, Selection,
};
use crate::infrastructure::traits::{RequestContext, RowFetcher, RowQuery};

/// Service rendering one nested-set model as a forest.
pub struct NestedSetService {
    fetcher: Arc<dyn RowFetcher>,
    model: String,
    fields: FieldMap,
    config: NestedSetConfig,
    selection: SelectionConfig,
    reconstructor: NestedSetReconstructor,
}

impl NestedSetService {
    /// Create the service, checking the model's table and columns up front.
    ///
    /// # Errors
    /// `ApplicationError::Config` when the table is missing or lacks the id,
    /// bound, label or (if configured) root columns.
    pub fn new(
        fetcher: Arc<dyn RowFetcher>,
        model: impl Into<String>,
        fields: FieldMap,
        config: NestedSetConfig,
        selection: SelectionConfig,
    ) -> ApplicationResult<Self> {
        let model = model.into();
        validate_fields(&fields)?;

        let mut required = vec![&fields.id, &fields.left, &fields.right, &fields.label];
        required.extend(fields.root.as_ref());
        ensure_table(fetcher.as_ref(), &model, &required)?;

        Ok(Self {
            fetcher,
            model,
            reconstructor: NestedSetReconstructor::new(config.gap_policy),
            fields,
            config,
            selection,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn query(&self) -> RowQuery {
        let mut query = RowQuery::new(&self.model);
        if let Some(root) = &self.fields.root {
            query = query.order_by(root);
        }
        query.order_by(&self.fields.left)
    }

    /// Fetch and convert the rows, in (root, left) order.
    pub fn rows(&self) -> ApplicationResult<Vec<Row>> {
        let records = self
            .fetcher
            .fetch(&self.query())
            .with_model_context("fetch nested-set rows", &self.model)?;
        Ok(records
            .iter()
            .map(|record| Row::from_record(record, &self.fields))
            .collect())
    }

    /// Check the stored bounds without building anything.
    pub fn validate(&self) -> ApplicationResult<usize> {
        let rows = self.rows()?;
        validate_bounds(&rows)?;
        Ok(rows.len())
    }

    /// Build the annotated forest for one request.
    #[instrument(level = "debug", skip(self, request), fields(model = %self.model))]
    pub fn run(&self, request: &dyn RequestContext) -> ApplicationResult<Forest> {
        let rows = self.rows()?;
        if self.config.strict_bounds {
            validate_bounds(&rows).map_err(ApplicationError::from)?;
        }

        let mut forest = self.reconstructor.reconstruct(&rows);
        if forest.node_count() < rows.len() {
            debug!(
                dropped = rows.len() - forest.node_count(),
                "rows left out of the forest"
            );
        }

        let selected = request.query_param(&self.selection.selected_param);
        let selection = Selection::parse(None, selected.as_deref());
        annotate_forest(&mut forest, &selection);
        Ok(forest)
    }
}
