//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (RowFetcher, Cache, RequestContext)
//! but are themselves concrete structs, not traits.

mod adjacency;
mod nested_set;

pub use adjacency::{common_tag, AdjacencyService};
pub use nested_set::NestedSetService;

use std::io;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::infrastructure::traits::RowFetcher;

/// Fail at setup time when the model's table or a required column is missing.
///
/// Dotted columns only need their first segment; tables whose columns cannot
/// be determined (e.g. empty ones) pass.
pub(crate) fn ensure_table(
    fetcher: &dyn RowFetcher,
    model: &str,
    required: &[&String],
) -> ApplicationResult<()> {
    if model.trim().is_empty() {
        return Err(ApplicationError::Config {
            message: "model must not be empty".into(),
        });
    }
    let columns = match fetcher.columns(model) {
        Ok(columns) => columns,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ApplicationError::Config {
                message: format!("table for model '{model}' not found"),
            })
        }
        Err(e) => return Err(e).with_model_context("read columns", model),
    };
    let Some(columns) = columns else {
        return Ok(());
    };

    let missing: Vec<&str> = required
        .iter()
        .map(|column| column.as_str())
        .filter(|column| {
            let column: &str = column;
            let head = column.split('.').next().unwrap_or(column);
            !columns.contains(column) && !columns.contains(head)
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApplicationError::Config {
            message: format!(
                "column(s) '{}' not found in the '{model}' table",
                missing.join("', '")
            ),
        })
    }
}
