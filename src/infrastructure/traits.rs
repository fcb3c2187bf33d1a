//! I/O boundary traits for testability
//!
//! These traits abstract the query layer, the cache and the request, allowing
//! services to be tested with in-memory implementations.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::RowFilter;
use crate::domain::{lookup, Record};

/// What to fetch: one model's rows, filtered and ordered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowQuery {
    pub model: String,
    /// Equality conditions, all of which must hold
    pub filter: RowFilter,
    /// Ascending sort columns, most significant first
    pub order_by: Vec<String>,
}

impl RowQuery {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: RowFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(column.into());
        self
    }
}

/// Query layer abstraction.
pub trait RowFetcher: Send + Sync {
    /// Column names of a model's table, `None` when they cannot be determined.
    /// Fails with `NotFound` when the table does not exist.
    fn columns(&self, model: &str) -> io::Result<Option<BTreeSet<String>>>;

    /// Fetch the rows matching `query`, in query order.
    fn fetch(&self, query: &RowQuery) -> io::Result<Vec<Record>>;
}

/// Tag-addressable key/value cache abstraction.
///
/// `get` never fails: an unavailable cache simply misses.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value; `ttl` of `None` keeps it until invalidated or evicted.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>, tags: &[String])
        -> io::Result<()>;

    /// Drop every entry stored with `tag`.
    fn invalidate_tag(&self, tag: &str) -> io::Result<()>;
}

/// Request abstraction: access to query parameters.
pub trait RequestContext: Send + Sync {
    fn query_param(&self, name: &str) -> Option<String>;
}

// ============================================================
// QUERY EVALUATION
// ============================================================

/// Filter and stable-sort records the way the query layer would.
pub fn apply_query(records: Vec<Record>, query: &RowQuery) -> Vec<Record> {
    let mut rows: Vec<Record> = records
        .into_iter()
        .filter(|record| matches_filter(record, &query.filter))
        .collect();
    rows.sort_by(|a, b| {
        query
            .order_by
            .iter()
            .map(|column| compare_values(lookup(a, column), lookup(b, column)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

fn matches_filter(record: &Record, filter: &RowFilter) -> bool {
    filter.iter().all(|(column, expected)| {
        lookup(record, column).is_some_and(|actual| loose_eq(actual, expected))
    })
}

/// Equality that treats `1` and `"1"` alike, as database drivers do.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (s.trim().parse::<f64>(), n.as_f64()) {
                (Ok(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Bool(flag), Value::Number(n)) | (Value::Number(n), Value::Bool(flag)) => {
            n.as_f64() == Some(f64::from(u8::from(*flag)))
        }
        _ => a == b,
    }
}

/// Sort key giving mixed-type columns a total order.
#[derive(Debug, Clone, Copy)]
enum SortKey<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(&'a str),
    Nested(u8),
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Text(_) => 3,
            SortKey::Nested(_) => 4,
        }
    }
}

fn sort_key(value: Option<&Value>) -> SortKey<'_> {
    match value {
        None | Some(Value::Null) => SortKey::Null,
        Some(Value::Bool(b)) => SortKey::Bool(*b),
        Some(Value::Number(n)) => SortKey::Number(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => SortKey::Number(x),
            _ => SortKey::Text(s),
        },
        Some(Value::Array(_)) => SortKey::Nested(0),
        Some(Value::Object(_)) => SortKey::Nested(1),
    }
}

/// Ascending order: missing/null first, numbers (and numeric strings)
/// numerically, other strings lexicographically.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(&y),
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(&y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        (SortKey::Nested(x), SortKey::Nested(y)) => x.cmp(&y),
        (x, y) => x.rank().cmp(&y.rank()),
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Tables stored as `<dir>/<model>.json`, each a JSON array of objects.
#[derive(Debug, Clone)]
pub struct JsonDirFetcher {
    dir: PathBuf,
}

impl JsonDirFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(&self, model: &str) -> PathBuf {
        self.dir.join(format!("{model}.json"))
    }

    fn read_table(&self, model: &str) -> io::Result<Vec<Record>> {
        let path = self.table_path(model);
        let content = std::fs::read_to_string(&path)?;
        parse_table(&content, &path)
    }
}

fn parse_table(content: &str, path: &Path) -> io::Result<Vec<Record>> {
    let records: Vec<Record> = serde_json::from_str(content).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: expected a JSON array of objects: {e}", path.display()),
        )
    })?;
    trace!(path = %path.display(), records = records.len(), "parsed table");
    Ok(records)
}

fn columns_of(records: &[Record]) -> Option<BTreeSet<String>> {
    if records.is_empty() {
        return None;
    }
    Some(records.iter().flat_map(|r| r.keys().cloned()).collect())
}

impl RowFetcher for JsonDirFetcher {
    fn columns(&self, model: &str) -> io::Result<Option<BTreeSet<String>>> {
        Ok(columns_of(&self.read_table(model)?))
    }

    fn fetch(&self, query: &RowQuery) -> io::Result<Vec<Record>> {
        let records = self.read_table(&query.model)?;
        let rows = apply_query(records, query);
        debug!(model = %query.model, rows = rows.len(), "fetched rows");
        Ok(rows)
    }
}

/// Tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowFetcher {
    tables: HashMap<String, Vec<Record>>,
}

impl MemoryRowFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; `rows` must be a JSON array of objects.
    pub fn with_table(mut self, model: impl Into<String>, rows: Value) -> io::Result<Self> {
        let records: Vec<Record> = serde_json::from_value(rows)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.tables.insert(model.into(), records);
        Ok(self)
    }

    fn table(&self, model: &str) -> io::Result<&Vec<Record>> {
        self.tables.get(model).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no table for model {model}"))
        })
    }
}

impl RowFetcher for MemoryRowFetcher {
    fn columns(&self, model: &str) -> io::Result<Option<BTreeSet<String>>> {
        Ok(columns_of(self.table(model)?))
    }

    fn fetch(&self, query: &RowQuery) -> io::Result<Vec<Record>> {
        Ok(apply_query(self.table(&query.model)?.clone(), query))
    }
}

/// Query parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=x%2Cy`; later duplicates win, `+` decodes to a space.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(name), decode(value))
            })
            .collect();
        Self { params }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

impl RequestContext for QueryParams {
    fn query_param(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }
}
