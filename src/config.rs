//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rstree/rstree.toml`
//! 3. Local config: `./.rstree.toml`, or the file given with `--config`
//! 4. Environment variables: `RSTREE_*` prefix, `__` between nested keys

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::ApplicationError;
use crate::domain::{FieldMap, GapPolicy};

/// Name of the local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".rstree.toml";

/// Equality conditions applied before fetching (`column = value`).
pub type RowFilter = BTreeMap<String, Value>;

/// Adjacency-list pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdjacencyConfig {
    /// Column the rows are ordered by
    pub sort_order: String,
    /// Cache key prefix; must differ between trees with different filters
    pub cache_key: String,
    /// Store freshly built trees in the cache
    pub cache_active: bool,
    /// Lifetime of a cached tree in seconds (0 = no expiry)
    pub cache_ttl_secs: u64,
    /// Query parameter carrying the id to select and open
    pub selected_id_param: String,
    /// Fallback query parameter for the id to select and open
    pub parent_param: String,
    /// Additional conditions, e.g. hide soft-deleted rows
    pub filter: RowFilter,
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            sort_order: "sort_order".into(),
            cache_key: "FullTree".into(),
            cache_active: true,
            cache_ttl_secs: 86400,
            selected_id_param: "selected_id".into(),
            parent_param: "id".into(),
            filter: RowFilter::new(),
        }
    }
}

/// Nested-set pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NestedSetConfig {
    /// Reject malformed bounds instead of returning a partial tree
    pub strict_bounds: bool,
    /// Treatment of rows separated from their siblings by a gap
    pub gap_policy: GapPolicy,
}

/// Selection query parameters shared by both pipelines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Query parameter with the comma-separated selected ids
    pub selected_param: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            selected_param: "selected".into(),
        }
    }
}

/// Unified configuration for rstree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one `<model>.json` table per model
    pub data_dir: PathBuf,
    /// Maximum number of cached trees
    pub cache_capacity: u64,
    /// Column mapping
    pub fields: FieldMap,
    pub adjacency: AdjacencyConfig,
    pub nested_set: NestedSetConfig,
    pub selection: SelectionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            cache_capacity: 1024,
            fields: FieldMap::default(),
            adjacency: AdjacencyConfig::default(),
            nested_set: NestedSetConfig::default(),
            selection: SelectionConfig::default(),
        }
    }
}

/// Get the XDG config directory for rstree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rstree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rstree.toml"))
}

/// Check the column mapping for settings no query could satisfy.
pub fn validate_fields(fields: &FieldMap) -> Result<(), ApplicationError> {
    let required = [
        ("id", &fields.id),
        ("label", &fields.label),
        ("parent", &fields.parent),
        ("left", &fields.left),
        ("right", &fields.right),
    ];
    for (name, column) in required {
        if column.trim().is_empty() {
            return Err(config_error(format!("field '{name}' must name a column")));
        }
    }
    for (name, column) in [("root", &fields.root), ("kind", &fields.kind)] {
        if column.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(config_error(format!("field '{name}' must name a column when set")));
        }
    }
    if fields.left == fields.right {
        return Err(config_error(format!(
            "left and right bounds both use column '{}'",
            fields.left
        )));
    }
    Ok(())
}

impl Settings {
    /// Load settings with layered precedence and validate them.
    ///
    /// # Arguments
    /// * `local` - Explicit local config file (must exist); when `None`,
    ///   `./.rstree.toml` is used if present
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(global_path) = global_config_path() {
            builder = builder.add_source(File::from(global_path).required(false));
        }

        builder = match local {
            Some(path) => builder.add_source(File::from(path.to_path_buf()).required(true)),
            None => builder.add_source(File::from(PathBuf::from(LOCAL_CONFIG_FILE)).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("RSTREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.expand_paths();
        settings.validate()?;
        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        let raw = self.data_dir.to_string_lossy().into_owned();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or(raw);
        self.data_dir = PathBuf::from(expanded);
    }

    /// Setup-time checks; failing here keeps bad configuration away from requests.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        validate_fields(&self.fields)?;
        if self.cache_capacity == 0 {
            return Err(config_error("cache_capacity must be positive"));
        }
        let named = [
            ("adjacency.sort_order", &self.adjacency.sort_order),
            ("adjacency.cache_key", &self.adjacency.cache_key),
            ("adjacency.selected_id_param", &self.adjacency.selected_id_param),
            ("adjacency.parent_param", &self.adjacency.parent_param),
            ("selection.selected_param", &self.selection.selected_param),
        ];
        for (name, value) in named {
            if value.trim().is_empty() {
                return Err(config_error(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rstree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/rstree/rstree.toml
#   Local:  ./.rstree.toml (or --config <file>)
#   Env:    RSTREE_* environment variables, e.g. RSTREE_ADJACENCY__CACHE_TTL_SECS=60

# Directory with one <model>.json table per model
# data_dir = "./data"

# Maximum number of cached adjacency trees
# cache_capacity = 1024

[fields]
# id = "id"
# label = "name"          # dotted paths walk nested objects: "translation.name"
# parent = "parent_id"
# left = "lft"
# right = "rgt"
# root = "tree"           # multi-root nested sets
# kind = "type"           # copied into each flat node's "type"

[adjacency]
# sort_order = "sort_order"
# cache_key = "FullTree"  # use a distinct prefix per filter
# cache_active = true
# cache_ttl_secs = 86400  # 0 = no expiry
# selected_id_param = "selected_id"
# parent_param = "id"

# [adjacency.filter]
# deleted = 0

[nested_set]
# strict_bounds = false   # reject malformed bounds instead of partial output
# gap_policy = "drop"     # or "adopt": keep rows after a hole in the bounds

[selection]
# selected_param = "selected"
"#
        .to_string()
    }
}

fn config_error(message: impl Into<String>) -> ApplicationError {
    ApplicationError::Config {
        message: message.into(),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
