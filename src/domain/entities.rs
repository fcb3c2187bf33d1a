//! Domain entities: core data structures

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primary key of a hierarchy record.
pub type Identifier = i64;

/// One fetched record, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

/// Label used when a record has no label column at all.
pub const DEFAULT_LABEL: &str = "item";

/// Column names used to read hierarchy records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldMap {
    /// Primary key column
    pub id: String,
    /// Display label column (dotted paths walk nested objects)
    pub label: String,
    /// Parent reference column (adjacency list)
    pub parent: String,
    /// Left bound column (nested set)
    pub left: String,
    /// Right bound column (nested set)
    pub right: String,
    /// Root discriminator column for multi-root nested sets
    pub root: Option<String>,
    /// Column copied into the node's `type` (vary-by-type)
    pub kind: Option<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            id: "id".into(),
            label: "name".into(),
            parent: "parent_id".into(),
            left: "lft".into(),
            right: "rgt".into(),
            root: None,
            kind: None,
        }
    }
}

/// Look up a field, falling back to a dotted path through nested objects.
pub fn lookup<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(field) {
        return Some(value);
    }
    let mut parts = field.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Coerce a raw value to an identifier the way a loose integer cast does:
/// numbers truncate, strings yield their leading integer, everything else is 0.
pub fn coerce_identifier(value: &Value) -> Identifier {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(0)
}

/// Loose truthiness: null, false, 0, "" and "0" are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

fn label_of(record: &Record, field: &str) -> String {
    match lookup(record, field) {
        None => DEFAULT_LABEL.to_string(),
        Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn identifier_of(record: &Record, field: &str) -> Identifier {
    lookup(record, field).map(coerce_identifier).unwrap_or(0)
}

/// Nested-set input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: Identifier,
    pub left: i64,
    pub right: i64,
    /// Tree discriminator, 0 for single-root tables
    pub root: Identifier,
    pub label: String,
}

impl Row {
    pub fn new(id: Identifier, left: i64, right: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            left,
            right,
            root: 0,
            label: label.into(),
        }
    }

    pub fn with_root(mut self, root: Identifier) -> Self {
        self.root = root;
        self
    }

    /// Extract a row through the configured field map.
    pub fn from_record(record: &Record, fields: &FieldMap) -> Self {
        Self {
            id: identifier_of(record, &fields.id),
            left: identifier_of(record, &fields.left),
            right: identifier_of(record, &fields.right),
            root: fields
                .root
                .as_deref()
                .map(|f| identifier_of(record, f))
                .unwrap_or(0),
            label: label_of(record, &fields.label),
        }
    }

    /// No room between the bounds for descendants.
    pub fn is_leaf(&self) -> bool {
        self.right == self.left.saturating_add(1)
    }
}

/// Adjacency-list input row.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyRow {
    pub id: Identifier,
    pub parent: ParentRef,
    pub label: String,
    /// Vary-by-type discriminator, copied through unchanged
    pub kind: Option<Value>,
}

impl AdjacencyRow {
    pub fn new(id: Identifier, parent: Identifier, label: impl Into<String>) -> Self {
        Self {
            id,
            parent: ParentRef::from_id(parent),
            label: label.into(),
            kind: None,
        }
    }

    /// Extract a row through the configured field map.
    pub fn from_record(record: &Record, fields: &FieldMap) -> Self {
        let parent = match lookup(record, &fields.parent) {
            Some(v) if is_truthy(v) => ParentRef::Node(coerce_identifier(v)),
            _ => ParentRef::Root,
        };
        Self {
            id: identifier_of(record, &fields.id),
            parent,
            label: label_of(record, &fields.label),
            kind: fields
                .kind
                .as_deref()
                .and_then(|f| lookup(record, f))
                .filter(|v| !v.is_null())
                .cloned(),
        }
    }
}

/// Parent reference of a flat node: `"#"` for roots, the parent id otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    Root,
    Node(Identifier),
}

impl ParentRef {
    pub const ROOT_MARKER: &'static str = "#";

    pub fn from_id(id: Identifier) -> Self {
        if id == 0 {
            ParentRef::Root
        } else {
            ParentRef::Node(id)
        }
    }

    /// Integer form used in `data-parent_id` (0 for roots).
    pub fn as_id(&self) -> Identifier {
        match self {
            ParentRef::Root => 0,
            ParentRef::Node(id) => *id,
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Root => f.write_str(Self::ROOT_MARKER),
            ParentRef::Node(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for ParentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParentRef::Root => serializer.serialize_str(Self::ROOT_MARKER),
            ParentRef::Node(id) => serializer.serialize_i64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParentRefVisitor;

        impl Visitor<'_> for ParentRefVisitor {
            type Value = ParentRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer parent id or \"#\"")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ParentRef, E> {
                Ok(ParentRef::Node(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ParentRef, E> {
                i64::try_from(v)
                    .map(ParentRef::Node)
                    .map_err(|_| E::custom("parent id out of range"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ParentRef, E> {
                if v == ParentRef::ROOT_MARKER {
                    Ok(ParentRef::Root)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(ParentRefVisitor)
    }
}

/// Anchor attributes rendered on the node's link element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnchorAttributes {
    #[serde(rename = "data-id")]
    pub data_id: Identifier,
    #[serde(rename = "data-parent_id", skip_serializing_if = "Option::is_none", default)]
    pub data_parent_id: Option<Identifier>,
}

impl AnchorAttributes {
    pub fn node(id: Identifier) -> Self {
        Self {
            data_id: id,
            data_parent_id: None,
        }
    }

    pub fn with_parent(id: Identifier, parent: Identifier) -> Self {
        Self {
            data_id: id,
            data_parent_id: Some(parent),
        }
    }
}

/// Widget state of a node.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeState {
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub opened: bool,
    pub selected: bool,
}

impl NodeState {
    pub fn selected() -> Self {
        Self {
            opened: false,
            selected: true,
        }
    }

    pub fn opened_and_selected() -> Self {
        Self {
            opened: true,
            selected: true,
        }
    }
}

/// Nested output node.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TreeNode {
    pub id: Identifier,
    /// Sanitized label
    pub text: String,
    pub a_attr: AnchorAttributes,
    pub children: Vec<TreeNode>,
    pub state: NodeState,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TreeNode::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Flat (adjacency) output node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatNode {
    pub id: Identifier,
    pub parent: ParentRef,
    /// Sanitized label
    pub text: String,
    pub a_attr: AnchorAttributes,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<NodeState>,
}
