//! Filter expressions - the nested boolean tree over field paths.
//!
//! A filter arrives either as an explicit logical tree (`{"or": [...]}`)
//! or as a flat object of `path__op: value` entries, which reads as the
//! conjunction of its entries (sorted by key, so the tree shape is
//! deterministic). Both forms deserialize into [`FilterNode`].

use once_cell::sync::Lazy;
use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

use super::path::{FieldPath, FilterKey, PATH_DELIMITER};

/// Comparison operator on a filter leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Is,
    Contains,
}

/// Wire suffix -> operator. The analog of the classic ORM lookup map; the
/// suffix set is closed and part of the wire contract.
static SUFFIXES: Lazy<HashMap<&'static str, FilterOp>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("eq", FilterOp::Eq);
    map.insert("ne", FilterOp::Ne);
    map.insert("lt", FilterOp::Lt);
    map.insert("lte", FilterOp::Lte);
    map.insert("gt", FilterOp::Gt);
    map.insert("gte", FilterOp::Gte);
    map.insert("in", FilterOp::In);
    map.insert("is", FilterOp::Is);
    map.insert("contains", FilterOp::Contains);
    map
});

impl FilterOp {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        SUFFIXES.get(suffix).copied()
    }

    pub fn suffix(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::In => "in",
            FilterOp::Is => "is",
            FilterOp::Contains => "contains",
        }
    }

    /// The operator a suffix-less key defaults to for this value.
    pub fn default_for(value: &FilterValue) -> Self {
        if matches!(value, FilterValue::Null) {
            FilterOp::Is
        } else {
            FilterOp::Eq
        }
    }
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// A literal comparison value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FilterValue>),
    /// Structured values compared against json-typed fields.
    Json(serde_json::Value),
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Str(v.into())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Str(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        FilterValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl FilterValue {
    fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FilterValue::Null,
            serde_json::Value::Bool(b) => FilterValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FilterValue::Int(i)
                } else {
                    FilterValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => FilterValue::Str(s.clone()),
            serde_json::Value::Array(items) => {
                FilterValue::List(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(_) => FilterValue::Json(value.clone()),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            FilterValue::Null => serde_json::Value::Null,
            FilterValue::Bool(b) => serde_json::Value::Bool(*b),
            FilterValue::Int(i) => serde_json::Value::from(*i),
            FilterValue::Float(f) => serde_json::Value::from(*f),
            FilterValue::Str(s) => serde_json::Value::from(s.as_str()),
            FilterValue::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            FilterValue::Json(v) => v.clone(),
        }
    }
}

/// A nested boolean filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
    Leaf {
        path: FieldPath,
        op: FilterOp,
        value: FilterValue,
    },
}

impl FilterNode {
    /// Build a leaf from a wire key (`author__rating__gte`) and a value.
    /// The operator defaults to `eq`, or `is` when the value is null.
    pub fn leaf(key: &str, value: impl Into<FilterValue>) -> Self {
        let value = value.into();
        let parsed = FilterKey::parse(key);
        let op = parsed.op.unwrap_or_else(|| FilterOp::default_for(&value));
        FilterNode::Leaf {
            path: parsed.path,
            op,
            value,
        }
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::And(children)
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: FilterNode) -> Self {
        FilterNode::Not(Box::new(child))
    }

    /// Parse a filter document. Logical nodes are single-key objects
    /// (`and`/`or` over arrays, `not` over an object); any other object is
    /// a flat conjunction of `key: value` leaves in sorted key order.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let serde_json::Value::Object(map) = value else {
            return Err(format!("filter must be an object, got {}", value));
        };
        if let (1, Some((key, inner))) = (map.len(), map.iter().next()) {
            match (key.as_str(), inner) {
                ("and", serde_json::Value::Array(items)) => {
                    return Ok(FilterNode::And(Self::from_values(items)?));
                }
                ("or", serde_json::Value::Array(items)) => {
                    return Ok(FilterNode::Or(Self::from_values(items)?));
                }
                ("not", inner @ serde_json::Value::Object(_)) => {
                    return Ok(FilterNode::not(Self::from_value(inner)?));
                }
                _ => {}
            }
        }

        // Flat form: sort keys so the resulting And shape is deterministic.
        let sorted: BTreeMap<_, _> = map.iter().collect();
        let mut leaves: Vec<FilterNode> = sorted
            .into_iter()
            .map(|(key, value)| FilterNode::leaf(key, FilterValue::from_json(value)))
            .collect();
        if leaves.len() == 1 {
            Ok(leaves.remove(0))
        } else {
            Ok(FilterNode::And(leaves))
        }
    }

    fn from_values(items: &[serde_json::Value]) -> Result<Vec<Self>, String> {
        items.iter().map(Self::from_value).collect()
    }

    fn to_value(&self) -> serde_json::Value {
        match self {
            FilterNode::And(children) => serde_json::json!({
                "and": children.iter().map(Self::to_value).collect::<Vec<_>>()
            }),
            FilterNode::Or(children) => serde_json::json!({
                "or": children.iter().map(Self::to_value).collect::<Vec<_>>()
            }),
            FilterNode::Not(child) => serde_json::json!({ "not": child.to_value() }),
            FilterNode::Leaf { path, op, value } => {
                let default = FilterOp::default_for(value);
                let key = if *op == default {
                    path.to_string()
                } else {
                    format!("{}{}{}", path, PATH_DELIMITER, op.suffix())
                };
                let mut map = serde_json::Map::new();
                map.insert(key, value.to_json());
                serde_json::Value::Object(map)
            }
        }
    }
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_value() {
            serde_json::Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in &map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            other => other.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        FilterNode::from_value(&value).map_err(D::Error::custom)
    }
}
