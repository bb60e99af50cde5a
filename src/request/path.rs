//! Wire-level path and key syntax.
//!
//! Relation segments and the trailing field are joined with `__`; an order
//! key may carry one leading `-` for descending; a filter key may carry a
//! trailing operator suffix (`__gte`, `__in`, ...) from a fixed set. The
//! syntax is a compatibility surface - the delimiter and markers are
//! bit-exact with the existing wire format.

use inflector::Inflector;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::filter::FilterOp;

/// Segment delimiter in field paths (`author__rating`).
pub const PATH_DELIMITER: &str = "__";

/// Leading marker on a descending order key (`-year`).
pub const DESC_MARKER: char = '-';

/// An ordered field path: zero or more relation segments, then a field.
///
/// Parsing never fails - whether segments name real relations and fields
/// is the compiler's job, and it reports structured errors there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a wire key. Segments are snake_cased on the way in (wire
    /// names may arrive camelCased).
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split(PATH_DELIMITER)
            .map(|s| s.to_snake_case())
            .collect();
        Self { segments }
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The relation segments: everything but the trailing field.
    pub fn relations(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The trailing field segment.
    pub fn field(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join(PATH_DELIMITER))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FieldPath::parse(&raw))
    }
}

/// A parsed filter key: path plus the operator suffix, if one was present.
///
/// `author__rating__gte` splits into path `author__rating` and op `Gte`.
/// A trailing segment that is not a known suffix stays part of the path,
/// and the operator defaults later (`eq`, or `is` for null values).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterKey {
    pub path: FieldPath,
    pub op: Option<FilterOp>,
}

impl FilterKey {
    pub fn parse(raw: &str) -> Self {
        if let Some((head, tail)) = raw.rsplit_once(PATH_DELIMITER) {
            if let Some(op) = FilterOp::from_suffix(tail) {
                return Self {
                    path: FieldPath::parse(head),
                    op: Some(op),
                };
            }
        }
        Self {
            path: FieldPath::parse(raw),
            op: None,
        }
    }
}

/// Sort direction for an order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A parsed order key: `-year` means descending by `year`.
///
/// Serializes back to the wire string form.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub path: FieldPath,
    pub direction: SortDirection,
}

impl OrderKey {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(DESC_MARKER) {
            Some(rest) => Self {
                path: FieldPath::parse(rest),
                direction: SortDirection::Desc,
            },
            None => Self {
                path: FieldPath::parse(raw),
                direction: SortDirection::Asc,
            },
        }
    }

    pub fn asc(raw: &str) -> Self {
        Self {
            path: FieldPath::parse(raw),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(raw: &str) -> Self {
        Self {
            path: FieldPath::parse(raw),
            direction: SortDirection::Desc,
        }
    }
}

impl std::fmt::Display for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.direction == SortDirection::Desc {
            write!(f, "{}", DESC_MARKER)?;
        }
        write!(f, "{}", self.path)
    }
}

impl Serialize for OrderKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OrderKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::custom("empty order key"));
        }
        Ok(OrderKey::parse(&raw))
    }
}
