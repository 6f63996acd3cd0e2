use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ast::Value;
use crate::order::OrderingSpec;

/// One ordering-column value of a row.
///
/// Values of the same variant compare naturally. Comparing across variants
/// only happens on a misconfigured field and orders by variant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum KeyValue {
    Bool(bool),
    I64(i64),
    String(String),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
}

impl KeyValue {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            KeyValue::Bool(_) => "bool",
            KeyValue::I64(_) => "number",
            KeyValue::String(_) => "string",
            KeyValue::Uuid(_) => "uuid",
            KeyValue::DateTime(_) => "datetime",
        }
    }

    /// Compare against a filter literal of the same type. `None` when the
    /// types differ or the literal is `null`.
    #[must_use]
    pub fn cmp_literal(&self, literal: &Value) -> Option<Ordering> {
        match (self, literal) {
            (KeyValue::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (KeyValue::I64(a), Value::Number(b)) => Some(a.cmp(b)),
            (KeyValue::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
            (KeyValue::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (KeyValue::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Bool(v) => write!(f, "{v}"),
            KeyValue::I64(v) => write!(f, "{v}"),
            KeyValue::String(v) => write!(f, "{v}"),
            KeyValue::Uuid(v) => write!(f, "{v}"),
            KeyValue::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<bool> for KeyValue {
    fn from(v: bool) -> Self {
        KeyValue::Bool(v)
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::I64(v)
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        KeyValue::String(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        KeyValue::String(v.to_owned())
    }
}

impl From<Uuid> for KeyValue {
    fn from(v: Uuid) -> Self {
        KeyValue::Uuid(v)
    }
}

impl From<DateTime<Utc>> for KeyValue {
    fn from(v: DateTime<Utc>) -> Self {
        KeyValue::DateTime(v)
    }
}

/// Ordering-column values of one row, in ordering-spec order.
///
/// The empty key sorts before every row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(pub Vec<KeyValue>);

impl CompositeKey {
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }
}

impl From<Vec<KeyValue>> for CompositeKey {
    fn from(values: Vec<KeyValue>) -> Self {
        Self(values)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

/// Lower bound of a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Seek {
    /// From the first row.
    Start,
    /// Rows at or after the key.
    From(CompositeKey),
    /// Rows strictly after the key. Not produced by the handle; for
    /// [`RowSource`](crate::source::RowSource) callers resuming after the
    /// last row they saw.
    After(CompositeKey),
}

impl Seek {
    /// Inclusive seek to a page boundary; the empty boundary is the start.
    #[must_use]
    pub fn boundary(key: &CompositeKey) -> Self {
        if key.is_empty() {
            Seek::Start
        } else {
            Seek::From(key.clone())
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<&CompositeKey> {
        match self {
            Seek::Start => None,
            Seek::From(k) | Seek::After(k) => Some(k),
        }
    }

    #[must_use]
    pub fn admits(&self, order: &OrderingSpec, key: &CompositeKey) -> bool {
        match self {
            Seek::Start => true,
            Seek::From(k) => order.compare_keys(key, k) != Ordering::Less,
            Seek::After(k) => order.compare_keys(key, k) == Ordering::Greater,
        }
    }
}

/// Window of rows requested from a row source: a lower [`Seek`] and an
/// optional exclusive upper key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Seek,
    pub end: Option<CompositeKey>,
}

impl KeyRange {
    #[must_use]
    pub fn from_seek(start: Seek) -> Self {
        Self { start, end: None }
    }

    #[must_use]
    pub fn until(mut self, end: CompositeKey) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn contains(&self, order: &OrderingSpec, key: &CompositeKey) -> bool {
        if !self.start.admits(order, key) {
            return false;
        }
        match &self.end {
            Some(end) => order.compare_keys(key, end) == Ordering::Less,
            None => true,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::order::{OrderKey, OrderingSpec};

    fn key(a: i64, b: &str) -> CompositeKey {
        CompositeKey(vec![KeyValue::I64(a), KeyValue::from(b)])
    }

    #[test]
    fn seek_bounds_respect_direction() {
        let order = OrderingSpec::new(vec![OrderKey::desc("n"), OrderKey::asc("s")]).unwrap();
        let pivot = key(5, "m");

        assert!(Seek::From(pivot.clone()).admits(&order, &pivot));
        assert!(!Seek::After(pivot.clone()).admits(&order, &pivot));
        // desc on the first column: 4 comes after 5
        assert!(Seek::After(pivot.clone()).admits(&order, &key(4, "a")));
        assert!(!Seek::After(pivot.clone()).admits(&order, &key(6, "z")));
        assert!(Seek::After(pivot.clone()).admits(&order, &key(5, "n")));
        assert!(Seek::Start.admits(&order, &key(i64::MAX, "")));
    }

    #[test]
    fn range_end_is_exclusive() {
        let order = OrderingSpec::new(vec![OrderKey::asc("n"), OrderKey::asc("s")]).unwrap();
        let range = KeyRange::from_seek(Seek::boundary(&key(1, "a"))).until(key(3, "a"));

        assert!(range.contains(&order, &key(1, "a")));
        assert!(range.contains(&order, &key(2, "z")));
        assert!(!range.contains(&order, &key(3, "a")));
        assert!(!range.contains(&order, &key(0, "z")));
    }

    #[test]
    fn empty_boundary_seeks_from_start() {
        assert_eq!(Seek::boundary(&CompositeKey::empty()), Seek::Start);
        assert!(Seek::Start.key().is_none());
    }

    #[test]
    fn literal_comparison_requires_matching_types() {
        assert_eq!(
            KeyValue::I64(3).cmp_literal(&Value::Number(4)),
            Some(Ordering::Less)
        );
        assert_eq!(KeyValue::I64(3).cmp_literal(&Value::String("3".into())), None);
        assert_eq!(KeyValue::Bool(true).cmp_literal(&Value::Null), None);
    }
}
