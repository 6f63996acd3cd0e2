//! API field names → entity columns, plus value coercion in both directions.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{EntityTrait, QueryResult};
use tracker_search::SearchError;
use tracker_search::ast::Value;
use tracker_search::{KeyValue, SearchResult};
use uuid::Uuid;

/// Logical column type, used to coerce literals and to read scanned keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    Bool,
    Uuid,
    DateTimeUtc,
}

impl FieldKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::I64 => "number",
            FieldKind::Bool => "bool",
            FieldKind::Uuid => "uuid",
            FieldKind::DateTimeUtc => "datetime",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

#[derive(Clone)]
#[must_use]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map
            .insert(api_name.into().to_lowercase(), Field { col, kind });
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(&name.to_lowercase())
    }

    /// Like [`FieldMap::get`], failing with `UnknownField`.
    ///
    /// # Errors
    /// Returns `SearchError::UnknownField` when `name` is not mapped.
    pub fn resolve(&self, name: &str) -> SearchResult<&Field<E>> {
        self.get(name)
            .ok_or_else(|| SearchError::UnknownField(name.to_owned()))
    }
}

fn mismatch(field: &str, expected: FieldKind, got: &'static str) -> SearchError {
    SearchError::TypeMismatch {
        field: field.to_owned(),
        expected: expected.name(),
        got,
    }
}

/// Filter literal → bound SQL value.
///
/// # Errors
/// Returns `SearchError::TypeMismatch` when the literal type does not match
/// `kind`; `null` is never coerced.
pub fn coerce(field: &str, kind: FieldKind, v: &Value) -> SearchResult<sea_orm::Value> {
    Ok(match (kind, v) {
        (FieldKind::String, Value::String(s)) => sea_orm::Value::String(Some(Box::new(s.clone()))),
        (FieldKind::I64, Value::Number(n)) => sea_orm::Value::BigInt(Some(*n)),
        (FieldKind::Bool, Value::Bool(b)) => sea_orm::Value::Bool(Some(*b)),
        (FieldKind::Uuid, Value::Uuid(u)) => sea_orm::Value::Uuid(Some(Box::new(*u))),
        (FieldKind::DateTimeUtc, Value::DateTime(dt)) => {
            sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(*dt)))
        }
        (expected, other) => return Err(mismatch(field, expected, other.kind_name())),
    })
}

/// Ordering key component → bound SQL value.
///
/// # Errors
/// Returns `SearchError::TypeMismatch` when the key value does not match `kind`.
pub fn coerce_key(field: &str, kind: FieldKind, v: &KeyValue) -> SearchResult<sea_orm::Value> {
    Ok(match (kind, v) {
        (FieldKind::String, KeyValue::String(s)) => {
            sea_orm::Value::String(Some(Box::new(s.clone())))
        }
        (FieldKind::I64, KeyValue::I64(n)) => sea_orm::Value::BigInt(Some(*n)),
        (FieldKind::Bool, KeyValue::Bool(b)) => sea_orm::Value::Bool(Some(*b)),
        (FieldKind::Uuid, KeyValue::Uuid(u)) => sea_orm::Value::Uuid(Some(Box::new(*u))),
        (FieldKind::DateTimeUtc, KeyValue::DateTime(dt)) => {
            sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(*dt)))
        }
        (expected, other) => return Err(mismatch(field, expected, other.kind_name())),
    })
}

/// Read one aliased column of a raw result row as a key component.
///
/// # Errors
/// Returns `SearchError::Fetch` when the column is missing or not decodable
/// as `kind`.
pub fn read_key(row: &QueryResult, alias: &str, kind: FieldKind) -> SearchResult<KeyValue> {
    let fetch = |e: sea_orm::DbErr| SearchError::Fetch(e.to_string());
    Ok(match kind {
        FieldKind::String => KeyValue::String(row.try_get::<String>("", alias).map_err(fetch)?),
        FieldKind::I64 => KeyValue::I64(row.try_get::<i64>("", alias).map_err(fetch)?),
        FieldKind::Bool => KeyValue::Bool(row.try_get::<bool>("", alias).map_err(fetch)?),
        FieldKind::Uuid => KeyValue::Uuid(row.try_get::<Uuid>("", alias).map_err(fetch)?),
        FieldKind::DateTimeUtc => {
            KeyValue::DateTime(row.try_get::<DateTime<Utc>>("", alias).map_err(fetch)?)
        }
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::entity::ticket;

    #[test]
    fn names_are_case_insensitive() {
        let fmap = FieldMap::<ticket::Entity>::new().insert("Title", ticket::Column::Title, FieldKind::String);
        assert!(fmap.get("TITLE").is_some());
        assert!(fmap.get("title").is_some());
        assert_eq!(
            fmap.resolve("status").err(),
            Some(SearchError::UnknownField("status".into()))
        );
    }

    #[test]
    fn coercion_checks_types() {
        assert_eq!(
            coerce("seq", FieldKind::I64, &Value::Number(4)).unwrap(),
            sea_orm::Value::BigInt(Some(4))
        );
        assert_eq!(
            coerce("seq", FieldKind::I64, &Value::String("4".into())).unwrap_err(),
            SearchError::TypeMismatch {
                field: "seq".into(),
                expected: "number",
                got: "string",
            }
        );
        assert!(coerce("seq", FieldKind::I64, &Value::Null).is_err());
        assert!(coerce_key("title", FieldKind::String, &KeyValue::I64(1)).is_err());
    }
}
