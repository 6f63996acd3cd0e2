//! In-memory row source.
//!
//! Evaluates the structural filter and the access predicate client-side.
//! Intended for small sets and tests; every fetch sorts the filtered rows.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracker_security::{AccessPredicate, ImplicationPredicate};

use crate::ast::{CompareOperator, Expr, Value};
use crate::compose::EffectiveFilter;
use crate::error::{SearchError, SearchResult, ValidationError};
use crate::key::{CompositeKey, KeyRange, KeyValue};
use crate::order::OrderingSpec;
use crate::source::{RowSource, SearchRow};

pub struct MemoryRowSource<R> {
    rows: RwLock<Vec<R>>,
    predicate: Arc<dyn AccessPredicate>,
}

impl<R> MemoryRowSource<R> {
    #[must_use]
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: RwLock::new(rows),
            predicate: Arc::new(ImplicationPredicate),
        }
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: Arc<dyn AccessPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn insert(&self, row: R) {
        self.rows.write().push(row);
    }

    /// Remove every row matching `pred`; returns how many were removed.
    pub fn remove_where(&self, pred: impl Fn(&R) -> bool) -> usize {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| !pred(r));
        before - rows.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl<R: SearchRow + Clone> MemoryRowSource<R> {
    /// Filtered rows with their keys, sorted by `order`.
    fn ordered(
        &self,
        filter: &EffectiveFilter,
        order: &OrderingSpec,
    ) -> SearchResult<Vec<(CompositeKey, R)>> {
        let rows = self.rows.read();
        let mut out = Vec::new();
        for row in rows.iter() {
            if !filter.access().admits(self.predicate.as_ref(), row) {
                continue;
            }
            if let Some(expr) = filter.structural()
                && !evaluate(expr, row)?
            {
                continue;
            }
            out.push((row.key_for(order)?, row.clone()));
        }
        drop(rows);
        out.sort_by(|(a, _), (b, _)| order.compare_keys(a, b));
        Ok(out)
    }
}

#[async_trait]
impl<R> RowSource for MemoryRowSource<R>
where
    R: SearchRow + Clone + Send + Sync + 'static,
{
    type Row = R;

    async fn fetch_rows(
        &self,
        filter: &EffectiveFilter,
        order: &OrderingSpec,
        range: &KeyRange,
        limit: usize,
    ) -> SearchResult<Vec<R>> {
        Ok(self
            .ordered(filter, order)?
            .into_iter()
            .filter(|(key, _)| range.contains(order, key))
            .take(limit)
            .map(|(_, row)| row)
            .collect())
    }

    async fn scan_keys(
        &self,
        filter: &EffectiveFilter,
        order: &OrderingSpec,
    ) -> SearchResult<Vec<CompositeKey>> {
        if order.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }
        Ok(self
            .ordered(filter, order)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }
}

/// Evaluate a structural filter against one row.
///
/// # Errors
/// - `SearchError::UnknownField` for a field the row does not have
/// - `SearchError::TypeMismatch` when a literal does not match the field type
/// - `SearchError::UnsupportedFilter` for forms with no row-level meaning
pub fn evaluate<R: SearchRow + ?Sized>(expr: &Expr, row: &R) -> SearchResult<bool> {
    match expr {
        Expr::And(a, b) => Ok(evaluate(a, row)? && evaluate(b, row)?),
        Expr::Or(a, b) => Ok(evaluate(a, row)? || evaluate(b, row)?),
        Expr::Not(x) => Ok(!evaluate(x, row)?),

        Expr::Compare(lhs, op, rhs) => {
            let (Expr::Identifier(name), Expr::Value(literal)) = (&**lhs, &**rhs) else {
                return Err(SearchError::UnsupportedFilter(format!(
                    "comparison must be field op literal: {expr}"
                )));
            };
            let value = lookup(row, name)?;
            if matches!(literal, Value::Null) {
                // row fields are never null
                return match op {
                    CompareOperator::Eq => Ok(false),
                    CompareOperator::Ne => Ok(true),
                    _ => Err(SearchError::UnsupportedFilter(format!(
                        "{op} null on {name}"
                    ))),
                };
            }
            let ord = compare(name, &value, literal)?;
            Ok(match op {
                CompareOperator::Eq => ord == Ordering::Equal,
                CompareOperator::Ne => ord != Ordering::Equal,
                CompareOperator::Gt => ord == Ordering::Greater,
                CompareOperator::Ge => ord != Ordering::Less,
                CompareOperator::Lt => ord == Ordering::Less,
                CompareOperator::Le => ord != Ordering::Greater,
            })
        }

        Expr::In(lhs, list) => {
            let Expr::Identifier(name) = &**lhs else {
                return Err(SearchError::UnsupportedFilter(
                    "left side of IN must be a field".to_owned(),
                ));
            };
            let value = lookup(row, name)?;
            for item in list {
                let Expr::Value(literal) = item else {
                    return Err(SearchError::UnsupportedFilter(
                        "IN() list supports only literals".to_owned(),
                    ));
                };
                if compare(name, &value, literal)? == Ordering::Equal {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        Expr::Function(fname, args) => {
            let (Some(Expr::Identifier(name)), Some(Expr::Value(Value::String(needle))), 2) =
                (args.first(), args.get(1), args.len())
            else {
                return Err(SearchError::UnsupportedFilter(format!("{fname}()")));
            };
            let KeyValue::String(hay) = lookup(row, name)? else {
                return Err(SearchError::TypeMismatch {
                    field: name.clone(),
                    expected: "string",
                    got: "non-string field",
                });
            };
            match fname.to_ascii_lowercase().as_str() {
                "contains" => Ok(hay.contains(needle.as_str())),
                "startswith" => Ok(hay.starts_with(needle.as_str())),
                "endswith" => Ok(hay.ends_with(needle.as_str())),
                _ => Err(SearchError::UnsupportedFilter(format!("{fname}()"))),
            }
        }

        Expr::Identifier(name) => Err(SearchError::UnsupportedFilter(format!(
            "bare identifier not allowed: {name}"
        ))),
        Expr::Value(_) => Err(SearchError::UnsupportedFilter(
            "bare literal not allowed".to_owned(),
        )),
    }
}

fn lookup<R: SearchRow + ?Sized>(row: &R, name: &str) -> SearchResult<KeyValue> {
    row.field(name)
        .ok_or_else(|| SearchError::UnknownField(name.to_owned()))
}

fn compare(name: &str, value: &KeyValue, literal: &Value) -> SearchResult<Ordering> {
    value
        .cmp_literal(literal)
        .ok_or_else(|| SearchError::TypeMismatch {
            field: name.to_owned(),
            expected: value.kind_name(),
            got: literal.kind_name(),
        })
}
