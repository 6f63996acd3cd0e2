//! Key ranges → lexicographic WHERE conditions and ORDER BY clauses.
//!
//! For an ordering `(k0 d0, k1 d1, ..)` and a key `(v0, v1, ..)`, rows after
//! the key satisfy
//!
//! ```text
//! (k0 >d0 v0) OR (k0 = v0 AND k1 >d1 v1) OR ...
//! ```
//!
//! where `>d` is `>` for ascending and `<` for descending columns. An
//! inclusive seek relaxes the last comparison to `>=`/`<=`; the exclusive
//! upper bound flips every comparison.

use sea_orm::sea_query::{Expr, Order, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryOrder, Select};
use tracker_search::{
    CompositeKey, KeyRange, OrderingSpec, SearchError, SearchResult, Seek, SortDir,
};

use crate::field_map::{FieldMap, coerce_key};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Bound {
    Lower { inclusive: bool },
    Upper,
}

fn compare<C: ColumnTrait>(
    col: C,
    value: sea_orm::Value,
    dir: SortDir,
    bound: Bound,
    last: bool,
) -> SimpleExpr {
    let forward = matches!(
        (dir, bound),
        (SortDir::Asc, Bound::Lower { .. }) | (SortDir::Desc, Bound::Upper)
    );
    let inclusive = last && bound == Bound::Lower { inclusive: true };
    match (forward, inclusive) {
        (true, false) => Expr::col(col).gt(value),
        (true, true) => Expr::col(col).gte(value),
        (false, false) => Expr::col(col).lt(value),
        (false, true) => Expr::col(col).lte(value),
    }
}

fn lexicographic<E: EntityTrait>(
    key: &CompositeKey,
    order: &OrderingSpec,
    fmap: &FieldMap<E>,
    bound: Bound,
) -> SearchResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    if key.len() != order.len() {
        return Err(SearchError::InvalidSnapshot(
            "seek key does not match ordering",
        ));
    }

    let mut resolved = Vec::with_capacity(key.len());
    for (order_key, value) in order.keys().iter().zip(key.values()) {
        let field = fmap.resolve(&order_key.field)?;
        let value = coerce_key(&order_key.field, field.kind, value)?;
        resolved.push((field.col, value, order_key.dir));
    }

    let mut main = Condition::any();
    for i in 0..resolved.len() {
        let mut term = Condition::all();
        for (col, value, _) in resolved.iter().take(i) {
            term = term.add(Expr::col(*col).eq(value.clone()));
        }
        let (col, value, dir) = &resolved[i];
        term = term.add(compare(
            *col,
            value.clone(),
            *dir,
            bound,
            i + 1 == resolved.len(),
        ));
        main = main.add(term);
    }
    Ok(main)
}

/// WHERE condition selecting the rows of `range` under `order`.
///
/// # Errors
/// - `SearchError::InvalidSnapshot` when a bound key does not match `order`
/// - `SearchError::UnknownField` / `TypeMismatch` for unmapped or mistyped
///   order columns
pub fn range_condition<E: EntityTrait>(
    range: &KeyRange,
    order: &OrderingSpec,
    fmap: &FieldMap<E>,
) -> SearchResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    let mut cond = Condition::all();
    match &range.start {
        Seek::Start => {}
        Seek::From(key) => {
            cond = cond.add(lexicographic(key, order, fmap, Bound::Lower { inclusive: true })?);
        }
        Seek::After(key) => {
            cond = cond.add(lexicographic(key, order, fmap, Bound::Lower { inclusive: false })?);
        }
    }
    if let Some(end) = &range.end {
        cond = cond.add(lexicographic(end, order, fmap, Bound::Upper)?);
    }
    Ok(cond)
}

/// Apply `order` to a select.
///
/// # Errors
/// Returns `SearchError::UnknownField` for an unmapped order column.
pub fn apply_order<E: EntityTrait>(
    select: Select<E>,
    order: &OrderingSpec,
    fmap: &FieldMap<E>,
) -> SearchResult<Select<E>>
where
    E::Column: ColumnTrait + Copy,
{
    let mut query = select;
    for key in order.keys() {
        let field = fmap.resolve(&key.field)?;
        let dir = match key.dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        };
        query = query.order_by(field.col, dir);
    }
    Ok(query)
}
