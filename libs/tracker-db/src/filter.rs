//! Structural filter AST → `sea_orm::Condition`.

use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait};
use tracker_search::ast::{self, CompareOperator as Op, Value};
use tracker_search::{SearchError, SearchResult};

use crate::field_map::{Field, FieldKind, FieldMap, coerce};

const LIKE_ESCAPE: char = '\\';

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push(LIKE_ESCAPE);
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

fn like(pattern: String) -> LikeExpr {
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

fn string_field<'a, E: EntityTrait>(
    fmap: &'a FieldMap<E>,
    name: &str,
) -> SearchResult<&'a Field<E>> {
    let f = fmap.resolve(name)?;
    if f.kind != FieldKind::String {
        return Err(SearchError::TypeMismatch {
            field: name.to_owned(),
            expected: FieldKind::String.name(),
            got: "non-string field",
        });
    }
    Ok(f)
}

/// Translate a structural filter into a WHERE condition over `E`.
///
/// Accepts the same forms the in-memory evaluator does, with the same
/// errors, so a filter behaves alike on both row sources.
///
/// # Errors
/// - `SearchError::UnknownField` for a name missing from `fmap`
/// - `SearchError::TypeMismatch` for a literal of the wrong type
/// - `SearchError::UnsupportedFilter` for forms with no SQL meaning here
pub fn expr_to_condition<E: EntityTrait>(
    expr: &ast::Expr,
    fmap: &FieldMap<E>,
) -> SearchResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    use ast::Expr as X;

    Ok(match expr {
        X::And(a, b) => Condition::all()
            .add(expr_to_condition::<E>(a, fmap)?)
            .add(expr_to_condition::<E>(b, fmap)?),
        X::Or(a, b) => Condition::any()
            .add(expr_to_condition::<E>(a, fmap)?)
            .add(expr_to_condition::<E>(b, fmap)?),
        X::Not(x) => Condition::all().add(expr_to_condition::<E>(x, fmap)?).not(),

        X::Compare(lhs, op, rhs) => {
            let (X::Identifier(name), X::Value(literal)) = (&**lhs, &**rhs) else {
                return Err(SearchError::UnsupportedFilter(format!(
                    "comparison must be field op literal: {expr}"
                )));
            };
            let field = fmap.resolve(name)?;
            let col = field.col;

            if matches!(literal, Value::Null) {
                return Ok(match op {
                    Op::Eq => Condition::all().add(Expr::col(col).is_null()),
                    Op::Ne => Condition::all().add(Expr::col(col).is_not_null()),
                    _ => {
                        return Err(SearchError::UnsupportedFilter(format!(
                            "{op} null on {name}"
                        )));
                    }
                });
            }

            let value = coerce(name, field.kind, literal)?;
            let cmp = match op {
                Op::Eq => Expr::col(col).eq(value),
                Op::Ne => Expr::col(col).ne(value),
                Op::Gt => Expr::col(col).gt(value),
                Op::Ge => Expr::col(col).gte(value),
                Op::Lt => Expr::col(col).lt(value),
                Op::Le => Expr::col(col).lte(value),
            };
            Condition::all().add(cmp)
        }

        X::In(lhs, list) => {
            let X::Identifier(name) = &**lhs else {
                return Err(SearchError::UnsupportedFilter(
                    "left side of IN must be a field".to_owned(),
                ));
            };
            let field = fmap.resolve(name)?;
            let values = list
                .iter()
                .map(|item| match item {
                    X::Value(v) => coerce(name, field.kind, v),
                    _ => Err(SearchError::UnsupportedFilter(
                        "IN() list supports only literals".to_owned(),
                    )),
                })
                .collect::<SearchResult<Vec<_>>>()?;
            if values.is_empty() {
                Condition::all().add(Expr::value(false))
            } else {
                Condition::all().add(Expr::col(field.col).is_in(values))
            }
        }

        X::Function(fname, args) => {
            let [X::Identifier(name), X::Value(Value::String(s))] = args.as_slice() else {
                return Err(SearchError::UnsupportedFilter(format!("{fname}()")));
            };
            let pattern = match fname.to_ascii_lowercase().as_str() {
                "contains" => format!("%{}%", like_escape(s)),
                "startswith" => format!("{}%", like_escape(s)),
                "endswith" => format!("%{}", like_escape(s)),
                _ => return Err(SearchError::UnsupportedFilter(format!("{fname}()"))),
            };
            let f = string_field(fmap, name)?;
            Condition::all().add(Expr::col(f.col).like(like(pattern)))
        }

        X::Identifier(name) => {
            return Err(SearchError::UnsupportedFilter(format!(
                "bare identifier not allowed: {name}"
            )));
        }
        X::Value(_) => {
            return Err(SearchError::UnsupportedFilter(
                "bare literal not allowed".to_owned(),
            ));
        }
    })
}
