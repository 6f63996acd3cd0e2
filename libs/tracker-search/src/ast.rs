//! Structural filter AST.
//!
//! Filters are built in code rather than parsed: use [`field`] to get a
//! column handle and combine the resulting expressions with
//! [`Expr::and`], [`Expr::or`] and `!`.
//!
//! ```rust
//! use tracker_search::ast::field;
//!
//! let filter = field("status").eq("open").and(field("title").contains("crash"));
//! assert_eq!(filter.to_string(), "(status eq 'open') and (contains(title, 'crash'))");
//! ```

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Box<Expr>, CompareOperator, Box<Expr>),
    In(Box<Expr>, Vec<Expr>),
    Function(String, Vec<Expr>),
    Identifier(String),
    Value(Value),
}

impl Expr {
    /// Combine two expressions with AND: `expr1 and expr2`
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// Combine two expressions with OR: `expr1 or expr2`
    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// Negate an expression: `not expr`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        !self
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Self::Output {
        Expr::Not(Box::new(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::And(a, b) => write!(f, "({a}) and ({b})"),
            Expr::Or(a, b) => write!(f, "({a}) or ({b})"),
            Expr::Not(x) => write!(f, "not ({x})"),
            Expr::Compare(l, op, r) => write!(f, "{l} {op} {r}"),
            Expr::In(l, list) => {
                write!(f, "{l} in (")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Expr::Function(name, args) => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Identifier(name) => f.write_str(name),
            Expr::Value(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOperator::Eq => "eq",
            CompareOperator::Ne => "ne",
            CompareOperator::Gt => "gt",
            CompareOperator::Ge => "ge",
            CompareOperator::Lt => "lt",
            CompareOperator::Le => "le",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(i64),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    String(String),
}

impl Value {
    /// Short type name, used in type mismatch errors.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Uuid(_) => "uuid",
            Value::DateTime(_) => "datetime",
            Value::String(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(i64::from(v))
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

/// Column handle for building comparisons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field(String);

/// Start an expression on the named column.
#[must_use]
pub fn field(name: impl Into<String>) -> Field {
    Field(name.into())
}

impl Field {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    fn identifier(&self) -> Box<Expr> {
        Box::new(Expr::Identifier(self.0.clone()))
    }

    fn compare(&self, op: CompareOperator, value: impl Into<Value>) -> Expr {
        Expr::Compare(self.identifier(), op, Box::new(Expr::Value(value.into())))
    }

    fn call(&self, name: &str, s: impl Into<String>) -> Expr {
        Expr::Function(
            name.to_owned(),
            vec![*self.identifier(), Expr::Value(Value::String(s.into()))],
        )
    }

    #[must_use]
    pub fn eq(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOperator::Eq, value)
    }

    #[must_use]
    pub fn ne(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOperator::Ne, value)
    }

    #[must_use]
    pub fn gt(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOperator::Gt, value)
    }

    #[must_use]
    pub fn ge(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOperator::Ge, value)
    }

    #[must_use]
    pub fn lt(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOperator::Lt, value)
    }

    #[must_use]
    pub fn le(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOperator::Le, value)
    }

    #[must_use]
    pub fn is_null(&self) -> Expr {
        self.compare(CompareOperator::Eq, Value::Null)
    }

    /// `field in (v1, v2, ...)`; an empty list matches nothing.
    #[must_use]
    pub fn in_list<I, V>(&self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::In(
            self.identifier(),
            values.into_iter().map(|v| Expr::Value(v.into())).collect(),
        )
    }

    #[must_use]
    pub fn contains(&self, s: impl Into<String>) -> Expr {
        self.call("contains", s)
    }

    #[must_use]
    pub fn starts_with(&self, s: impl Into<String>) -> Expr {
        self.call("startswith", s)
    }

    #[must_use]
    pub fn ends_with(&self, s: impl Into<String>) -> Expr {
        self.call("endswith", s)
    }
}
