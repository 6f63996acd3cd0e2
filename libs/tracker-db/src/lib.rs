#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Relational storage for the ticket tracker.
//!
//! [`SeaOrmRowSource`] implements [`tracker_search::RowSource`] by pushing
//! the structural filter, the access predicate and the page seek down into
//! SQL. [`GrantRepository`] persists principals and their scoped grants.

pub mod access;
pub mod entity;
pub mod error;
pub mod field_map;
pub mod filter;
pub mod grants;
pub mod row_source;
pub mod schema;
pub mod seek;

pub use access::{AccessScopedEntity, build_access_condition};
pub use error::{DbError, DbResult};
pub use field_map::{Field, FieldKind, FieldMap};
pub use filter::expr_to_condition;
pub use grants::GrantRepository;
pub use row_source::{SeaOrmRowSource, TicketRowSource, ticket_fields};
pub use schema::create_schema;
