#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Permission-filtered keyset pagination.
//!
//! A search composes the caller's structural filter with the principal's
//! access predicate ([`compose`]), scans the filtered set once in a total
//! order to precompute page boundaries ([`PageIndex`]), and hands back a
//! [`SearchHandle`] that serves any page by seeking to its boundary key.
//!
//! Rows come from a [`RowSource`]; [`MemoryRowSource`] evaluates everything
//! client-side, relational sources push the filter and the access predicate
//! down into the query.

pub mod ast;
pub mod boundary;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod key;
pub mod memory;
pub mod order;
pub mod source;

pub use boundary::{PageBoundary, PageIndex};
pub use compose::{AccessFilter, EffectiveFilter, SearchKind, compose};
pub use config::{ConfigError, SearchConfig};
pub use engine::SearchEngine;
pub use error::{SearchError, SearchResult, ValidationError};
pub use handle::{HandleSnapshot, Page, SearchHandle};
pub use key::{CompositeKey, KeyRange, KeyValue, Seek};
pub use memory::MemoryRowSource;
pub use order::{OrderKey, OrderingSpec, SortDir};
pub use source::{RowSource, SearchRow};
