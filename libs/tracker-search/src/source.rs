use async_trait::async_trait;
use tracker_security::AccessControlled;

use crate::compose::EffectiveFilter;
use crate::error::{SearchError, SearchResult};
use crate::key::{CompositeKey, KeyRange, KeyValue};
use crate::order::OrderingSpec;

/// A row that can be filtered, ordered and access-checked client-side.
pub trait SearchRow: AccessControlled {
    /// Value of a filterable/orderable field, `None` if the row has no such
    /// field. Names are matched case-insensitively.
    fn field(&self, name: &str) -> Option<KeyValue>;

    /// Composite key of this row under `order`.
    ///
    /// # Errors
    /// Returns `SearchError::UnknownField` for an order column the row lacks.
    fn key_for(&self, order: &OrderingSpec) -> SearchResult<CompositeKey> {
        order
            .keys()
            .iter()
            .map(|k| {
                self.field(&k.field)
                    .ok_or_else(|| SearchError::UnknownField(k.field.clone()))
            })
            .collect::<SearchResult<Vec<_>>>()
            .map(CompositeKey)
    }
}

/// Row-fetch collaborator.
///
/// Implementations apply the whole [`EffectiveFilter`], including its access
/// part, before ordering and limiting. Read failures must surface as errors,
/// never as an empty result.
#[async_trait]
pub trait RowSource: Send + Sync {
    type Row: Clone + Send + Sync + 'static;

    /// Rows inside `range`, in `order`, at most `limit` of them.
    ///
    /// The handle only issues inclusive [`Seek::From`] ranges bounded by the
    /// next page's boundary. Callers continuing past the last row they saw
    /// pass [`Seek::After`], which must exclude that row.
    ///
    /// [`Seek::From`]: crate::key::Seek::From
    /// [`Seek::After`]: crate::key::Seek::After
    async fn fetch_rows(
        &self,
        filter: &EffectiveFilter,
        order: &OrderingSpec,
        range: &KeyRange,
        limit: usize,
    ) -> SearchResult<Vec<Self::Row>>;

    /// Composite keys of every filtered row, in `order`. One pass; this is
    /// what page boundaries are computed from.
    ///
    /// # Errors
    /// Returns `ValidationError::EmptyOrder` for an empty `order`, which
    /// yields no usable boundary keys.
    async fn scan_keys(
        &self,
        filter: &EffectiveFilter,
        order: &OrderingSpec,
    ) -> SearchResult<Vec<CompositeKey>>;
}
