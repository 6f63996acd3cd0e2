use std::sync::Arc;

use tracing::debug;
use tracker_security::Principal;

use crate::ast::Expr;
use crate::boundary::PageIndex;
use crate::compose::{SearchKind, compose};
use crate::config::SearchConfig;
use crate::error::{SearchResult, ValidationError};
use crate::handle::{HandleSnapshot, SearchHandle};
use crate::order::{OrderKey, OrderingSpec, SortDir};
use crate::source::RowSource;

/// Entry point for permission-filtered, paginated searches over one row
/// source.
///
/// ```rust,ignore
/// let engine = SearchEngine::new(Arc::new(source), SearchConfig::default())
///     .with_tiebreaker("project_id", SortDir::Asc)
///     .with_tiebreaker("seq", SortDir::Asc);
///
/// let mut handle = engine
///     .begin_search(&principal, Some(field("status").eq("open")), &order, Some(50))
///     .await?;
/// let page = handle.page_next().await?;
/// ```
pub struct SearchEngine<S: RowSource> {
    source: Arc<S>,
    config: SearchConfig,
    kind: SearchKind,
    tiebreakers: Vec<OrderKey>,
}

impl<S: RowSource> SearchEngine<S> {
    #[must_use]
    pub fn new(source: Arc<S>, config: SearchConfig) -> Self {
        Self {
            source,
            config,
            kind: SearchKind::default(),
            tiebreakers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append a tiebreaker column to every ordering that lacks it. Together
    /// the tiebreakers must identify a row, so that the order is total.
    /// An engine without tiebreakers refuses to search.
    #[must_use]
    pub fn with_tiebreaker(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.tiebreakers.push(OrderKey::new(field, dir));
        self
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Caller ordering with the configured tiebreakers appended.
    ///
    /// # Errors
    /// - `ValidationError::MissingTiebreaker` when the engine has no tiebreaker
    /// - `ValidationError::TooManyOrderFields` when the caller supplies more
    ///   keys than configured
    pub fn effective_order(&self, ordering: &OrderingSpec) -> Result<OrderingSpec, ValidationError> {
        if self.tiebreakers.is_empty() {
            return Err(ValidationError::MissingTiebreaker);
        }
        if ordering.len() > self.config.max_order_fields {
            return Err(ValidationError::TooManyOrderFields {
                count: ordering.len(),
                max: self.config.max_order_fields,
            });
        }
        Ok(self
            .tiebreakers
            .iter()
            .fold(ordering.clone(), |acc, key| acc.with_tiebreaker(&key.field, key.dir)))
    }

    fn effective_page_size(&self, page_size: Option<usize>) -> Result<usize, ValidationError> {
        let requested = page_size.unwrap_or(self.config.default_page_size);
        if requested == 0 {
            return Err(ValidationError::PageSize(requested));
        }
        if requested > self.config.max_page_size {
            debug!(
                requested,
                max = self.config.max_page_size,
                "page size clamped"
            );
            return Ok(self.config.max_page_size);
        }
        Ok(requested)
    }

    /// Start a search: compose the filter with the principal's access
    /// predicate, scan the filtered set once and precompute every page
    /// boundary. `page_size = None` uses the configured default.
    ///
    /// # Errors
    /// - `SearchError::Validation` for a zero page size, too many order keys
    ///   or an engine without tiebreakers
    /// - row source errors (`UnknownField`, `TypeMismatch`, `Fetch`, ...)
    ///   unchanged
    pub async fn begin_search(
        &self,
        principal: &Principal,
        structural: Option<Expr>,
        ordering: &OrderingSpec,
        page_size: Option<usize>,
    ) -> SearchResult<SearchHandle<S>> {
        let page_size = self.effective_page_size(page_size)?;
        let order = self.effective_order(ordering)?;
        let filter = compose(principal, structural, self.kind.required_permission());

        let keys = self.source.scan_keys(&filter, &order).await?;
        let index = PageIndex::build(keys, page_size)?;
        debug!(
            principal = %principal.id(),
            order = %order,
            rows = index.total_rows(),
            pages = index.page_count(),
            page_size,
            "built page index"
        );

        Ok(SearchHandle::new(
            Arc::clone(&self.source),
            filter,
            order,
            index,
        ))
    }

    /// Resume a search from an encoded [`HandleSnapshot`]. The principal,
    /// structural filter and ordering must match the original search.
    ///
    /// # Errors
    /// - `SearchError::InvalidSnapshot` for a token that does not decode
    /// - `SearchError::OrderMismatch` / `SearchError::FilterMismatch` when the
    ///   search parameters differ from the snapshot's
    pub fn resume(
        &self,
        principal: &Principal,
        structural: Option<Expr>,
        ordering: &OrderingSpec,
        token: &str,
    ) -> SearchResult<SearchHandle<S>> {
        let snapshot = HandleSnapshot::decode(token)?;
        let order = self.effective_order(ordering)?;
        let filter = compose(principal, structural, self.kind.required_permission());
        SearchHandle::resume(Arc::clone(&self.source), filter, &order, snapshot)
    }
}
