//! Paginated search handle.
//!
//! A handle owns the precomputed [`PageIndex`] of one search and a current
//! page position. Every page fetch seeks straight to the page's boundary
//! key, so any page is served without touching the ones before it.
//!
//! A page is the key range `[boundary(k), boundary(k + 1))` of the
//! filtered set, capped at `page_size` rows. Without concurrent writes
//! that is exactly `page_size` rows (fewer on the last page). Rows deleted
//! after the handle was built make a page shorter. Rows inserted into a
//! page's range may push its last rows out of view until a new search is
//! built. A row never shows up on two pages.

use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::boundary::{PageBoundary, PageIndex};
use crate::compose::EffectiveFilter;
use crate::error::{SearchError, SearchResult};
use crate::key::{KeyRange, Seek};
use crate::order::OrderingSpec;
use crate::source::RowSource;

pub const SNAPSHOT_VERSION: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page_number: usize,
    pub page_count: usize,
    /// 0-based offset of `items[0]` in the filtered set
    pub first_offset: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.page_number == 1
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.page_number == self.page_count
    }
}

/// Stateful cursor over one search. Not shareable between concurrent
/// callers; navigation takes `&mut self`.
pub struct SearchHandle<S: RowSource> {
    source: Arc<S>,
    filter: EffectiveFilter,
    order: OrderingSpec,
    index: PageIndex,
    current: usize,
}

impl<S: RowSource> std::fmt::Debug for SearchHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHandle")
            .field("filter", &self.filter)
            .field("order", &self.order)
            .field("index", &self.index)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<S: RowSource> SearchHandle<S> {
    pub(crate) fn new(
        source: Arc<S>,
        filter: EffectiveFilter,
        order: OrderingSpec,
        index: PageIndex,
    ) -> Self {
        Self {
            source,
            filter,
            order,
            index,
            current: 0,
        }
    }

    /// Rebuild a handle from a snapshot without rescanning the source.
    ///
    /// `filter` and `order` must be the effective filter and ordering of the
    /// search that produced the snapshot.
    ///
    /// # Errors
    /// - `SearchError::OrderMismatch` if `order` differs from the snapshot's
    /// - `SearchError::FilterMismatch` if the filter (or the principal's
    ///   grants) changed since the snapshot was taken
    /// - `SearchError::InvalidSnapshot` for a structurally invalid snapshot
    pub fn resume(
        source: Arc<S>,
        filter: EffectiveFilter,
        order: &OrderingSpec,
        snapshot: HandleSnapshot,
    ) -> SearchResult<Self> {
        if snapshot.order != *order {
            return Err(SearchError::OrderMismatch);
        }
        if snapshot.filter_hash != filter.hash() {
            return Err(SearchError::FilterMismatch);
        }
        let index =
            PageIndex::from_parts(snapshot.boundaries, snapshot.page_size, snapshot.total_rows)?;
        if snapshot.index >= index.page_count() {
            return Err(SearchError::InvalidSnapshot("page index out of range"));
        }

        let mut handle = Self::new(source, filter, snapshot.order, index);
        handle.current = snapshot.index;
        Ok(handle)
    }

    /// Fetch the current page.
    ///
    /// # Errors
    /// Propagates row source failures unchanged.
    pub async fn page_current(&self) -> SearchResult<Page<S::Row>> {
        let boundary = self
            .index
            .get(self.current)
            .ok_or(SearchError::InvalidSnapshot("page index out of range"))?;
        let mut range = KeyRange::from_seek(Seek::boundary(&boundary.key));
        if let Some(next) = self.index.get(self.current + 1) {
            range = range.until(next.key.clone());
        }

        let items = self
            .source
            .fetch_rows(&self.filter, &self.order, &range, self.index.page_size())
            .await
            .inspect_err(|e| {
                warn!(page = boundary.page_number, error = %e, "page fetch failed");
            })?;

        trace!(
            page = boundary.page_number,
            pages = self.index.page_count(),
            items = items.len(),
            "served page"
        );
        Ok(Page {
            items,
            page_number: boundary.page_number,
            page_count: self.index.page_count(),
            first_offset: self.index.first_offset(self.current),
        })
    }

    /// Advance one page, staying put on the last page.
    ///
    /// # Errors
    /// Propagates row source failures unchanged.
    pub async fn page_next(&mut self) -> SearchResult<Page<S::Row>> {
        if self.current + 1 < self.index.page_count() {
            self.current += 1;
            trace!(page = self.page_number(), "page next");
        } else {
            debug!(page = self.page_number(), "page next clamped at last page");
        }
        self.page_current().await
    }

    /// Go back one page, staying put on the first page.
    ///
    /// # Errors
    /// Propagates row source failures unchanged.
    pub async fn page_previous(&mut self) -> SearchResult<Page<S::Row>> {
        if self.current > 0 {
            self.current -= 1;
            trace!(page = self.page_number(), "page previous");
        } else {
            debug!("page previous clamped at first page");
        }
        self.page_current().await
    }

    /// Jump to a 1-based page, clamped to `[1, page_count]`.
    ///
    /// # Errors
    /// Propagates row source failures unchanged.
    pub async fn page_jump(&mut self, page_number: usize) -> SearchResult<Page<S::Row>> {
        let target = page_number.clamp(1, self.index.page_count());
        if target != page_number {
            debug!(
                requested = page_number,
                page = target,
                "page jump clamped"
            );
        }
        self.current = target - 1;
        self.page_current().await
    }

    #[must_use]
    pub fn page_number(&self) -> usize {
        self.current + 1
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.index.page_count()
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.index.page_size()
    }

    #[must_use]
    pub fn boundaries(&self) -> &[PageBoundary] {
        self.index.boundaries()
    }

    /// Filtered rows seen when the handle was built.
    #[must_use]
    pub fn total_hint(&self) -> usize {
        self.index.total_rows()
    }

    #[must_use]
    pub fn order(&self) -> &OrderingSpec {
        &self.order
    }

    #[must_use]
    pub fn filter(&self) -> &EffectiveFilter {
        &self.filter
    }

    /// Capture the handle state for keeping across requests.
    #[must_use]
    pub fn snapshot(&self) -> HandleSnapshot {
        HandleSnapshot {
            boundaries: self.index.boundaries().to_vec(),
            index: self.current,
            page_size: self.index.page_size(),
            total_rows: self.index.total_rows(),
            order: self.order.clone(),
            filter_hash: self.filter.hash(),
        }
    }
}

/// Serializable handle state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleSnapshot {
    pub boundaries: Vec<PageBoundary>,
    pub index: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub order: OrderingSpec,
    pub filter_hash: String,
}

impl HandleSnapshot {
    /// Encode to a base64url token (JSON payload, versioned).
    ///
    /// # Errors
    /// Returns a JSON serialization error if encoding fails.
    pub fn encode(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Wire<'a> {
            v: u8,
            #[serde(flatten)]
            snapshot: &'a HandleSnapshot,
        }
        let w = Wire {
            v: SNAPSHOT_VERSION,
            snapshot: self,
        };
        serde_json::to_vec(&w).map(|x| base64_url::encode(&x))
    }

    /// Decode a token produced by [`HandleSnapshot::encode`].
    ///
    /// # Errors
    /// Returns `SearchError::InvalidSnapshot` for bad base64, bad JSON or an
    /// unsupported version.
    pub fn decode(token: &str) -> SearchResult<Self> {
        #[derive(Deserialize)]
        struct Wire {
            v: u8,
            #[serde(flatten)]
            snapshot: HandleSnapshot,
        }

        let bytes = base64_url::decode(token)
            .map_err(|_| SearchError::InvalidSnapshot("invalid base64url encoding"))?;
        let w: Wire = serde_json::from_slice(&bytes)
            .map_err(|_| SearchError::InvalidSnapshot("malformed JSON"))?;
        if w.v != SNAPSHOT_VERSION {
            return Err(SearchError::InvalidSnapshot("unsupported version"));
        }
        Ok(w.snapshot)
    }
}

// base64url helpers (no padding)
mod base64_url {
    use super::Engine;

    pub fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(s)
    }
}
