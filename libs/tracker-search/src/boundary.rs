use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult, ValidationError};
use crate::key::CompositeKey;

/// Key of the first row of a page, with the 1-based page it starts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageBoundary {
    pub key: CompositeKey,
    pub page_number: usize,
}

impl PageBoundary {
    /// The synthetic "before the first row" boundary of page 1.
    #[must_use]
    pub fn first() -> Self {
        Self {
            key: CompositeKey::empty(),
            page_number: 1,
        }
    }
}

/// Precomputed page boundaries over one filtered, ordered result set.
///
/// Entry 0 is always [`PageBoundary::first`]; entry `k` holds the key of
/// the row at 0-based rank `k * page_size`. The list is immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageIndex {
    boundaries: Vec<PageBoundary>,
    page_size: usize,
    total_rows: usize,
}

impl PageIndex {
    /// Build from the ordered keys of the filtered set in a single pass.
    ///
    /// # Errors
    /// Returns `ValidationError::PageSize` when `page_size` is zero.
    pub fn build<I>(keys: I, page_size: usize) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = CompositeKey>,
    {
        if page_size == 0 {
            return Err(ValidationError::PageSize(page_size));
        }

        let mut boundaries = vec![PageBoundary::first()];
        let mut total_rows = 0_usize;
        let mut on_page = 0_usize;
        for key in keys {
            if on_page == page_size {
                let page_number = boundaries.len() + 1;
                boundaries.push(PageBoundary { key, page_number });
                on_page = 0;
            }
            on_page += 1;
            total_rows += 1;
        }

        Ok(Self {
            boundaries,
            page_size,
            total_rows,
        })
    }

    /// Rebuild from stored parts, checking the structural invariants.
    ///
    /// # Errors
    /// Returns `SearchError::InvalidSnapshot` when the parts could not have
    /// come from [`PageIndex::build`].
    pub fn from_parts(
        boundaries: Vec<PageBoundary>,
        page_size: usize,
        total_rows: usize,
    ) -> SearchResult<Self> {
        if page_size == 0 {
            return Err(SearchError::InvalidSnapshot("page size is zero"));
        }
        if boundaries.first() != Some(&PageBoundary::first()) {
            return Err(SearchError::InvalidSnapshot("first boundary is not the start"));
        }
        let sequential = boundaries
            .iter()
            .enumerate()
            .all(|(i, b)| b.page_number == i + 1 && (i == 0 || !b.key.is_empty()));
        if !sequential {
            return Err(SearchError::InvalidSnapshot("boundaries out of sequence"));
        }
        let max_rows = boundaries.len().saturating_mul(page_size);
        let min_rows = (boundaries.len() - 1).saturating_mul(page_size);
        if total_rows > max_rows || (boundaries.len() > 1 && total_rows <= min_rows) {
            return Err(SearchError::InvalidSnapshot("row count does not match pages"));
        }
        Ok(Self {
            boundaries,
            page_size,
            total_rows,
        })
    }

    /// Number of pages; at least 1, the empty result has one empty page.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.boundaries.len()
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    #[must_use]
    pub fn boundaries(&self) -> &[PageBoundary] {
        &self.boundaries
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PageBoundary> {
        self.boundaries.get(index)
    }

    /// 0-based offset of the first row on the page at `index`.
    #[must_use]
    pub fn first_offset(&self, index: usize) -> usize {
        index.saturating_mul(self.page_size)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::key::KeyValue;

    fn keys(n: i64) -> impl Iterator<Item = CompositeKey> {
        (1..=n).map(|i| CompositeKey(vec![KeyValue::I64(i)]))
    }

    fn first_ids(index: &PageIndex) -> Vec<i64> {
        index
            .boundaries()
            .iter()
            .skip(1)
            .map(|b| match b.key.values() {
                [KeyValue::I64(i)] => *i,
                other => panic!("unexpected key {other:?}"),
            })
            .collect()
    }

    #[test]
    fn page_count_is_ceiling_of_rows_over_size() {
        for n in 1..=60_i64 {
            for p in 1..=12_usize {
                let index = PageIndex::build(keys(n), p).unwrap();
                let n = usize::try_from(n).unwrap();
                assert_eq!(index.page_count(), n.div_ceil(p), "n={n} p={p}");
                assert_eq!(index.total_rows(), n);
            }
        }
    }

    #[test]
    fn boundary_keys_are_every_pth_row() {
        let index = PageIndex::build(keys(101), 30).unwrap();
        assert_eq!(first_ids(&index), vec![31, 61, 91]);
        assert_eq!(index.first_offset(3), 90);
        let pages: Vec<usize> = index.boundaries().iter().map(|b| b.page_number).collect();
        assert_eq!(pages, vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_set_has_only_the_synthetic_boundary() {
        let index = PageIndex::build(std::iter::empty(), 10).unwrap();
        assert_eq!(index.page_count(), 1);
        assert_eq!(index.boundaries(), &[PageBoundary::first()]);
        assert_eq!(index.total_rows(), 0);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert_eq!(
            PageIndex::build(keys(3), 0).unwrap_err(),
            ValidationError::PageSize(0)
        );
    }

    #[test]
    fn from_parts_accepts_built_index_and_rejects_tampering() {
        let built = PageIndex::build(keys(25), 10).unwrap();
        let rebuilt =
            PageIndex::from_parts(built.boundaries().to_vec(), 10, built.total_rows()).unwrap();
        assert_eq!(rebuilt, built);

        let mut shuffled = built.boundaries().to_vec();
        shuffled.swap(1, 2);
        assert!(PageIndex::from_parts(shuffled, 10, 25).is_err());
        assert!(PageIndex::from_parts(built.boundaries().to_vec(), 10, 99).is_err());
        assert!(PageIndex::from_parts(Vec::new(), 10, 0).is_err());
    }
}
