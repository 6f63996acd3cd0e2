use tracker_security::DecodeError;

/// Malformed search input, rejected before any row is read.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate order column: {0}")]
    DuplicateColumn(String),

    #[error("order column name must not be empty")]
    EmptyColumn,

    #[error("invalid page size: {0}")]
    PageSize(usize),

    #[error("too many order fields: {count} (max {max})")]
    TooManyOrderFields { count: usize, max: usize },

    #[error("invalid order token: {0}")]
    InvalidToken(String),

    #[error("no tiebreaker configured; ordering is not total")]
    MissingTiebreaker,

    #[error("keyset paging needs a non-empty ordering")]
    EmptyOrder,
}

/// Unified error type for search operations.
///
/// `NotFound` and `Fetch` come from the row source and are passed through
/// unchanged; the engine never turns a failed read into an empty page.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("type mismatch on {field}: expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("ORDER_MISMATCH")]
    OrderMismatch,

    #[error("FILTER_MISMATCH")]
    FilterMismatch,

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(&'static str),

    #[error("row fetch failed: {0}")]
    Fetch(String),
}

pub type SearchResult<T> = Result<T, SearchError>;
