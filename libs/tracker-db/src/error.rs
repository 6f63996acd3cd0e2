use sea_orm::DbErr;
use tracker_search::SearchError;
use tracker_security::DecodeError;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("stored grant is malformed: {0}")]
    Decode(#[from] DecodeError),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for SearchError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Db(db) => SearchError::Fetch(db.to_string()),
            DbError::Decode(d) => SearchError::Decode(d),
            DbError::NotFound(what) => SearchError::NotFound(what),
        }
    }
}
