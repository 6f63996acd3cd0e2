use thiserror::Error;

/// Failure to map persisted or wire data back onto the permission model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown permission code: {0}")]
    PermissionCode(i64),

    #[error("unknown permission name: {0}")]
    PermissionName(String),

    #[error("unknown scope kind code: {0}")]
    ScopeKindCode(i64),

    #[error("malformed scope: {0}")]
    Scope(String),

    #[error("malformed scoped permission: {0}")]
    ScopedPermission(String),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("empty permission set blob")]
    Empty,

    #[error("unsupported permission set version: {0}")]
    UnsupportedVersion(u8),

    #[error("permission set serialization failed: {0}")]
    Postcard(#[from] postcard::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
