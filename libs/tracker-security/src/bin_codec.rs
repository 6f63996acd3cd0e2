//! Versioned binary form of a [`PermissionSet`], for session storage.
//!
//! Layout: one version byte followed by a `postcard` payload of
//! `(scope_kind, project, ticket_seq, permission)` tuples. Codes are the
//! same small integers used for persisted grants, so a blob written by a
//! newer build with unknown permissions fails with [`DecodeError`] instead
//! of silently dropping grants.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, DecodeError};
use crate::permission::Permission;
use crate::permission_set::PermissionSet;
use crate::scope::{Scope, ScopeKind, ScopedPermission};

pub const PERMSET_BIN_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct WireGrant {
    kind: u8,
    project: Option<i64>,
    ticket_seq: Option<i64>,
    permission: u8,
}

impl From<ScopedPermission> for WireGrant {
    fn from(sp: ScopedPermission) -> Self {
        let scope = sp.scope();
        Self {
            kind: scope.kind().code(),
            project: scope.project().map(|p| p.0),
            ticket_seq: scope.ticket_seq(),
            permission: sp.permission().code(),
        }
    }
}

impl TryFrom<WireGrant> for ScopedPermission {
    type Error = DecodeError;

    fn try_from(w: WireGrant) -> Result<Self, Self::Error> {
        let kind = ScopeKind::from_code(w.kind)?;
        let scope = Scope::from_parts(kind, w.project, w.ticket_seq)?;
        Ok(ScopedPermission::new(scope, Permission::from_code(w.permission)?))
    }
}

/// Encode a permission set into a versioned binary blob.
///
/// # Errors
/// Returns `CodecError::Postcard` if serialization fails.
pub fn encode_permission_set(set: &PermissionSet) -> Result<Vec<u8>, CodecError> {
    let grants: Vec<WireGrant> = set.iter().map(WireGrant::from).collect();
    let payload = postcard::to_allocvec(&grants)?;

    let mut buf = Vec::with_capacity(payload.len() + 1);
    buf.push(PERMSET_BIN_VERSION);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a blob produced by [`encode_permission_set`].
///
/// # Errors
/// - `CodecError::Empty` for an empty slice
/// - `CodecError::UnsupportedVersion` for an unknown leading version byte
/// - `CodecError::Postcard` for a corrupt payload
/// - `CodecError::Decode` for out-of-range scope or permission codes
pub fn decode_permission_set(bytes: &[u8]) -> Result<PermissionSet, CodecError> {
    let (&version, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
    if version != PERMSET_BIN_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let grants: Vec<WireGrant> = postcard::from_bytes(payload)?;
    let mut builder = PermissionSet::builder();
    for grant in grants {
        builder.insert(ScopedPermission::try_from(grant)?);
    }
    Ok(builder.build())
}
