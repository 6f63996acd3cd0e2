//! Permission-filtered query composition.
//!
//! Every search runs against an [`EffectiveFilter`]: the caller's structural
//! filter AND an [`AccessFilter`] built from the principal's permissions.
//! The access part is fixed at composition time and has no setter, so no
//! caller-supplied filter can widen what a principal sees.

use sha2::{Digest, Sha256};
use tracker_security::{
    AccessControlled, AccessPredicate, Permission, PermissionSet, Principal, ProjectId, TicketId,
};

use crate::ast::Expr;

/// Search type; fixes the permission every returned row must carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchKind {
    #[default]
    Tickets,
    TicketsForUpdate,
}

impl SearchKind {
    #[must_use]
    pub fn required_permission(self) -> Permission {
        match self {
            SearchKind::Tickets => Permission::TicketRead,
            SearchKind::TicketsForUpdate => Permission::TicketWrite,
        }
    }
}

/// Row-level access predicate of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessFilter {
    permissions: PermissionSet,
    required: Permission,
}

impl AccessFilter {
    #[must_use]
    pub fn new(permissions: PermissionSet, required: Permission) -> Self {
        Self {
            permissions,
            required,
        }
    }

    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    #[must_use]
    pub fn required(&self) -> Permission {
        self.required
    }

    /// A global grant of the required permission; no row restriction.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.permissions.has_global(self.required)
    }

    /// Projects on which the required permission is granted project-wide.
    #[must_use]
    pub fn granted_projects(&self) -> Vec<ProjectId> {
        self.permissions.projects_with(self.required)
    }

    /// Tickets on which the required permission is granted individually.
    #[must_use]
    pub fn granted_tickets(&self) -> Vec<TicketId> {
        self.permissions.tickets_with(self.required)
    }

    /// No grant of the required permission at any scope.
    #[must_use]
    pub fn denies_all(&self) -> bool {
        !self.is_unrestricted()
            && self.granted_projects().is_empty()
            && self.granted_tickets().is_empty()
    }

    #[must_use]
    pub fn admits<O>(&self, predicate: &dyn AccessPredicate, object: &O) -> bool
    where
        O: AccessControlled,
    {
        predicate.is_permitted(&self.permissions, object, self.required)
    }
}

/// Structural filter plus access predicate, as handed to a row source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveFilter {
    structural: Option<Expr>,
    access: AccessFilter,
}

impl EffectiveFilter {
    #[must_use]
    pub fn structural(&self) -> Option<&Expr> {
        self.structural.as_ref()
    }

    #[must_use]
    pub fn access(&self) -> &AccessFilter {
        &self.access
    }

    /// Short stable hash of the whole filter, used to bind a handle snapshot
    /// to the search that produced it. A change in grants changes the hash.
    #[must_use]
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        match &self.structural {
            Some(expr) => hasher.update(expr.to_string().as_bytes()),
            None => hasher.update(b"*"),
        }
        hasher.update(b"|");
        hasher.update(self.access.required.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.access.permissions.to_string().as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }
}

/// Combine a structural filter with the principal's access predicate.
#[must_use]
pub fn compose(principal: &Principal, structural: Option<Expr>, required: Permission) -> EffectiveFilter {
    EffectiveFilter {
        structural,
        access: AccessFilter::new(principal.permissions().clone(), required),
    }
}
