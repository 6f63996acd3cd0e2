use crate::permission::Permission;
use crate::permission_set::PermissionSet;
use crate::scope::{ProjectId, TicketId};

/// The scope key of an object subject to access control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessTarget {
    Project(ProjectId),
    Ticket(TicketId),
}

/// Anything that belongs to a project or a ticket.
pub trait AccessControlled {
    fn access_target(&self) -> AccessTarget;
}

impl AccessControlled for AccessTarget {
    fn access_target(&self) -> AccessTarget {
        *self
    }
}

impl AccessControlled for ProjectId {
    fn access_target(&self) -> AccessTarget {
        AccessTarget::Project(*self)
    }
}

impl AccessControlled for TicketId {
    fn access_target(&self) -> AccessTarget {
        AccessTarget::Ticket(*self)
    }
}

/// Row-level access decision, evaluated per candidate object.
pub trait AccessPredicate: Send + Sync {
    fn is_permitted(
        &self,
        permissions: &PermissionSet,
        object: &dyn AccessControlled,
        required: Permission,
    ) -> bool;
}

/// Default predicate: scope implication as defined by [`PermissionSet::implies`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ImplicationPredicate;

impl AccessPredicate for ImplicationPredicate {
    fn is_permitted(
        &self,
        permissions: &PermissionSet,
        object: &dyn AccessControlled,
        required: Permission,
    ) -> bool {
        permissions.implies(object, required)
    }
}

/// Free-function form of the implication rule.
#[must_use]
pub fn is_permitted<O>(permissions: &PermissionSet, object: &O, required: Permission) -> bool
where
    O: AccessControlled + ?Sized,
{
    permissions.implies(object, required)
}
