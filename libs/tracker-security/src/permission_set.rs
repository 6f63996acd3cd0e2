use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use crate::access::{AccessControlled, AccessTarget};
use crate::permission::Permission;
use crate::scope::{ProjectId, Scope, ScopedPermission, TicketId};

static EMPTY: LazyLock<PermissionSet> = LazyLock::new(PermissionSet::default);

/// Immutable set of scoped permissions.
///
/// Grants are partitioned by scope kind so that every implication check is a
/// constant number of hash lookups. Use [`PermissionSet::to_builder`],
/// [`PermissionSet::grant`] or [`PermissionSet::revoke`] to derive new sets;
/// an existing set is never modified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    global: HashSet<Permission>,
    project: HashSet<(ProjectId, Permission)>,
    ticket: HashSet<(TicketId, Permission)>,
}

impl PermissionSet {
    /// The empty set. Implies nothing.
    #[must_use]
    pub fn empty() -> &'static PermissionSet {
        &EMPTY
    }

    #[must_use]
    pub fn builder() -> PermissionSetBuilder {
        PermissionSetBuilder::default()
    }

    /// Mutable copy for incremental grant/revoke workflows.
    #[must_use]
    pub fn to_builder(&self) -> PermissionSetBuilder {
        PermissionSetBuilder { set: self.clone() }
    }

    /// New set with `sp` added.
    #[must_use]
    pub fn grant(&self, sp: ScopedPermission) -> PermissionSet {
        self.to_builder().add(sp).build()
    }

    /// New set with `sp` removed. Removing an absent grant is a no-op.
    #[must_use]
    pub fn revoke(&self, sp: ScopedPermission) -> PermissionSet {
        let mut builder = self.to_builder();
        builder.remove(sp);
        builder.build()
    }

    /// Whether `permission` holds on `object`.
    ///
    /// True iff the set holds `permission` globally, on the object's project,
    /// or (for tickets) on the ticket itself.
    #[must_use]
    pub fn implies<O>(&self, object: &O, permission: Permission) -> bool
    where
        O: AccessControlled + ?Sized,
    {
        if self.global.contains(&permission) {
            return true;
        }
        match object.access_target() {
            AccessTarget::Project(p) => self.project.contains(&(p, permission)),
            AccessTarget::Ticket(t) => {
                self.project.contains(&(t.project, permission))
                    || self.ticket.contains(&(t, permission))
            }
        }
    }

    /// Whether the set holds `sp` or a grant at a scope that covers it.
    #[must_use]
    pub fn implies_scoped(&self, sp: ScopedPermission) -> bool {
        let permission = sp.permission();
        if self.global.contains(&permission) {
            return true;
        }
        match sp.scope() {
            Scope::Global => false,
            Scope::Project(p) => self.project.contains(&(p, permission)),
            Scope::Ticket(t) => {
                self.project.contains(&(t.project, permission))
                    || self.ticket.contains(&(t, permission))
            }
        }
    }

    /// Exact membership, without implication.
    #[must_use]
    pub fn contains(&self, sp: ScopedPermission) -> bool {
        match sp.scope() {
            Scope::Global => self.global.contains(&sp.permission()),
            Scope::Project(p) => self.project.contains(&(p, sp.permission())),
            Scope::Ticket(t) => self.ticket.contains(&(t, sp.permission())),
        }
    }

    #[must_use]
    pub fn has_global(&self, permission: Permission) -> bool {
        self.global.contains(&permission)
    }

    /// Projects on which `permission` is granted project-wide, sorted.
    #[must_use]
    pub fn projects_with(&self, permission: Permission) -> Vec<ProjectId> {
        let mut out: Vec<ProjectId> = self
            .project
            .iter()
            .filter(|(_, p)| *p == permission)
            .map(|(id, _)| *id)
            .collect();
        out.sort_unstable();
        out
    }

    /// Tickets on which `permission` is granted individually, sorted.
    #[must_use]
    pub fn tickets_with(&self, permission: Permission) -> Vec<TicketId> {
        let mut out: Vec<TicketId> = self
            .ticket
            .iter()
            .filter(|(_, p)| *p == permission)
            .map(|(id, _)| *id)
            .collect();
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.global.len() + self.project.len() + self.ticket.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.project.is_empty() && self.ticket.is_empty()
    }

    /// Every grant in canonical order: global, then project, then ticket
    /// scopes, each sorted.
    pub fn iter(&self) -> impl Iterator<Item = ScopedPermission> + '_ {
        let mut global: Vec<_> = self.global.iter().copied().collect();
        global.sort_unstable();
        let mut project: Vec<_> = self.project.iter().copied().collect();
        project.sort_unstable();
        let mut ticket: Vec<_> = self.ticket.iter().copied().collect();
        ticket.sort_unstable();

        global
            .into_iter()
            .map(ScopedPermission::global)
            .chain(
                project
                    .into_iter()
                    .map(|(p, perm)| ScopedPermission::project(p, perm)),
            )
            .chain(
                ticket
                    .into_iter()
                    .map(|(t, perm)| ScopedPermission::ticket(t, perm)),
            )
    }
}

impl Hash for PermissionSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for sp in self.iter() {
            sp.hash(state);
        }
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, sp) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{sp}")?;
        }
        f.write_str("}")
    }
}

impl FromIterator<ScopedPermission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = ScopedPermission>>(iter: I) -> Self {
        let mut builder = PermissionSet::builder();
        builder.extend(iter);
        builder.build()
    }
}

impl serde::Serialize for PermissionSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> serde::Deserialize<'de> for PermissionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let grants = Vec::<ScopedPermission>::deserialize(deserializer)?;
        Ok(grants.into_iter().collect())
    }
}

/// Mutable accumulator for a [`PermissionSet`]. Adding a grant twice is the
/// same as adding it once.
#[derive(Clone, Debug, Default)]
pub struct PermissionSetBuilder {
    set: PermissionSet,
}

impl PermissionSetBuilder {
    #[must_use]
    pub fn add(mut self, sp: ScopedPermission) -> Self {
        self.insert(sp);
        self
    }

    /// Returns `true` if the grant was not present before.
    pub fn insert(&mut self, sp: ScopedPermission) -> bool {
        let permission = sp.permission();
        match sp.scope() {
            Scope::Global => self.set.global.insert(permission),
            Scope::Project(p) => self.set.project.insert((p, permission)),
            Scope::Ticket(t) => self.set.ticket.insert((t, permission)),
        }
    }

    /// Returns `true` if the grant was present.
    pub fn remove(&mut self, sp: ScopedPermission) -> bool {
        let permission = sp.permission();
        match sp.scope() {
            Scope::Global => self.set.global.remove(&permission),
            Scope::Project(p) => self.set.project.remove(&(p, permission)),
            Scope::Ticket(t) => self.set.ticket.remove(&(t, permission)),
        }
    }

    #[must_use]
    pub fn build(self) -> PermissionSet {
        self.set
    }
}

impl Extend<ScopedPermission> for PermissionSetBuilder {
    fn extend<I: IntoIterator<Item = ScopedPermission>>(&mut self, iter: I) {
        for sp in iter {
            self.insert(sp);
        }
    }
}
