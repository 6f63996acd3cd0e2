use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::permission::Permission;

/// Project identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ticket identifier: the owning project plus a per-project sequence number.
///
/// The project is always carried so that project-wide grants can be checked
/// against a ticket without looking the ticket up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TicketId {
    pub project: ProjectId,
    pub seq: i64,
}

impl TicketId {
    #[must_use]
    pub const fn new(project: ProjectId, seq: i64) -> Self {
        Self { project, seq }
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project, self.seq)
    }
}

/// Discriminant of [`Scope`], persisted as a small integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ScopeKind {
    Global = 0,
    Project = 1,
    Ticket = 2,
}

impl ScopeKind {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// # Errors
    /// Returns `DecodeError::ScopeKindCode` for unknown codes.
    pub fn from_code(code: u8) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(ScopeKind::Global),
            1 => Ok(ScopeKind::Project),
            2 => Ok(ScopeKind::Ticket),
            other => Err(DecodeError::ScopeKindCode(i64::from(other))),
        }
    }
}

impl TryFrom<i32> for ScopeKind {
    type Error = DecodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        let small = u8::try_from(code).map_err(|_| DecodeError::ScopeKindCode(i64::from(code)))?;
        Self::from_code(small)
    }
}

impl From<ScopeKind> for i32 {
    fn from(k: ScopeKind) -> Self {
        i32::from(k.code())
    }
}

/// Granularity a grant applies at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    Global,
    Project(ProjectId),
    Ticket(TicketId),
}

impl Scope {
    #[must_use]
    pub const fn kind(&self) -> ScopeKind {
        match self {
            Scope::Global => ScopeKind::Global,
            Scope::Project(_) => ScopeKind::Project,
            Scope::Ticket(_) => ScopeKind::Ticket,
        }
    }

    /// Project the scope belongs to, if any.
    #[must_use]
    pub const fn project(&self) -> Option<ProjectId> {
        match self {
            Scope::Global => None,
            Scope::Project(p) => Some(*p),
            Scope::Ticket(t) => Some(t.project),
        }
    }

    /// Rebuild a scope from its persisted columns.
    ///
    /// # Errors
    /// Returns `DecodeError` when the kind is unknown or a required column is missing.
    pub fn from_parts(
        kind: ScopeKind,
        project: Option<i64>,
        ticket_seq: Option<i64>,
    ) -> Result<Self, DecodeError> {
        match (kind, project, ticket_seq) {
            (ScopeKind::Global, _, _) => Ok(Scope::Global),
            (ScopeKind::Project, Some(p), _) => Ok(Scope::Project(ProjectId(p))),
            (ScopeKind::Ticket, Some(p), Some(seq)) => {
                Ok(Scope::Ticket(TicketId::new(ProjectId(p), seq)))
            }
            (kind, project, seq) => Err(DecodeError::Scope(format!(
                "{kind:?} scope with project={project:?} ticket_seq={seq:?}"
            ))),
        }
    }

    /// Ticket sequence of a ticket scope.
    #[must_use]
    pub const fn ticket_seq(&self) -> Option<i64> {
        match self {
            Scope::Ticket(t) => Some(t.seq),
            Scope::Global | Scope::Project(_) => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Project(p) => write!(f, "project:{p}"),
            Scope::Ticket(t) => write!(f, "ticket:{t}"),
        }
    }
}

impl FromStr for Scope {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DecodeError::Scope(s.to_owned());
        if s == "global" {
            return Ok(Scope::Global);
        }
        if let Some(rest) = s.strip_prefix("project:") {
            let p = rest.parse::<i64>().map_err(|_| malformed())?;
            return Ok(Scope::Project(ProjectId(p)));
        }
        if let Some(rest) = s.strip_prefix("ticket:") {
            // separator is the first '-' after the project's optional sign
            let sep = rest.get(1..).and_then(|r| r.find('-')).ok_or_else(malformed)? + 1;
            let (p, seq) = rest.split_at(sep);
            let seq = seq.strip_prefix('-').ok_or_else(malformed)?;
            let p = p.parse::<i64>().map_err(|_| malformed())?;
            let seq = seq.parse::<i64>().map_err(|_| malformed())?;
            return Ok(Scope::Ticket(TicketId::new(ProjectId(p), seq)));
        }
        Err(malformed())
    }
}

/// A permission granted at a particular scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopedPermission {
    scope: Scope,
    permission: Permission,
}

impl ScopedPermission {
    #[must_use]
    pub const fn new(scope: Scope, permission: Permission) -> Self {
        Self { scope, permission }
    }

    #[must_use]
    pub const fn global(permission: Permission) -> Self {
        Self::new(Scope::Global, permission)
    }

    #[must_use]
    pub const fn project(project: ProjectId, permission: Permission) -> Self {
        Self::new(Scope::Project(project), permission)
    }

    #[must_use]
    pub const fn ticket(ticket: TicketId, permission: Permission) -> Self {
        Self::new(Scope::Ticket(ticket), permission)
    }

    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    #[must_use]
    pub const fn permission(&self) -> Permission {
        self.permission
    }
}

impl fmt::Display for ScopedPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.permission)
    }
}

impl FromStr for ScopedPermission {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, permission) = s
            .rsplit_once('/')
            .ok_or_else(|| DecodeError::ScopedPermission(s.to_owned()))?;
        Ok(Self::new(scope.parse()?, permission.parse()?))
    }
}

impl serde::Serialize for ScopedPermission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ScopedPermission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
