use uuid::Uuid;

use crate::permission_set::PermissionSet;

/// The authenticated actor on whose behalf searches and checks run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Principal {
    id: Uuid,
    permissions: PermissionSet,
}

impl Principal {
    #[must_use]
    pub fn new(id: Uuid, permissions: PermissionSet) -> Self {
        Self { id, permissions }
    }

    /// Nil id, no permissions.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Uuid::nil(), PermissionSet::default())
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Same principal with a replaced permission set.
    #[must_use]
    pub fn with_permissions(&self, permissions: PermissionSet) -> Self {
        Self::new(self.id, permissions)
    }
}
