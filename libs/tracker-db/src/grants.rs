//! Grant store: principals and their scoped permissions.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{debug, info};
use tracker_security::{
    Permission, PermissionSet, Principal, Scope, ScopeKind, ScopedPermission,
};
use uuid::Uuid;

use crate::entity::{grant, principal};
use crate::error::{DbError, DbResult};

fn decode(row: &grant::Model) -> DbResult<ScopedPermission> {
    let kind = ScopeKind::try_from(row.scope_kind)?;
    let scope = Scope::from_parts(kind, row.project_id, row.ticket_seq)?;
    let permission = Permission::try_from(row.permission)?;
    Ok(ScopedPermission::new(scope, permission))
}

/// Filter matching the stored row of `grant` for `principal_id`.
fn matching(principal_id: Uuid, sp: ScopedPermission) -> sea_orm::Condition {
    let scope = sp.scope();
    let mut cond = sea_orm::Condition::all()
        .add(grant::Column::PrincipalId.eq(principal_id))
        .add(grant::Column::ScopeKind.eq(i32::from(scope.kind())))
        .add(grant::Column::Permission.eq(i32::from(sp.permission())));
    cond = match scope.project() {
        Some(p) => cond.add(grant::Column::ProjectId.eq(p.0)),
        None => cond.add(grant::Column::ProjectId.is_null()),
    };
    match scope.ticket_seq() {
        Some(seq) => cond.add(grant::Column::TicketSeq.eq(seq)),
        None => cond.add(grant::Column::TicketSeq.is_null()),
    }
}

#[derive(Clone)]
pub struct GrantRepository {
    conn: DatabaseConnection,
}

impl GrantRepository {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// # Errors
    /// Returns `DbError::Db` on database failure.
    pub async fn create_principal(&self, id: Uuid, name: &str) -> DbResult<()> {
        principal::ActiveModel {
            id: Set(id),
            name: Set(name.to_owned()),
        }
        .insert(&self.conn)
        .await?;
        info!(principal = %id, name, "created principal");
        Ok(())
    }

    async fn ensure_principal(&self, id: Uuid) -> DbResult<()> {
        if principal::Entity::find_by_id(id).count(&self.conn).await? == 0 {
            return Err(DbError::NotFound(format!("principal {id}")));
        }
        Ok(())
    }

    /// Every grant of `principal_id`.
    ///
    /// # Errors
    /// - `DbError::NotFound` if the principal does not exist
    /// - `DbError::Decode` if a stored grant has an unknown permission or
    ///   scope code
    pub async fn load(&self, principal_id: Uuid) -> DbResult<PermissionSet> {
        self.ensure_principal(principal_id).await?;
        let rows = grant::Entity::find()
            .filter(grant::Column::PrincipalId.eq(principal_id))
            .all(&self.conn)
            .await?;
        let set = rows.iter().map(decode).collect::<DbResult<PermissionSet>>()?;
        debug!(principal = %principal_id, grants = set.len(), "loaded permission set");
        Ok(set)
    }

    /// # Errors
    /// Same as [`GrantRepository::load`].
    pub async fn load_principal(&self, principal_id: Uuid) -> DbResult<Principal> {
        Ok(Principal::new(principal_id, self.load(principal_id).await?))
    }

    /// Persist a grant. Returns `false` if it was already present.
    ///
    /// # Errors
    /// `DbError::NotFound` for an unknown principal, `DbError::Db` otherwise.
    pub async fn grant(&self, principal_id: Uuid, sp: ScopedPermission) -> DbResult<bool> {
        self.ensure_principal(principal_id).await?;
        let existing = grant::Entity::find()
            .filter(matching(principal_id, sp))
            .count(&self.conn)
            .await?;
        if existing > 0 {
            return Ok(false);
        }

        let scope = sp.scope();
        grant::ActiveModel {
            id: Set(Uuid::new_v4()),
            principal_id: Set(principal_id),
            scope_kind: Set(i32::from(scope.kind())),
            project_id: Set(scope.project().map(|p| p.0)),
            ticket_seq: Set(scope.ticket_seq()),
            permission: Set(i32::from(sp.permission())),
        }
        .insert(&self.conn)
        .await?;
        info!(principal = %principal_id, grant = %sp, "granted");
        Ok(true)
    }

    /// Remove a grant. Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    /// Returns `DbError::Db` on database failure.
    pub async fn revoke(&self, principal_id: Uuid, sp: ScopedPermission) -> DbResult<bool> {
        let res = grant::Entity::delete_many()
            .filter(matching(principal_id, sp))
            .exec(&self.conn)
            .await?;
        if res.rows_affected > 0 {
            info!(principal = %principal_id, grant = %sp, "revoked");
        }
        Ok(res.rows_affected > 0)
    }
}
