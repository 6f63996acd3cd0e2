//! Persisted scoped permissions, one row per grant.
//!
//! `scope_kind` and `permission` hold the stable codes of
//! [`tracker_security::ScopeKind`] and [`tracker_security::Permission`];
//! `project_id`/`ticket_seq` are set as the scope kind requires.

use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "permission_grants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub principal_id: Uuid,
    pub scope_kind: i32,
    pub project_id: Option<i64>,
    pub ticket_seq: Option<i64>,
    pub permission: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
