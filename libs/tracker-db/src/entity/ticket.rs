use sea_orm::entity::prelude::*;
use tracker_search::{KeyValue, SearchRow};
use tracker_security::{AccessControlled, AccessTarget, ProjectId, TicketId};

use crate::access::AccessScopedEntity;

#[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub seq: i64,
    pub title: String,
    pub status: String,
    pub reporter: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub fn ticket_id(&self) -> TicketId {
        TicketId::new(ProjectId(self.project_id), self.seq)
    }
}

impl AccessControlled for Model {
    fn access_target(&self) -> AccessTarget {
        AccessTarget::Ticket(self.ticket_id())
    }
}

impl SearchRow for Model {
    fn field(&self, name: &str) -> Option<KeyValue> {
        match name.to_ascii_lowercase().as_str() {
            "project_id" => Some(KeyValue::I64(self.project_id)),
            "seq" => Some(KeyValue::I64(self.seq)),
            "title" => Some(KeyValue::String(self.title.clone())),
            "status" => Some(KeyValue::String(self.status.clone())),
            "reporter" => Some(KeyValue::Uuid(self.reporter)),
            "created_at" => Some(KeyValue::DateTime(self.created_at)),
            _ => None,
        }
    }
}

impl AccessScopedEntity for Entity {
    fn project_col() -> Self::Column {
        Column::ProjectId
    }

    fn ticket_seq_col() -> Option<Self::Column> {
        Some(Column::Seq)
    }
}
