#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use tracker_search::{
    KeyValue, MemoryRowSource, Page, SearchConfig, SearchEngine, SearchRow, SortDir,
};
use tracker_security::{
    AccessControlled, AccessTarget, Permission, PermissionSet, Principal, ProjectId,
    ScopedPermission, TicketId,
};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub status: String,
    pub reporter: Uuid,
}

impl AccessControlled for Ticket {
    fn access_target(&self) -> AccessTarget {
        AccessTarget::Ticket(self.id)
    }
}

impl SearchRow for Ticket {
    fn field(&self, name: &str) -> Option<KeyValue> {
        match name.to_ascii_lowercase().as_str() {
            "project_id" => Some(KeyValue::I64(self.id.project.0)),
            "seq" => Some(KeyValue::I64(self.id.seq)),
            "title" => Some(KeyValue::String(self.title.clone())),
            "status" => Some(KeyValue::String(self.status.clone())),
            "reporter" => Some(KeyValue::Uuid(self.reporter)),
            _ => None,
        }
    }
}

pub const PROJECT: ProjectId = ProjectId(1);

pub fn ticket(project: ProjectId, seq: i64) -> Ticket {
    Ticket {
        id: TicketId::new(project, seq),
        title: format!("ticket {seq}"),
        status: if seq % 2 == 0 { "open" } else { "closed" }.to_owned(),
        reporter: Uuid::nil(),
    }
}

/// Tickets `1..=n` in one project.
pub fn tickets(project: ProjectId, n: i64) -> Vec<Ticket> {
    (1..=n).map(|seq| ticket(project, seq)).collect()
}

pub fn source(rows: Vec<Ticket>) -> Arc<MemoryRowSource<Ticket>> {
    Arc::new(MemoryRowSource::new(rows))
}

pub fn engine(source: Arc<MemoryRowSource<Ticket>>) -> SearchEngine<MemoryRowSource<Ticket>> {
    SearchEngine::new(source, SearchConfig::default())
        .with_tiebreaker("project_id", SortDir::Asc)
        .with_tiebreaker("seq", SortDir::Asc)
}

pub fn principal(grants: impl IntoIterator<Item = ScopedPermission>) -> Principal {
    Principal::new(Uuid::new_v4(), grants.into_iter().collect::<PermissionSet>())
}

/// Reads every ticket.
pub fn reader() -> Principal {
    principal([ScopedPermission::global(Permission::TicketRead)])
}

pub fn seqs(page: &Page<Ticket>) -> Vec<i64> {
    page.items.iter().map(|t| t.id.seq).collect()
}
