#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::DateTime;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use tracker_db::entity::ticket::{ActiveModel, Entity as Tickets, Model as TicketRow};
use tracker_db::{TicketRowSource, create_schema};
use tracker_search::{Page, SearchConfig, SearchEngine, SortDir};
use tracker_security::{Permission, PermissionSet, Principal, ProjectId, ScopedPermission};
use uuid::Uuid;

pub const PROJECT: ProjectId = ProjectId(1);

/// Fresh in-memory SQLite with the tracker schema.
pub async fn connect() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // one connection, or every pooled connection gets its own database
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(opts).await.unwrap();
    create_schema(&conn).await.unwrap();
    conn
}

pub fn ticket(project: ProjectId, seq: i64) -> TicketRow {
    TicketRow {
        project_id: project.0,
        seq,
        title: format!("ticket {:03}", seq % 7),
        status: if seq % 2 == 0 { "open" } else { "closed" }.to_owned(),
        reporter: Uuid::from_u128(u128::from(seq.unsigned_abs() % 3)),
        created_at: DateTime::from_timestamp(1_700_000_000 + seq * 60, 0).unwrap(),
    }
}

pub fn tickets(project: ProjectId, n: i64) -> Vec<TicketRow> {
    (1..=n).map(|seq| ticket(project, seq)).collect()
}

fn active(m: TicketRow) -> ActiveModel {
    ActiveModel {
        project_id: Set(m.project_id),
        seq: Set(m.seq),
        title: Set(m.title),
        status: Set(m.status),
        reporter: Set(m.reporter),
        created_at: Set(m.created_at),
    }
}

pub async fn seed(conn: &DatabaseConnection, rows: Vec<TicketRow>) {
    // chunked to stay under SQLite's bound-parameter limit
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<_> = rows.by_ref().take(100).map(active).collect();
        Tickets::insert_many(chunk).exec(conn).await.unwrap();
    }
}

pub async fn insert(conn: &DatabaseConnection, row: TicketRow) {
    Tickets::insert(active(row)).exec(conn).await.unwrap();
}

pub fn engine(conn: DatabaseConnection) -> SearchEngine<TicketRowSource> {
    SearchEngine::new(
        Arc::new(TicketRowSource::for_tickets(conn)),
        SearchConfig::default(),
    )
    .with_tiebreaker("project_id", SortDir::Asc)
    .with_tiebreaker("seq", SortDir::Asc)
}

pub fn principal(grants: impl IntoIterator<Item = ScopedPermission>) -> Principal {
    Principal::new(Uuid::new_v4(), grants.into_iter().collect::<PermissionSet>())
}

pub fn reader() -> Principal {
    principal([ScopedPermission::global(Permission::TicketRead)])
}

pub fn seqs(page: &Page<TicketRow>) -> Vec<i64> {
    page.items.iter().map(|t| t.seq).collect()
}
