//! Relational [`RowSource`]: filter, access predicate, seek and order all
//! run in the database.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    QueryTrait, Select,
};
use tracing::{debug, trace};
use tracker_search::{
    CompositeKey, EffectiveFilter, KeyRange, OrderingSpec, RowSource, SearchResult,
    ValidationError,
};

use crate::access::{AccessScopedEntity, build_access_condition};
use crate::entity::ticket;
use crate::error::DbError;
use crate::field_map::{FieldKind, FieldMap, read_key};
use crate::filter::expr_to_condition;
use crate::seek::{apply_order, range_condition};

pub struct SeaOrmRowSource<E: EntityTrait> {
    conn: DatabaseConnection,
    fields: FieldMap<E>,
}

/// Row source over the `tickets` table.
pub type TicketRowSource = SeaOrmRowSource<ticket::Entity>;

/// Filterable and orderable ticket columns, by API name.
pub fn ticket_fields() -> FieldMap<ticket::Entity> {
    FieldMap::new()
        .insert("project_id", ticket::Column::ProjectId, FieldKind::I64)
        .insert("seq", ticket::Column::Seq, FieldKind::I64)
        .insert("title", ticket::Column::Title, FieldKind::String)
        .insert("status", ticket::Column::Status, FieldKind::String)
        .insert("reporter", ticket::Column::Reporter, FieldKind::Uuid)
        .insert("created_at", ticket::Column::CreatedAt, FieldKind::DateTimeUtc)
}

impl TicketRowSource {
    #[must_use]
    pub fn for_tickets(conn: DatabaseConnection) -> Self {
        Self::new(conn, ticket_fields())
    }
}

impl<E> SeaOrmRowSource<E>
where
    E: AccessScopedEntity,
    E::Column: ColumnTrait + Copy,
{
    #[must_use]
    pub fn new(conn: DatabaseConnection, fields: FieldMap<E>) -> Self {
        Self { conn, fields }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// `SELECT .. FROM E WHERE access AND structural`, unordered.
    fn filtered(&self, filter: &EffectiveFilter) -> SearchResult<Select<E>> {
        let mut select = E::find().filter(build_access_condition::<E>(filter.access()));
        if let Some(expr) = filter.structural() {
            select = select.filter(expr_to_condition::<E>(expr, &self.fields)?);
        }
        Ok(select)
    }
}

#[async_trait]
impl<E> RowSource for SeaOrmRowSource<E>
where
    E: AccessScopedEntity,
    E::Column: ColumnTrait + Copy,
    E::Model: Sync,
{
    type Row = E::Model;

    async fn fetch_rows(
        &self,
        filter: &EffectiveFilter,
        order: &OrderingSpec,
        range: &KeyRange,
        limit: usize,
    ) -> SearchResult<Vec<E::Model>> {
        if filter.access().denies_all() {
            trace!("no grant of the required permission; skipping fetch");
            return Ok(Vec::new());
        }

        let select = self
            .filtered(filter)?
            .filter(range_condition(range, order, &self.fields)?);
        let select = apply_order(select, order, &self.fields)?
            .limit(u64::try_from(limit).unwrap_or(u64::MAX));

        let rows = select.all(&self.conn).await.map_err(DbError::from)?;
        trace!(rows = rows.len(), limit, "fetched page rows");
        Ok(rows)
    }

    async fn scan_keys(
        &self,
        filter: &EffectiveFilter,
        order: &OrderingSpec,
    ) -> SearchResult<Vec<CompositeKey>> {
        if order.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }

        let select = self.filtered(filter)?;
        let mut select = apply_order(select, order, &self.fields)?.select_only();
        let mut columns = Vec::with_capacity(order.len());
        for (i, key) in order.keys().iter().enumerate() {
            let field = self.fields.resolve(&key.field)?;
            let alias = format!("k{i}");
            select = select.column_as(field.col, alias.clone());
            columns.push((alias, field.kind));
        }

        let stmt = select.build(self.conn.get_database_backend());
        let rows = self.conn.query_all(stmt).await.map_err(DbError::from)?;
        debug!(rows = rows.len(), order = %order, "scanned ordering keys");

        rows.iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|(alias, kind)| read_key(row, alias, *kind))
                    .collect::<SearchResult<Vec<_>>>()
                    .map(CompositeKey)
            })
            .collect()
    }
}
