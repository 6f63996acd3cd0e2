//! Table creation from the entity definitions.

use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

use crate::entity::{grant, principal, ticket};
use crate::error::DbResult;

async fn create<E: EntityTrait>(
    conn: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> DbResult<()> {
    let backend = conn.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    conn.execute(backend.build(&table)).await?;
    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        conn.execute(backend.build(&index)).await?;
    }
    Ok(())
}

/// Create the tracker tables and their indexes if missing.
///
/// # Errors
/// Returns `DbError::Db` when a statement fails.
pub async fn create_schema(conn: &DatabaseConnection) -> DbResult<()> {
    let schema = Schema::new(conn.get_database_backend());
    create(conn, &schema, ticket::Entity).await?;
    create(conn, &schema, principal::Entity).await?;
    create(conn, &schema, grant::Entity).await?;
    info!("tracker schema ready");
    Ok(())
}
