//! Table bootstrap for a fresh database.

use sea_orm::{ConnectionTrait, DbConn, DbErr, EntityTrait, Schema};

use super::entity::{account, post};

/// Create the `accounts` and `posts` tables when they are missing.
pub async fn ensure_schema(db: &DbConn) -> Result<(), DbErr> {
    create_table(db, account::Entity).await?;
    create_table(db, post::Entity).await?;

    tracing::info!("Database schema ready");
    Ok(())
}

async fn create_table<E>(db: &DbConn, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(backend.build(&statement)).await?;
    Ok(())
}
