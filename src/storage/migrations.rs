//! Schema migrations for the history database.

use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

/// Runs SQLx migrations located in the `migrations/` directory.
///
/// Applied migrations are recorded by sqlx, so running this on every start is
/// safe.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), DatabaseError> {
    let migrations_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir.as_path()).await?;
    migrator.run(pool).await?;
    log::debug!("History schema is current ({} migrations)", migrator.iter().count());
    Ok(())
}
