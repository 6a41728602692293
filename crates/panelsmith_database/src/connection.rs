//! Database connection utilities.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use panelsmith_error::{DatabaseError, DatabaseErrorKind};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Establish a connection to the PostgreSQL database.
///
/// Reads the `DATABASE_URL` environment variable to determine the connection string.
///
/// # Errors
///
/// Returns an error if:
/// - `DATABASE_URL` environment variable is not set
/// - Connection to the database fails
pub fn establish_connection() -> Result<PgConnection, DatabaseError> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
    })?;

    PgConnection::establish(&database_url)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))
}

/// Apply pending schema migrations.
pub fn run_migrations(conn: &mut PgConnection) -> Result<usize, DatabaseError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?;
    info!(count = applied.len(), "Applied database migrations");
    Ok(applied.len())
}
