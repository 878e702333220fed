//! # Database Migrations
//!
//! Embedded SQL migrations for innkeep.
//!
//! ```text
//! startup ──► _sqlx_migrations present? ──► apply pending files in order
//!                                               │
//!                        migrations/sqlite/001_initial_schema.sql
//!                          tables + JSON columns
//!                          idx_shifts_single_active   (one open shift)
//!                          idx_rentals_active_room    (one stay per room)
//!                          idx_cars_single_walk_in    (one walk-in car)
//! ```
//!
//! Never edit an applied migration; add `NNN_description.sql` instead. The
//! partial unique indexes hold invariants the services rely on, so
//! changing one is a behaviour change.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations embedded at compile time from `migrations/sqlite`.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every pending migration. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Schema state reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Compares embedded migrations with those recorded in the database.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_fresh_database_is_current() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let status = super::migration_status(db.pool()).await.unwrap();
        assert!(status.embedded >= 1);
        assert!(status.is_current());
    }
}
