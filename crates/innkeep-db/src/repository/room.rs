//! # Room Repository
//!
//! Rooms, room types, and the guarded status transitions the rental
//! lifecycle relies on.
//!
//! ```text
//!   available ──occupy()──► occupied ──transition(occupied→cleaning)──► cleaning
//!       ▲                      │                                          │
//!       └──transition(occupied→available) (cancel)                        │
//!       └──────────────────────── mark_cleaned() ─────────────────────────┘
//! ```
//!
//! Every transition is `UPDATE ... WHERE status = <expected>`: a second
//! writer that lost the race matches zero rows instead of double-booking.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use innkeep_core::{CoreError, Room, RoomStatus, RoomType};

const ROOM_COLUMNS: &str = "id, number, floor, room_type_id, status, is_active";

/// Repository for room database operations.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Connection functions
    // -------------------------------------------------------------------------

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {} FROM rooms WHERE id = ?1",
            ROOM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(room)
    }

    /// Flips an active, available room to occupied.
    ///
    /// Returns `false` when the room was not available.
    pub async fn occupy(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rooms SET status = 'occupied', updated_at = ?2
            WHERE id = ?1 AND status = 'available' AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Moves a room from `from` to `to`; `false` when it was not in `from`.
    pub async fn transition(
        conn: &mut SqliteConnection,
        id: &str,
        from: RoomStatus,
        to: RoomStatus,
    ) -> DbResult<bool> {
        debug!(room_id = %id, from = from.as_str(), to = to.as_str(), "Room transition");

        let result = sqlx::query(
            "UPDATE rooms SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count_occupied(conn: &mut SqliteConnection) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rooms WHERE status = 'occupied' AND is_active = 1",
        )
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Handle methods
    // -------------------------------------------------------------------------

    pub async fn get(&self, id: &str) -> DbResult<Option<Room>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    /// Active rooms ordered by number.
    pub async fn list(&self) -> DbResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "SELECT {} FROM rooms WHERE is_active = 1 ORDER BY number",
            ROOM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Creates an available room.
    pub async fn create(&self, number: &str, floor: i64, room_type_id: &str) -> DbResult<Room> {
        let room = Room {
            id: new_id(),
            number: number.to_string(),
            floor,
            room_type_id: room_type_id.to_string(),
            status: RoomStatus::Available,
            is_active: true,
        };
        let now = Utc::now();

        debug!(id = %room.id, number = %room.number, "Creating room");

        sqlx::query(
            r#"
            INSERT INTO rooms (id, number, floor, room_type_id, status, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
        )
        .bind(&room.id)
        .bind(&room.number)
        .bind(room.floor)
        .bind(&room.room_type_id)
        .bind(room.status)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("room number", number),
            other => other,
        })?;

        Ok(room)
    }

    /// `cleaning → available` once housekeeping is done.
    pub async fn mark_cleaned(&self, id: &str) -> DbResult<Room> {
        let mut conn = self.pool.acquire().await?;

        let room = Self::find(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Room", id))?;

        if !Self::transition(&mut conn, id, RoomStatus::Cleaning, RoomStatus::Available).await? {
            return Err(CoreError::RoomUnavailable {
                room_number: room.number,
                status: room.status.as_str().to_string(),
            }
            .into());
        }

        Ok(Room {
            status: RoomStatus::Available,
            ..room
        })
    }
}

/// Repository for room types.
#[derive(Debug, Clone)]
pub struct RoomTypeRepository {
    pool: SqlitePool,
}

impl RoomTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoomTypeRepository { pool }
    }

    pub async fn create(&self, name: &str) -> DbResult<RoomType> {
        let room_type = RoomType {
            id: new_id(),
            name: name.to_string(),
            is_active: true,
        };

        sqlx::query("INSERT INTO room_types (id, name, is_active, created_at) VALUES (?1, ?2, 1, ?3)")
            .bind(&room_type.id)
            .bind(&room_type.name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(room_type)
    }

    pub async fn list(&self) -> DbResult<Vec<RoomType>> {
        let types = sqlx::query_as::<_, RoomType>(
            "SELECT id, name, is_active FROM room_types WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> (Database, Room) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let room_type = RoomTypeRepository::new(db.pool().clone())
            .create("Standard")
            .await
            .unwrap();
        let room = db.rooms().create("101", 1, &room_type.id).await.unwrap();
        (db, room)
    }

    #[tokio::test]
    async fn test_occupy_is_guarded() {
        let (db, room) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(RoomRepository::occupy(&mut conn, &room.id).await.unwrap());
        assert!(!RoomRepository::occupy(&mut conn, &room.id).await.unwrap());
        assert_eq!(RoomRepository::count_occupied(&mut conn).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_cleaned_requires_cleaning() {
        let (db, room) = setup().await;

        assert!(db.rooms().mark_cleaned(&room.id).await.is_err());

        {
            let mut conn = db.pool().acquire().await.unwrap();
            RoomRepository::occupy(&mut conn, &room.id).await.unwrap();
            RoomRepository::transition(&mut conn, &room.id, RoomStatus::Occupied, RoomStatus::Cleaning)
                .await
                .unwrap();
        }

        let cleaned = db.rooms().mark_cleaned(&room.id).await.unwrap();
        assert_eq!(cleaned.status, RoomStatus::Available);
    }

    #[tokio::test]
    async fn test_duplicate_room_number() {
        let (db, room) = setup().await;
        let err = db.rooms().create("101", 2, &room.room_type_id).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
