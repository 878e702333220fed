//! # Price Logic Repository
//!
//! The pricing configuration is a single row (`id = 1`). It is created with
//! defaults the first time anyone reads it.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::{decode_json, encode_json};
use innkeep_core::pricing::{PriceLogic, RoomPrice};

#[derive(Debug, sqlx::FromRow)]
struct PriceLogicRow {
    hourly_threshold: i64,
    base_hour_price: i64,
    additional_hour_price: i64,
    half_day_start: String,
    half_day_end: String,
    min_half_day_hours: i64,
    max_half_day_hours: i64,
    min_full_day_hours: i64,
    max_full_day_hours: i64,
    room_prices: String,
}

impl PriceLogicRow {
    fn into_logic(self) -> DbResult<PriceLogic> {
        let room_prices: BTreeMap<String, RoomPrice> =
            decode_json("room_prices", &self.room_prices)?;

        Ok(PriceLogic {
            hourly_threshold: self.hourly_threshold,
            base_hour_price: self.base_hour_price.into(),
            additional_hour_price: self.additional_hour_price.into(),
            half_day_start: self.half_day_start,
            half_day_end: self.half_day_end,
            min_half_day_hours: self.min_half_day_hours,
            max_half_day_hours: self.max_half_day_hours,
            min_full_day_hours: self.min_full_day_hours,
            max_full_day_hours: self.max_full_day_hours,
            room_prices,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PriceLogicRepository {
    pool: SqlitePool,
}

impl PriceLogicRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PriceLogicRepository { pool }
    }

    async fn fetch(conn: &mut SqliteConnection) -> DbResult<Option<PriceLogic>> {
        let row = sqlx::query_as::<_, PriceLogicRow>(
            r#"
            SELECT hourly_threshold, base_hour_price, additional_hour_price,
                   half_day_start, half_day_end,
                   min_half_day_hours, max_half_day_hours,
                   min_full_day_hours, max_full_day_hours, room_prices
            FROM price_logic WHERE id = 1
            "#,
        )
        .fetch_optional(conn)
        .await?;

        row.map(PriceLogicRow::into_logic).transpose()
    }

    /// Reads the configuration without writing; defaults when none is stored.
    /// Pricing paths use this so a preview never touches the table.
    pub async fn current(conn: &mut SqliteConnection) -> DbResult<PriceLogic> {
        Ok(Self::fetch(conn).await?.unwrap_or_default())
    }

    /// Reads the configuration, seeding defaults on first use.
    pub async fn load(conn: &mut SqliteConnection) -> DbResult<PriceLogic> {
        match Self::fetch(&mut *conn).await? {
            Some(logic) => Ok(logic),
            None => {
                info!("No price logic stored, seeding defaults");
                let defaults = PriceLogic::default();
                Self::save(conn, &defaults).await?;
                Ok(defaults)
            }
        }
    }

    /// Upserts the configuration. Callers validate first.
    pub async fn save(conn: &mut SqliteConnection, logic: &PriceLogic) -> DbResult<()> {
        let room_prices = encode_json("room_prices", &logic.room_prices)?;

        debug!(room_types = logic.room_prices.len(), "Saving price logic");

        sqlx::query(
            r#"
            INSERT INTO price_logic (
                id, hourly_threshold, base_hour_price, additional_hour_price,
                half_day_start, half_day_end,
                min_half_day_hours, max_half_day_hours,
                min_full_day_hours, max_full_day_hours,
                room_prices, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (id) DO UPDATE SET
                hourly_threshold = excluded.hourly_threshold,
                base_hour_price = excluded.base_hour_price,
                additional_hour_price = excluded.additional_hour_price,
                half_day_start = excluded.half_day_start,
                half_day_end = excluded.half_day_end,
                min_half_day_hours = excluded.min_half_day_hours,
                max_half_day_hours = excluded.max_half_day_hours,
                min_full_day_hours = excluded.min_full_day_hours,
                max_full_day_hours = excluded.max_full_day_hours,
                room_prices = excluded.room_prices,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(logic.hourly_threshold)
        .bind(logic.base_hour_price)
        .bind(logic.additional_hour_price)
        .bind(&logic.half_day_start)
        .bind(&logic.half_day_end)
        .bind(logic.min_half_day_hours)
        .bind(logic.max_half_day_hours)
        .bind(logic.min_full_day_hours)
        .bind(logic.max_full_day_hours)
        .bind(room_prices)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn get(&self) -> DbResult<PriceLogic> {
        let mut conn = self.pool.acquire().await?;
        Self::load(&mut conn).await
    }

    /// Validates and replaces the configuration.
    pub async fn update(&self, logic: PriceLogic) -> DbResult<PriceLogic> {
        logic.validate()?;

        let mut conn = self.pool.acquire().await?;
        Self::save(&mut conn, &logic).await?;

        info!("Price logic updated");
        Ok(logic)
    }
}
