//! # Drink Repository
//!
//! Drinks and their pack/unit stock.
//!
//! ## Stock Writes
//! ```text
//! read drink (packs=2, units=3)
//!      │
//!      ▼
//! StockLevel::take(5) → (packs=1, units=22)      pure, in innkeep-core
//!      │
//!      ▼
//! UPDATE drinks SET pack_stock=1, unit_stock=22
//! WHERE id=? AND pack_stock=2 AND unit_stock=3    compare-and-swap
//!      │
//!      └── 0 rows → stock moved underneath us → InsufficientStock
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use innkeep_core::validation::validate_price;
use innkeep_core::{CoreError, Drink, Money, ValidationError};

const DRINK_COLUMNS: &str = "id, name, cost_price, selling_price, units_per_pack, \
                             pack_stock, unit_stock, alert_threshold, is_active";

/// Fields for a new drink.
#[derive(Debug, Clone)]
pub struct NewDrink {
    pub name: String,
    pub cost_price: Money,
    pub selling_price: Money,
    pub units_per_pack: i64,
    pub pack_stock: i64,
    pub unit_stock: i64,
    pub alert_threshold: i64,
}

#[derive(Debug, Clone)]
pub struct DrinkRepository {
    pool: SqlitePool,
}

impl DrinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DrinkRepository { pool }
    }

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Drink>> {
        let drink = sqlx::query_as::<_, Drink>(&format!(
            "SELECT {} FROM drinks WHERE id = ?1",
            DRINK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(drink)
    }

    /// Removes `qty` units from stock.
    ///
    /// `drink` must be the row as just read on `conn`; the update only lands
    /// if the stock still matches it.
    pub async fn take_units(conn: &mut SqliteConnection, drink: &Drink, qty: i64) -> DbResult<()> {
        let current = drink.stock();
        let insufficient = || CoreError::InsufficientStock {
            drink: drink.name.clone(),
            available: current.total_units(),
            requested: qty,
        };

        let next = current.take(qty).ok_or_else(insufficient)?;

        debug!(
            drink_id = %drink.id,
            qty,
            packs = next.pack_stock,
            units = next.unit_stock,
            "Taking drink stock"
        );

        let result = sqlx::query(
            r#"
            UPDATE drinks SET pack_stock = ?2, unit_stock = ?3, updated_at = ?4
            WHERE id = ?1 AND pack_stock = ?5 AND unit_stock = ?6
            "#,
        )
        .bind(&drink.id)
        .bind(next.pack_stock)
        .bind(next.unit_stock)
        .bind(Utc::now())
        .bind(current.pack_stock)
        .bind(current.unit_stock)
        .execute(conn)
        .await?;

        if result.rows_affected() != 1 {
            warn!(drink_id = %drink.id, "Drink stock changed concurrently");
            return Err(insufficient().into());
        }

        Ok(())
    }

    /// Returns `qty` units to loose stock.
    pub async fn return_units(conn: &mut SqliteConnection, id: &str, qty: i64) -> DbResult<()> {
        debug!(drink_id = %id, qty, "Returning drink stock");

        sqlx::query("UPDATE drinks SET unit_stock = unit_stock + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(qty.max(0))
            .bind(Utc::now())
            .execute(conn)
            .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Handle methods
    // -------------------------------------------------------------------------

    pub async fn get(&self, id: &str) -> DbResult<Option<Drink>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    /// Active drinks ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Drink>> {
        let drinks = sqlx::query_as::<_, Drink>(&format!(
            "SELECT {} FROM drinks WHERE is_active = 1 ORDER BY name",
            DRINK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(drinks)
    }

    pub async fn create(&self, new: NewDrink) -> DbResult<Drink> {
        if new.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }
        validate_price("costPrice", new.cost_price)?;
        validate_price("sellingPrice", new.selling_price)?;
        if new.selling_price < new.cost_price {
            return Err(ValidationError::MustExceed {
                field: "sellingPrice".to_string(),
                other: "costPrice".to_string(),
            }
            .into());
        }
        if new.units_per_pack < 1 {
            return Err(ValidationError::MustBePositive {
                field: "unitsPerPack".to_string(),
            }
            .into());
        }

        let drink = Drink {
            id: new_id(),
            name: new.name.trim().to_string(),
            cost_price: new.cost_price,
            selling_price: new.selling_price,
            units_per_pack: new.units_per_pack,
            pack_stock: new.pack_stock.max(0),
            unit_stock: new.unit_stock.max(0),
            alert_threshold: new.alert_threshold.max(0),
            is_active: true,
        };
        let now = Utc::now();

        debug!(id = %drink.id, name = %drink.name, "Creating drink");

        sqlx::query(
            r#"
            INSERT INTO drinks (
                id, name, cost_price, selling_price, units_per_pack,
                pack_stock, unit_stock, alert_threshold, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)
            "#,
        )
        .bind(&drink.id)
        .bind(&drink.name)
        .bind(drink.cost_price)
        .bind(drink.selling_price)
        .bind(drink.units_per_pack)
        .bind(drink.pack_stock)
        .bind(drink.unit_stock)
        .bind(drink.alert_threshold)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("drink name", &drink.name),
            other => other,
        })?;

        Ok(drink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn beer() -> NewDrink {
        NewDrink {
            name: "Tiger".to_string(),
            cost_price: Money::new(15_000),
            selling_price: Money::new(25_000),
            units_per_pack: 24,
            pack_stock: 2,
            unit_stock: 3,
            alert_threshold: 5,
        }
    }

    #[tokio::test]
    async fn test_take_and_return_units() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let drink = db.drinks().create(beer()).await.unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            DrinkRepository::take_units(&mut conn, &drink, 5).await.unwrap();
        }
        let after = db.drinks().get(&drink.id).await.unwrap().unwrap();
        assert_eq!((after.pack_stock, after.unit_stock), (1, 22));

        {
            let mut conn = db.pool().acquire().await.unwrap();
            DrinkRepository::return_units(&mut conn, &drink.id, 2).await.unwrap();
        }
        let after = db.drinks().get(&drink.id).await.unwrap().unwrap();
        assert_eq!(after.total_units(), 51 - 5 + 2);
    }

    #[tokio::test]
    async fn test_oversell_and_stale_read_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let drink = db.drinks().create(beer()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = DrinkRepository::take_units(&mut conn, &drink, 52).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 51, requested: 52, .. })
        ));

        DrinkRepository::take_units(&mut conn, &drink, 1).await.unwrap();
        // `drink` is now stale
        assert!(DrinkRepository::take_units(&mut conn, &drink, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_selling_price_below_cost_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut cheap = beer();
        cheap.selling_price = Money::new(10_000);
        assert!(db.drinks().create(cheap).await.is_err());
    }
}
