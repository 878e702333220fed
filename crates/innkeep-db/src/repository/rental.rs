//! # Rental Repository
//!
//! Rentals, their drink lines and additional cars.
//!
//! ## Storage Layout
//! ```text
//! ┌────────────────────────┐
//! │ rentals                │  charges / payment / duration / warning_details
//! │  status, rent_type     │  are JSON TEXT, decoded through RentalRow
//! └──────┬──────────┬──────┘
//!        │          │
//!        ▼          ▼
//! rental_drinks   rental_additional_cars
//! (name + price   (status active|left,
//!  snapshot)       one open walk-in per rental)
//! ```
//!
//! Everything here is a connection function; [`RentalService`] composes
//! them inside one transaction.
//!
//! [`RentalService`]: crate::service::RentalService

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{decode_json, encode_json};
use innkeep_core::{
    CarStatus, CoreError, Money, PaymentMethod, PaymentStatus, RentType, Rental,
    RentalAdditionalCar, RentalDetails, RentalDrink, RentalStatus,
};

const RENTAL_COLUMNS: &str = "id, room_id, customer_id, user_id, car_number, number_of_guests, \
     check_in_time, check_out_time, status, rent_type, previous_rent_type, has_warning, \
     warning_details, charges, duration, payment, payment_method, payment_status, \
     total_amount, note, created_at, updated_at";

const CAR_COLUMNS: &str =
    "id, rental_id, car_number, customer_id, is_walk_in, number_of_guests, status";

/// Raw `rentals` row; JSON columns are still text.
#[derive(Debug, sqlx::FromRow)]
struct RentalRow {
    id: String,
    room_id: String,
    customer_id: String,
    user_id: String,
    car_number: String,
    number_of_guests: i64,
    check_in_time: NaiveDateTime,
    check_out_time: Option<NaiveDateTime>,
    status: RentalStatus,
    rent_type: RentType,
    previous_rent_type: Option<RentType>,
    has_warning: bool,
    warning_details: Option<String>,
    charges: Option<String>,
    duration: Option<String>,
    payment: Option<String>,
    payment_method: Option<PaymentMethod>,
    payment_status: PaymentStatus,
    total_amount: Money,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn decode_opt<T: serde::de::DeserializeOwned>(column: &str, raw: Option<String>) -> DbResult<Option<T>> {
    raw.map(|s| decode_json(column, &s)).transpose()
}

fn encode_opt<T: serde::Serialize>(column: &str, value: Option<&T>) -> DbResult<Option<String>> {
    value.map(|v| encode_json(column, v)).transpose()
}

impl TryFrom<RentalRow> for Rental {
    type Error = DbError;

    fn try_from(row: RentalRow) -> DbResult<Self> {
        Ok(Rental {
            id: row.id,
            room_id: row.room_id,
            customer_id: row.customer_id,
            user_id: row.user_id,
            car_number: row.car_number,
            number_of_guests: row.number_of_guests,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            status: row.status,
            rent_type: row.rent_type,
            previous_rent_type: row.previous_rent_type,
            has_warning: row.has_warning,
            warning_details: decode_opt("warning_details", row.warning_details)?,
            charges: decode_opt("charges", row.charges)?,
            duration: decode_opt("duration", row.duration)?,
            payment: decode_opt("payment", row.payment)?,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            total_amount: row.total_amount,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    // =========================================================================
    // Rentals
    // =========================================================================

    pub async fn insert(conn: &mut SqliteConnection, rental: &Rental) -> DbResult<()> {
        debug!(id = %rental.id, room_id = %rental.room_id, rent_type = %rental.rent_type, "Inserting rental");

        sqlx::query(&format!(
            "INSERT INTO rentals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, \
             ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            RENTAL_COLUMNS
        ))
        .bind(&rental.id)
        .bind(&rental.room_id)
        .bind(&rental.customer_id)
        .bind(&rental.user_id)
        .bind(&rental.car_number)
        .bind(rental.number_of_guests)
        .bind(rental.check_in_time)
        .bind(rental.check_out_time)
        .bind(rental.status)
        .bind(rental.rent_type)
        .bind(rental.previous_rent_type)
        .bind(rental.has_warning)
        .bind(encode_opt("warning_details", rental.warning_details.as_ref())?)
        .bind(encode_opt("charges", rental.charges.as_ref())?)
        .bind(encode_opt("duration", rental.duration.as_ref())?)
        .bind(encode_opt("payment", rental.payment.as_ref())?)
        .bind(rental.payment_method)
        .bind(rental.payment_status)
        .bind(rental.total_amount)
        .bind(&rental.note)
        .bind(rental.created_at)
        .bind(rental.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Rental>> {
        let row = sqlx::query_as::<_, RentalRow>(&format!(
            "SELECT {} FROM rentals WHERE id = ?1",
            RENTAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(Rental::try_from).transpose()
    }

    /// Like [`find`](Self::find) but a missing rental is an error.
    pub async fn require(conn: &mut SqliteConnection, id: &str) -> DbResult<Rental> {
        Self::find(conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Rental", id).into())
    }

    /// Writes back every mutable column and bumps `updated_at`.
    pub async fn save(conn: &mut SqliteConnection, rental: &mut Rental) -> DbResult<()> {
        rental.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE rentals SET
                number_of_guests = ?2,
                check_out_time = ?3,
                status = ?4,
                rent_type = ?5,
                previous_rent_type = ?6,
                has_warning = ?7,
                warning_details = ?8,
                charges = ?9,
                duration = ?10,
                payment = ?11,
                payment_method = ?12,
                payment_status = ?13,
                total_amount = ?14,
                note = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(&rental.id)
        .bind(rental.number_of_guests)
        .bind(rental.check_out_time)
        .bind(rental.status)
        .bind(rental.rent_type)
        .bind(rental.previous_rent_type)
        .bind(rental.has_warning)
        .bind(encode_opt("warning_details", rental.warning_details.as_ref())?)
        .bind(encode_opt("charges", rental.charges.as_ref())?)
        .bind(encode_opt("duration", rental.duration.as_ref())?)
        .bind(encode_opt("payment", rental.payment.as_ref())?)
        .bind(rental.payment_method)
        .bind(rental.payment_status)
        .bind(rental.total_amount)
        .bind(&rental.note)
        .bind(rental.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Ids of active rentals, oldest check-in first.
    pub async fn active_ids(conn: &mut SqliteConnection) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT id FROM rentals WHERE status = 'active' ORDER BY check_in_time",
        )
        .fetch_all(conn)
        .await?;

        Ok(ids)
    }

    /// The rental with its room, drink lines and additional cars.
    pub async fn details(conn: &mut SqliteConnection, id: &str) -> DbResult<RentalDetails> {
        let rental = Self::require(&mut *conn, id).await?;

        let (room_number, room_type_id): (String, String) =
            sqlx::query_as("SELECT number, room_type_id FROM rooms WHERE id = ?1")
                .bind(&rental.room_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| CoreError::not_found("Room", &rental.room_id))?;

        let drinks = Self::drinks(&mut *conn, id).await?;
        let additional_cars = Self::cars(conn, id).await?;

        Ok(RentalDetails {
            rental,
            room_number,
            room_type_id,
            drinks,
            additional_cars,
        })
    }

    // =========================================================================
    // Drink lines
    // =========================================================================

    pub async fn drinks(conn: &mut SqliteConnection, rental_id: &str) -> DbResult<Vec<RentalDrink>> {
        let lines = sqlx::query_as::<_, RentalDrink>(
            r#"
            SELECT id, rental_id, drink_id, name, quantity, unit_price
            FROM rental_drinks WHERE rental_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(rental_id)
        .fetch_all(conn)
        .await?;

        Ok(lines)
    }

    pub async fn find_drink_line(
        conn: &mut SqliteConnection,
        rental_id: &str,
        drink_id: &str,
    ) -> DbResult<Option<RentalDrink>> {
        let line = sqlx::query_as::<_, RentalDrink>(
            r#"
            SELECT id, rental_id, drink_id, name, quantity, unit_price
            FROM rental_drinks WHERE rental_id = ?1 AND drink_id = ?2
            "#,
        )
        .bind(rental_id)
        .bind(drink_id)
        .fetch_optional(conn)
        .await?;

        Ok(line)
    }

    pub async fn insert_drink_line(conn: &mut SqliteConnection, line: &RentalDrink) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rental_drinks (id, rental_id, drink_id, name, quantity, unit_price, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&line.id)
        .bind(&line.rental_id)
        .bind(&line.drink_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn set_drink_quantity(
        conn: &mut SqliteConnection,
        line_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        sqlx::query("UPDATE rental_drinks SET quantity = ?2 WHERE id = ?1")
            .bind(line_id)
            .bind(quantity)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn delete_drink_line(conn: &mut SqliteConnection, line_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM rental_drinks WHERE id = ?1")
            .bind(line_id)
            .execute(conn)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Additional cars
    // =========================================================================

    pub async fn cars(
        conn: &mut SqliteConnection,
        rental_id: &str,
    ) -> DbResult<Vec<RentalAdditionalCar>> {
        let cars = sqlx::query_as::<_, RentalAdditionalCar>(&format!(
            "SELECT {} FROM rental_additional_cars WHERE rental_id = ?1 ORDER BY created_at, id",
            CAR_COLUMNS
        ))
        .bind(rental_id)
        .fetch_all(conn)
        .await?;

        Ok(cars)
    }

    pub async fn find_car(
        conn: &mut SqliteConnection,
        car_id: &str,
    ) -> DbResult<Option<RentalAdditionalCar>> {
        let car = sqlx::query_as::<_, RentalAdditionalCar>(&format!(
            "SELECT {} FROM rental_additional_cars WHERE id = ?1",
            CAR_COLUMNS
        ))
        .bind(car_id)
        .fetch_optional(conn)
        .await?;

        Ok(car)
    }

    /// Inserts an additional car.
    ///
    /// A second open walk-in on the same rental trips
    /// `idx_cars_single_walk_in` and surfaces as `WalkInCarExists`.
    pub async fn insert_car(conn: &mut SqliteConnection, car: &RentalAdditionalCar) -> DbResult<()> {
        debug!(rental_id = %car.rental_id, car_number = %car.car_number, walk_in = car.is_walk_in, "Adding car");

        sqlx::query(&format!(
            "INSERT INTO rental_additional_cars ({}, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            CAR_COLUMNS
        ))
        .bind(&car.id)
        .bind(&car.rental_id)
        .bind(&car.car_number)
        .bind(&car.customer_id)
        .bind(car.is_walk_in)
        .bind(car.number_of_guests)
        .bind(car.status)
        .bind(Utc::now())
        .execute(conn)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("rental_additional_cars") => {
                DbError::Domain(CoreError::WalkInCarExists)
            }
            other => other,
        })?;

        Ok(())
    }

    pub async fn set_car_status(
        conn: &mut SqliteConnection,
        car_id: &str,
        status: CarStatus,
    ) -> DbResult<()> {
        sqlx::query("UPDATE rental_additional_cars SET status = ?2 WHERE id = ?1")
            .bind(car_id)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Marks every open car of the rental as left.
    pub async fn mark_cars_left(conn: &mut SqliteConnection, rental_id: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE rental_additional_cars SET status = 'left' WHERE rental_id = ?1 AND status = 'active'",
        )
        .bind(rental_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Whether `car_number` is the main plate or an open additional car.
    pub async fn plate_on_rental(
        conn: &mut SqliteConnection,
        rental_id: &str,
        car_number: &str,
    ) -> DbResult<bool> {
        let present: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM rentals WHERE id = ?1 AND car_number = ?2
                UNION ALL
                SELECT 1 FROM rental_additional_cars
                WHERE rental_id = ?1 AND car_number = ?2 AND status = 'active'
            )
            "#,
        )
        .bind(rental_id)
        .bind(car_number)
        .fetch_one(conn)
        .await?;

        Ok(present)
    }

    // -------------------------------------------------------------------------
    // Handle methods
    // -------------------------------------------------------------------------

    pub async fn get(&self, id: &str) -> DbResult<RentalDetails> {
        let mut conn = self.pool.acquire().await?;
        Self::details(&mut conn, id).await
    }

    pub async fn list_active(&self) -> DbResult<Vec<RentalDetails>> {
        let mut conn = self.pool.acquire().await?;

        let ids = Self::active_ids(&mut conn).await?;
        let mut rentals = Vec::with_capacity(ids.len());
        for id in ids {
            rentals.push(Self::details(&mut conn, &id).await?);
        }

        Ok(rentals)
    }
}
