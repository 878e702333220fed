//! # Customer Repository
//!
//! Customers are keyed by licence plate. Walk-ins get a synthetic plate
//! `WALKIN-<8 hex>` so every rental still references a customer row.
//!
//! ## Customer Relations
//! ```text
//! rental (main: 51F-111)  +  additional car 51F-222 (not walk-in)
//!                │
//!           checkout
//!                ▼
//! customer_relations(51F-111 → 51F-222).frequency += 1   (created at 1)
//! ```

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::new_id;
use innkeep_core::{Customer, Money, WALK_IN_PREFIX};

const CUSTOMER_COLUMNS: &str =
    "id, car_number, full_name, phone, is_walk_in, visit_count, total_spent, last_visit_at";

/// How often two customers arrive together.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRelation {
    pub customer_id: String,
    pub related_customer_id: String,
    pub frequency: i64,
    pub last_seen_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = ?1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(customer)
    }

    pub async fn find_by_car_number(
        conn: &mut SqliteConnection,
        car_number: &str,
    ) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE car_number = ?1",
            CUSTOMER_COLUMNS
        ))
        .bind(car_number)
        .fetch_optional(conn)
        .await?;

        Ok(customer)
    }

    async fn insert(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, car_number = %customer.car_number, "Creating customer");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO customers (
                id, car_number, full_name, phone, is_walk_in,
                visit_count, total_spent, last_visit_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, NULL, ?6, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.car_number)
        .bind(&customer.full_name)
        .bind(&customer.phone)
        .bind(customer.is_walk_in)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Returns the customer with this plate, creating it on first visit.
    pub async fn find_or_create(
        conn: &mut SqliteConnection,
        car_number: &str,
        full_name: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<Customer> {
        if let Some(existing) = Self::find_by_car_number(&mut *conn, car_number).await? {
            return Ok(existing);
        }

        let customer = Customer {
            id: new_id(),
            car_number: car_number.to_string(),
            full_name: full_name.map(str::to_string),
            phone: phone.map(str::to_string),
            is_walk_in: false,
            visit_count: 0,
            total_spent: Money::zero(),
            last_visit_at: None,
        };
        Self::insert(conn, &customer).await?;
        Ok(customer)
    }

    /// Creates a walk-in customer with a synthetic plate.
    pub async fn create_walk_in(conn: &mut SqliteConnection) -> DbResult<Customer> {
        let customer = Customer {
            id: new_id(),
            car_number: walk_in_plate(),
            full_name: None,
            phone: None,
            is_walk_in: true,
            visit_count: 0,
            total_spent: Money::zero(),
            last_visit_at: None,
        };
        Self::insert(conn, &customer).await?;
        Ok(customer)
    }

    /// Whether the customer is in a room right now, as the main guest or as
    /// an additional car, ignoring `except_rental`.
    pub async fn has_active_rental(
        conn: &mut SqliteConnection,
        customer_id: &str,
        except_rental: Option<&str>,
    ) -> DbResult<bool> {
        let busy: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM rentals
                WHERE customer_id = ?1 AND status = 'active' AND id != ?2
                UNION ALL
                SELECT 1 FROM rental_additional_cars c
                JOIN rentals r ON r.id = c.rental_id
                WHERE c.customer_id = ?1 AND c.status = 'active'
                  AND r.status = 'active' AND r.id != ?2
            )
            "#,
        )
        .bind(customer_id)
        .bind(except_rental.unwrap_or(""))
        .fetch_one(conn)
        .await?;

        Ok(busy)
    }

    /// Bumps visit count and spend after a checkout.
    pub async fn record_visit(
        conn: &mut SqliteConnection,
        id: &str,
        spent: Money,
        at: NaiveDateTime,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE customers SET
                visit_count = visit_count + 1,
                total_spent = total_spent + ?2,
                last_visit_at = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(spent)
        .bind(at)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Increments the pair's frequency, creating it at 1.
    pub async fn bump_relation(
        conn: &mut SqliteConnection,
        customer_id: &str,
        related_customer_id: &str,
        at: NaiveDateTime,
    ) -> DbResult<()> {
        debug!(customer_id, related_customer_id, "Recording customer relation");

        sqlx::query(
            r#"
            INSERT INTO customer_relations (id, customer_id, related_customer_id, frequency, last_seen_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            ON CONFLICT (customer_id, related_customer_id)
            DO UPDATE SET frequency = frequency + 1, last_seen_at = excluded.last_seen_at
            "#,
        )
        .bind(new_id())
        .bind(customer_id)
        .bind(related_customer_id)
        .bind(at)
        .execute(conn)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Handle methods
    // -------------------------------------------------------------------------

    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    /// Customers seen together with `customer_id`, most frequent first.
    pub async fn relations(&self, customer_id: &str) -> DbResult<Vec<CustomerRelation>> {
        let relations = sqlx::query_as::<_, CustomerRelation>(
            r#"
            SELECT customer_id, related_customer_id, frequency, last_seen_at
            FROM customer_relations
            WHERE customer_id = ?1
            ORDER BY frequency DESC, last_seen_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(relations)
    }
}

/// `WALKIN-` followed by 8 hex digits.
fn walk_in_plate() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", WALK_IN_PREFIX, &simple[..8].to_uppercase())
}
