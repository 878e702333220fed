//! # Shift Repository
//!
//! Shifts and the ledger rows filed under them.
//!
//! ## Single Active Shift
//! ```text
//! INSERT shift (status='active')
//!      │
//!      ├── ok                        → shift open
//!      └── UNIQUE failed: shifts.status → someone else holds the till
//! ```
//!
//! The partial index `idx_shifts_single_active` is the source of truth; the
//! pre-checks in [`ShiftService`](crate::service::ShiftService) only produce
//! nicer messages.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{decode_json, encode_json};
use innkeep_core::ledger::ShiftTotals;
use innkeep_core::{
    Money, PaymentMethod, Shift, ShiftTransaction, TransactionStatus, TransactionType,
};

const SHIFT_COLUMNS: &str = "id, user_id, start_time, end_time, status, start_cash, \
                             cash_amount, banking_amount, total_amount, note";

const TX_COLUMNS: &str = "id, shift_id, rental_id, room_number, amount, method, type, status, \
     details, check_in_shift_id, check_out_shift_id, is_cross_shift, created_at, updated_at";

/// Raw `shift_transactions` row.
#[derive(Debug, sqlx::FromRow)]
struct ShiftTransactionRow {
    id: String,
    shift_id: String,
    rental_id: Option<String>,
    room_number: Option<String>,
    amount: Money,
    method: PaymentMethod,
    #[sqlx(rename = "type")]
    tx_type: TransactionType,
    status: TransactionStatus,
    details: String,
    check_in_shift_id: Option<String>,
    check_out_shift_id: Option<String>,
    is_cross_shift: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShiftTransactionRow> for ShiftTransaction {
    type Error = DbError;

    fn try_from(row: ShiftTransactionRow) -> DbResult<Self> {
        Ok(ShiftTransaction {
            id: row.id,
            shift_id: row.shift_id,
            rental_id: row.rental_id,
            room_number: row.room_number,
            amount: row.amount,
            method: row.method,
            tx_type: row.tx_type,
            status: row.status,
            details: decode_json("details", &row.details)?,
            check_in_shift_id: row.check_in_shift_id,
            check_out_shift_id: row.check_out_shift_id,
            is_cross_shift: row.is_cross_shift,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    // =========================================================================
    // Shifts
    // =========================================================================

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts WHERE id = ?1",
            SHIFT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(shift)
    }

    /// The open shift, whoever owns it.
    pub async fn active(conn: &mut SqliteConnection) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts WHERE status = 'active'",
            SHIFT_COLUMNS
        ))
        .fetch_optional(conn)
        .await?;

        Ok(shift)
    }

    /// The open shift if `user_id` owns it.
    pub async fn active_for_user(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<Option<Shift>> {
        Ok(Self::active(conn).await?.filter(|s| s.user_id == user_id))
    }

    pub async fn insert(conn: &mut SqliteConnection, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, user_id = %shift.user_id, "Inserting shift");

        sqlx::query(&format!(
            "INSERT INTO shifts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            SHIFT_COLUMNS
        ))
        .bind(&shift.id)
        .bind(&shift.user_id)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.status)
        .bind(shift.start_cash)
        .bind(shift.cash_amount)
        .bind(shift.banking_amount)
        .bind(shift.total_amount)
        .bind(&shift.note)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Completes an active shift with frozen totals.
    ///
    /// Returns `false` when the shift was no longer active.
    pub async fn close(
        conn: &mut SqliteConnection,
        id: &str,
        totals: &ShiftTotals,
        note: Option<&str>,
        end_time: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                status = 'completed',
                end_time = ?2,
                cash_amount = ?3,
                banking_amount = ?4,
                total_amount = ?5,
                note = COALESCE(?6, note)
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(end_time)
        .bind(totals.cash_amount)
        .bind(totals.banking_amount)
        .bind(totals.total_amount)
        .bind(note)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Ledger rows
    // =========================================================================

    /// Rows filed under the shift plus cross-shift checkouts closed in it.
    pub async fn transactions_for(
        conn: &mut SqliteConnection,
        shift_id: &str,
    ) -> DbResult<Vec<ShiftTransaction>> {
        let rows = sqlx::query_as::<_, ShiftTransactionRow>(&format!(
            "SELECT {} FROM shift_transactions \
             WHERE shift_id = ?1 OR check_out_shift_id = ?1 \
             ORDER BY created_at, id",
            TX_COLUMNS
        ))
        .bind(shift_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(ShiftTransaction::try_from).collect()
    }

    /// Every ledger row of a rental, oldest first.
    pub async fn transactions_for_rental(
        conn: &mut SqliteConnection,
        rental_id: &str,
    ) -> DbResult<Vec<ShiftTransaction>> {
        let rows = sqlx::query_as::<_, ShiftTransactionRow>(&format!(
            "SELECT {} FROM shift_transactions WHERE rental_id = ?1 ORDER BY created_at, id",
            TX_COLUMNS
        ))
        .bind(rental_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(ShiftTransaction::try_from).collect()
    }

    /// The still-processing check-in row of a rental.
    pub async fn checkin_for_rental(
        conn: &mut SqliteConnection,
        rental_id: &str,
    ) -> DbResult<Option<ShiftTransaction>> {
        let row = sqlx::query_as::<_, ShiftTransactionRow>(&format!(
            "SELECT {} FROM shift_transactions \
             WHERE rental_id = ?1 AND type = 'checkin' AND status = 'processing' \
             ORDER BY created_at DESC LIMIT 1",
            TX_COLUMNS
        ))
        .bind(rental_id)
        .fetch_optional(conn)
        .await?;

        row.map(ShiftTransaction::try_from).transpose()
    }

    pub async fn insert_transaction(conn: &mut SqliteConnection, tx: &ShiftTransaction) -> DbResult<()> {
        debug!(
            id = %tx.id,
            shift_id = %tx.shift_id,
            tx_type = ?tx.tx_type,
            amount = tx.amount.amount(),
            "Inserting ledger row"
        );

        sqlx::query(&format!(
            "INSERT INTO shift_transactions ({}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            TX_COLUMNS
        ))
        .bind(&tx.id)
        .bind(&tx.shift_id)
        .bind(&tx.rental_id)
        .bind(&tx.room_number)
        .bind(tx.amount)
        .bind(tx.method)
        .bind(tx.tx_type)
        .bind(tx.status)
        .bind(encode_json("details", &tx.details)?)
        .bind(&tx.check_in_shift_id)
        .bind(&tx.check_out_shift_id)
        .bind(tx.is_cross_shift)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Writes back the mutable columns of a ledger row.
    pub async fn update_transaction(
        conn: &mut SqliteConnection,
        tx: &mut ShiftTransaction,
    ) -> DbResult<()> {
        tx.updated_at = Utc::now();

        debug!(id = %tx.id, tx_type = ?tx.tx_type, status = ?tx.status, "Updating ledger row");

        sqlx::query(
            r#"
            UPDATE shift_transactions SET
                amount = ?2,
                method = ?3,
                type = ?4,
                status = ?5,
                details = ?6,
                check_in_shift_id = ?7,
                check_out_shift_id = ?8,
                is_cross_shift = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&tx.id)
        .bind(tx.amount)
        .bind(tx.method)
        .bind(tx.tx_type)
        .bind(tx.status)
        .bind(encode_json("details", &tx.details)?)
        .bind(&tx.check_in_shift_id)
        .bind(&tx.check_out_shift_id)
        .bind(tx.is_cross_shift)
        .bind(tx.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Handle methods
    // -------------------------------------------------------------------------

    pub async fn get(&self, id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, id).await
    }

    /// Every shift, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts ORDER BY start_time DESC",
            SHIFT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    pub async fn rental_transactions(&self, rental_id: &str) -> DbResult<Vec<ShiftTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Self::transactions_for_rental(&mut conn, rental_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::new_id;
    use crate::service::fixtures::*;
    use innkeep_core::{ShiftStatus, TransactionDetails, User};

    fn open_shift(user: &User) -> Shift {
        Shift {
            id: new_id(),
            user_id: user.id.clone(),
            start_time: Utc::now(),
            end_time: None,
            status: ShiftStatus::Active,
            start_cash: Money::zero(),
            cash_amount: Money::zero(),
            banking_amount: Money::zero(),
            total_amount: Money::zero(),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_index_allows_one_active_shift() {
        let m = motel().await;
        let mut conn = m.db.pool().acquire().await.unwrap();

        let lan = open_shift(&m.lan);
        ShiftRepository::insert(&mut conn, &lan).await.unwrap();

        let err = ShiftRepository::insert(&mut conn, &open_shift(&m.minh)).await.unwrap_err();
        assert!(err.is_unique_violation_on("shifts"), "{:?}", err);

        let totals = ShiftTotals::default();
        assert!(ShiftRepository::close(&mut conn, &lan.id, &totals, Some("done"), Utc::now())
            .await
            .unwrap());
        // already closed
        assert!(!ShiftRepository::close(&mut conn, &lan.id, &totals, None, Utc::now())
            .await
            .unwrap());

        let closed = ShiftRepository::find(&mut conn, &lan.id).await.unwrap().unwrap();
        assert_eq!(closed.status, ShiftStatus::Completed);
        assert_eq!(closed.note.as_deref(), Some("done"));

        let minh = open_shift(&m.minh);
        ShiftRepository::insert(&mut conn, &minh).await.unwrap();
        assert!(ShiftRepository::active_for_user(&mut conn, &m.lan.id).await.unwrap().is_none());
        let active = ShiftRepository::active_for_user(&mut conn, &m.minh.id).await.unwrap().unwrap();
        assert_eq!(active.id, minh.id);
    }

    #[tokio::test]
    async fn test_ledger_queries() {
        let m = motel().await;
        let first = m.db.shifts().start(&m.lan, None).await.unwrap();
        let rental = m
            .db
            .rentals()
            .create(&m.lan, hourly_stay(&m.room, "51F-11111", at(10, 0)))
            .await
            .unwrap();
        let rental_id = rental.rental.id.clone();

        let mut conn = m.db.pool().acquire().await.unwrap();

        let mut checkin = ShiftRepository::checkin_for_rental(&mut conn, &rental_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(checkin.tx_type, TransactionType::Checkin);
        assert_eq!(checkin.status, TransactionStatus::Processing);
        assert_eq!(checkin.shift_id, first.id);
        assert_eq!(checkin.check_in_shift_id.as_deref(), Some(first.id.as_str()));

        // hand the rental over to the next shift
        checkin.status = TransactionStatus::Completed;
        ShiftRepository::update_transaction(&mut conn, &mut checkin).await.unwrap();
        assert!(ShiftRepository::checkin_for_rental(&mut conn, &rental_id)
            .await
            .unwrap()
            .is_none());

        ShiftRepository::close(&mut conn, &first.id, &ShiftTotals::default(), None, Utc::now())
            .await
            .unwrap();
        let second = open_shift(&m.minh);
        ShiftRepository::insert(&mut conn, &second).await.unwrap();

        let now = Utc::now();
        let checkout = ShiftTransaction {
            id: new_id(),
            shift_id: second.id.clone(),
            rental_id: Some(rental_id.clone()),
            room_number: Some("101".to_string()),
            amount: Money::new(80_000),
            method: PaymentMethod::Banking,
            tx_type: TransactionType::Checkout,
            status: TransactionStatus::Completed,
            details: TransactionDetails {
                customer_payment: Some(Money::new(80_000)),
                ..TransactionDetails::default()
            },
            check_in_shift_id: Some(first.id.clone()),
            check_out_shift_id: Some(second.id.clone()),
            is_cross_shift: true,
            created_at: now,
            updated_at: now,
        };
        ShiftRepository::insert_transaction(&mut conn, &checkout).await.unwrap();

        let first_rows = ShiftRepository::transactions_for(&mut conn, &first.id).await.unwrap();
        assert_eq!(first_rows.len(), 1);
        assert_eq!(first_rows[0].id, checkin.id);

        let second_rows = ShiftRepository::transactions_for(&mut conn, &second.id).await.unwrap();
        assert_eq!(second_rows.len(), 1);
        assert!(second_rows[0].is_cross_shift);
        assert_eq!(second_rows[0].method, PaymentMethod::Banking);
        assert_eq!(second_rows[0].details.customer_payment, Some(Money::new(80_000)));

        let all = ShiftRepository::transactions_for_rental(&mut conn, &rental_id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].tx_type, TransactionType::Checkin);
        assert_eq!(all[1].tx_type, TransactionType::Checkout);
    }
}
