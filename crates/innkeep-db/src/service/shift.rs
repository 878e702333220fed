//! # Shift Ledger
//!
//! Opens and closes shifts and files every check-in and checkout against
//! one.
//!
//! ## Cross-Shift Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create rental (shift A active, owned by caller)                       │
//! │     record_checkin  → row1 {A, checkin, processing, 0}                 │
//! │                                                                         │
//! │  checkout, shift A still active                                        │
//! │     record_checkout → row1 {A, checkout, completed, X, out=A}          │
//! │                                                                         │
//! │  checkout, shift B active instead                                      │
//! │     record_checkout → row1 {A, checkin, completed}                     │
//! │                       row2 {B, checkout, completed, X,                 │
//! │                             in=A, out=B, cross}                        │
//! │                                                                         │
//! │  cancel                                                                 │
//! │     close_checkin   → row1 {A, checkin, completed, 0}                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The free functions run on the caller's open transaction so a rental and
//! its ledger row commit together. Without an open shift they log a warning
//! and write nothing.

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::error::DbResult;
use crate::repository::{new_id, RoomRepository, ShiftRepository, UserRepository};
use innkeep_core::ledger::{close_totals, shift_report, ShiftReport, ShiftTotals};
use innkeep_core::validation::{validate_amount, validate_note};
use innkeep_core::{
    CoreError, Money, PaymentMethod, RentType, Rental, Room, Shift, ShiftStatus, ShiftTransaction,
    TransactionDetails, TransactionStatus, TransactionType, User,
};

// =============================================================================
// Ledger Events
// =============================================================================

/// A paid checkout, as handed to the ledger.
#[derive(Debug, Clone)]
pub struct CheckoutEvent {
    pub rental_id: String,
    pub room_number: String,
    pub room_type_id: String,
    pub rent_type: RentType,
    pub number_of_guests: i64,
    pub check_in_time: NaiveDateTime,
    pub check_out_time: NaiveDateTime,
    /// Final bill.
    pub amount: Money,
    /// Cumulative amount the customer handed over.
    pub customer_payment: Money,
    pub change: Money,
    pub method: PaymentMethod,
    pub user_id: String,
    pub username: String,
}

/// Files a new rental's check-in under the caller's open shift.
pub async fn record_checkin(
    conn: &mut SqliteConnection,
    rental: &Rental,
    room: &Room,
    user: &User,
) -> DbResult<Option<ShiftTransaction>> {
    let Some(shift) = ShiftRepository::active_for_user(&mut *conn, &user.id).await? else {
        warn!(
            rental_id = %rental.id,
            user_id = %user.id,
            "Check-in without an open shift of the caller, ledger row skipped"
        );
        return Ok(None);
    };

    let now = Utc::now();
    let row = ShiftTransaction {
        id: new_id(),
        shift_id: shift.id.clone(),
        rental_id: Some(rental.id.clone()),
        room_number: Some(room.number.clone()),
        amount: Money::zero(),
        method: PaymentMethod::Cash,
        tx_type: TransactionType::Checkin,
        status: TransactionStatus::Processing,
        details: TransactionDetails {
            number_of_guests: Some(rental.number_of_guests),
            check_in_time: Some(rental.check_in_time),
            room_type_id: Some(room.room_type_id.clone()),
            rent_type: Some(rental.rent_type),
            user_id: Some(user.id.clone()),
            username: Some(user.username.clone()),
            ..TransactionDetails::default()
        },
        check_in_shift_id: Some(shift.id),
        check_out_shift_id: None,
        is_cross_shift: false,
        created_at: now,
        updated_at: now,
    };

    ShiftRepository::insert_transaction(conn, &row).await?;
    Ok(Some(row))
}

/// Files a paid checkout under the currently open shift.
///
/// Returns the row that now carries the revenue.
pub async fn record_checkout(
    conn: &mut SqliteConnection,
    event: &CheckoutEvent,
) -> DbResult<Option<ShiftTransaction>> {
    let Some(active) = ShiftRepository::active(&mut *conn).await? else {
        warn!(rental_id = %event.rental_id, "Checkout without an open shift, ledger row skipped");
        return Ok(None);
    };

    let checkin = ShiftRepository::checkin_for_rental(&mut *conn, &event.rental_id).await?;

    match checkin {
        Some(mut row) if row.shift_id == active.id => {
            row.tx_type = TransactionType::Checkout;
            row.status = TransactionStatus::Completed;
            row.amount = event.amount;
            row.method = event.method;
            row.check_out_shift_id = Some(active.id);
            apply_checkout_details(&mut row.details, event);

            ShiftRepository::update_transaction(conn, &mut row).await?;
            Ok(Some(row))
        }
        Some(mut checkin_row) => {
            checkin_row.status = TransactionStatus::Completed;
            ShiftRepository::update_transaction(&mut *conn, &mut checkin_row).await?;

            info!(
                rental_id = %event.rental_id,
                check_in_shift = %checkin_row.shift_id,
                check_out_shift = %active.id,
                "Cross-shift checkout"
            );

            let mut details = checkin_row.details.clone();
            apply_checkout_details(&mut details, event);
            let row = checkout_row(event, &active, Some(checkin_row.shift_id), details);

            ShiftRepository::insert_transaction(conn, &row).await?;
            Ok(Some(row))
        }
        None => {
            let mut details = TransactionDetails {
                number_of_guests: Some(event.number_of_guests),
                check_in_time: Some(event.check_in_time),
                room_type_id: Some(event.room_type_id.clone()),
                rent_type: Some(event.rent_type),
                ..TransactionDetails::default()
            };
            apply_checkout_details(&mut details, event);
            let row = checkout_row(event, &active, None, details);

            ShiftRepository::insert_transaction(conn, &row).await?;
            Ok(Some(row))
        }
    }
}

/// Closes a rental's pending check-in row with no revenue.
pub async fn close_checkin(conn: &mut SqliteConnection, rental_id: &str) -> DbResult<bool> {
    match ShiftRepository::checkin_for_rental(&mut *conn, rental_id).await? {
        Some(mut row) => {
            row.status = TransactionStatus::Completed;
            row.amount = Money::zero();
            ShiftRepository::update_transaction(conn, &mut row).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn apply_checkout_details(details: &mut TransactionDetails, event: &CheckoutEvent) {
    details.check_out_time = Some(event.check_out_time);
    details.customer_payment = Some(event.customer_payment);
    details.change = Some(event.change);
    details.rent_type = Some(event.rent_type);
    details.user_id = Some(event.user_id.clone());
    details.username = Some(event.username.clone());
}

fn checkout_row(
    event: &CheckoutEvent,
    active: &Shift,
    check_in_shift_id: Option<String>,
    details: TransactionDetails,
) -> ShiftTransaction {
    let now = Utc::now();
    ShiftTransaction {
        id: new_id(),
        shift_id: active.id.clone(),
        rental_id: Some(event.rental_id.clone()),
        room_number: Some(event.room_number.clone()),
        amount: event.amount,
        method: event.method,
        tx_type: TransactionType::Checkout,
        status: TransactionStatus::Completed,
        details,
        is_cross_shift: check_in_shift_id.is_some(),
        check_in_shift_id,
        check_out_shift_id: Some(active.id.clone()),
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Shift Service
// =============================================================================

/// A shift with its ledger, live totals and report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub shift: Shift,
    /// What closing now would freeze (the frozen figures once completed).
    pub totals: ShiftTotals,
    pub report: ShiftReport,
    pub transactions: Vec<ShiftTransaction>,
}

#[derive(Debug, Clone)]
pub struct ShiftService {
    pool: SqlitePool,
}

impl ShiftService {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftService { pool }
    }

    /// Opens a shift for `user`.
    ///
    /// ## Errors
    /// - `OwnShiftActive` when the caller already has one open
    /// - `ShiftActiveElsewhere` when another user does (also raised when a
    ///   concurrent start wins the unique index)
    pub async fn start(&self, user: &User, start_cash: Option<Money>) -> DbResult<Shift> {
        let start_cash = start_cash.unwrap_or_default();
        validate_amount("startCash", start_cash)?;

        let mut tx = self.pool.begin().await?;

        if let Some(open) = ShiftRepository::active(&mut tx).await? {
            return Err(active_shift_conflict(&mut tx, user, &open).await?.into());
        }

        let shift = Shift {
            id: new_id(),
            user_id: user.id.clone(),
            start_time: Utc::now(),
            end_time: None,
            status: ShiftStatus::Active,
            start_cash,
            cash_amount: Money::zero(),
            banking_amount: Money::zero(),
            total_amount: Money::zero(),
            note: None,
        };

        insert_open_shift(&mut tx, user, &shift).await?;
        tx.commit().await?;

        info!(shift_id = %shift.id, user = %user.username, start_cash = start_cash.amount(), "Shift started");
        Ok(shift)
    }

    /// Closes the caller's shift, freezing its totals.
    ///
    /// Occupied rooms only produce a warning; their rentals will be filed as
    /// cross-shift checkouts under the next shift.
    pub async fn end(&self, user: &User, note: Option<&str>) -> DbResult<Shift> {
        let note = validate_note(note)?;

        let mut tx = self.pool.begin().await?;

        let shift = ShiftRepository::active_for_user(&mut tx, &user.id)
            .await?
            .ok_or(CoreError::NoActiveShift)?;

        let occupied = RoomRepository::count_occupied(&mut tx).await?;
        if occupied > 0 {
            warn!(shift_id = %shift.id, occupied, "Ending shift with occupied rooms");
        }

        let rows = ShiftRepository::transactions_for(&mut tx, &shift.id).await?;
        let totals = close_totals(&shift.id, &rows);
        let end_time = Utc::now();

        if !ShiftRepository::close(&mut tx, &shift.id, &totals, note.as_deref(), end_time).await? {
            return Err(CoreError::NoActiveShift.into());
        }

        tx.commit().await?;

        info!(
            shift_id = %shift.id,
            cash = totals.cash_amount.amount(),
            banking = totals.banking_amount.amount(),
            total = totals.total_amount.amount(),
            "Shift ended"
        );

        Ok(Shift {
            end_time: Some(end_time),
            status: ShiftStatus::Completed,
            cash_amount: totals.cash_amount,
            banking_amount: totals.banking_amount,
            total_amount: totals.total_amount,
            note: note.or(shift.note),
            ..shift
        })
    }

    /// The caller's open shift, if any.
    pub async fn current(&self, user: &User) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        ShiftRepository::active_for_user(&mut conn, &user.id).await
    }

    /// Live summary of the caller's open shift.
    pub async fn current_report(&self, user: &User) -> DbResult<ShiftSummary> {
        let shift = self.current(user).await?.ok_or(CoreError::NoActiveShift)?;
        self.summarize(shift).await
    }

    pub async fn summary(&self, shift_id: &str) -> DbResult<ShiftSummary> {
        let shift = ShiftRepository::new(self.pool.clone())
            .get(shift_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Shift", shift_id))?;
        self.summarize(shift).await
    }

    /// Every shift, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Shift>> {
        ShiftRepository::new(self.pool.clone()).list_all().await
    }

    async fn summarize(&self, shift: Shift) -> DbResult<ShiftSummary> {
        let mut conn = self.pool.acquire().await?;
        let transactions = ShiftRepository::transactions_for(&mut conn, &shift.id).await?;

        let totals = match shift.status {
            ShiftStatus::Active => close_totals(&shift.id, &transactions),
            ShiftStatus::Completed => ShiftTotals {
                cash_amount: shift.cash_amount,
                banking_amount: shift.banking_amount,
                total_amount: shift.total_amount,
            },
        };
        let report = shift_report(&shift.id, &transactions);

        Ok(ShiftSummary {
            shift,
            totals,
            report,
            transactions,
        })
    }
}

/// Inserts an open shift. A start that loses the race past the pre-check
/// hits `idx_shifts_single_active` and is reported as a conflict.
async fn insert_open_shift(conn: &mut SqliteConnection, user: &User, shift: &Shift) -> DbResult<()> {
    match ShiftRepository::insert(&mut *conn, shift).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_unique_violation_on("shifts") => {
            warn!(user = %user.username, "Concurrent shift start lost the race");
            let conflict = match ShiftRepository::active(&mut *conn).await? {
                Some(open) => active_shift_conflict(conn, user, &open).await?,
                None => CoreError::ShiftActiveElsewhere {
                    owner: "another user".to_string(),
                },
            };
            Err(conflict.into())
        }
        Err(err) => Err(err),
    }
}

async fn active_shift_conflict(
    conn: &mut SqliteConnection,
    user: &User,
    open: &Shift,
) -> DbResult<CoreError> {
    if open.user_id == user.id {
        return Ok(CoreError::OwnShiftActive);
    }
    let owner = UserRepository::find(conn, &open.user_id)
        .await?
        .map(|u| u.full_name)
        .unwrap_or_else(|| open.user_id.clone());
    Ok(CoreError::ShiftActiveElsewhere { owner })
}

// =============================================================================
// Unit Tests
// =============================================================================
