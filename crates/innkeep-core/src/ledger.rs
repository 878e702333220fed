//! # Shift Ledger Classification
//!
//! Every [`ShiftTransaction`] row is read through [`LedgerEntry`], and every
//! total is computed by matching on it.
//!
//! ## Row Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check-in under shift A                                                 │
//! │     row1 { shift A, checkin, processing, amount 0 }  → CheckinPending   │
//! │                                                                         │
//! │  checkout under shift A (same shift)                                    │
//! │     row1 { shift A, checkout, completed, amount X }  → CheckoutSameShift│
//! │                                                                         │
//! │  checkout under shift B (shift changed while guest in-house)           │
//! │     row1 { shift A, checkin, completed }             → CheckinHandedOver│
//! │     row2 { shift B, checkout, completed, cross,                         │
//! │            checkIn A, checkOut B, amount X }         → CheckoutCrossShift│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Revenue of shift S
//! Same-shift checkouts filed under S, cross-shift checkouts whose
//! `checkOutShiftId` is S, and completed deposit/other rows filed under S.
//! Check-in rows never count.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, ShiftTransaction, TransactionStatus, TransactionType};

// =============================================================================
// Classification
// =============================================================================

/// A ledger row, by role.
#[derive(Debug, Clone, Copy)]
pub enum LedgerEntry<'a> {
    /// Guest checked in, not paid yet.
    CheckinPending(&'a ShiftTransaction),
    /// Check-in row closed without revenue (paid in a later shift, or the
    /// rental was cancelled).
    CheckinHandedOver(&'a ShiftTransaction),
    /// Check-in row turned into the checkout in place.
    CheckoutSameShift(&'a ShiftTransaction),
    /// Checkout filed in a later shift than the check-in.
    CheckoutCrossShift(&'a ShiftTransaction),
    /// Deposits and manual entries.
    Other(&'a ShiftTransaction),
}

impl<'a> LedgerEntry<'a> {
    pub fn classify(tx: &'a ShiftTransaction) -> Self {
        match (tx.tx_type, tx.status) {
            (TransactionType::Checkin, TransactionStatus::Processing) => {
                LedgerEntry::CheckinPending(tx)
            }
            (TransactionType::Checkin, TransactionStatus::Completed) => {
                LedgerEntry::CheckinHandedOver(tx)
            }
            (TransactionType::Checkout, _) if tx.is_cross_shift => LedgerEntry::CheckoutCrossShift(tx),
            (TransactionType::Checkout, _) => LedgerEntry::CheckoutSameShift(tx),
            (TransactionType::Deposit | TransactionType::Other, _) => LedgerEntry::Other(tx),
        }
    }

    /// The underlying row.
    pub fn row(&self) -> &'a ShiftTransaction {
        match *self {
            LedgerEntry::CheckinPending(tx)
            | LedgerEntry::CheckinHandedOver(tx)
            | LedgerEntry::CheckoutSameShift(tx)
            | LedgerEntry::CheckoutCrossShift(tx)
            | LedgerEntry::Other(tx) => tx,
        }
    }

    /// Whether the row is revenue of `shift_id`.
    pub fn is_revenue_of(&self, shift_id: &str) -> bool {
        match *self {
            LedgerEntry::CheckinPending(_) | LedgerEntry::CheckinHandedOver(_) => false,
            LedgerEntry::CheckoutSameShift(tx) => tx.shift_id == shift_id,
            LedgerEntry::CheckoutCrossShift(tx) => tx.check_out_shift_id.as_deref() == Some(shift_id),
            LedgerEntry::Other(tx) => {
                tx.shift_id == shift_id && tx.status == TransactionStatus::Completed
            }
        }
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Figures frozen onto a shift when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTotals {
    pub cash_amount: Money,
    pub banking_amount: Money,
    pub total_amount: Money,
}

/// Close totals: `amount` of every revenue row, by method.
pub fn close_totals(shift_id: &str, rows: &[ShiftTransaction]) -> ShiftTotals {
    let mut totals = ShiftTotals::default();

    for entry in rows.iter().map(LedgerEntry::classify) {
        if !entry.is_revenue_of(shift_id) {
            continue;
        }
        let tx = entry.row();
        match tx.method {
            PaymentMethod::Cash => totals.cash_amount += tx.amount,
            PaymentMethod::Banking => totals.banking_amount += tx.amount,
        }
    }

    totals.total_amount = totals.cash_amount + totals.banking_amount;
    totals
}

/// Live report of a shift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    /// Cash collected minus all change handed back.
    pub cash: Money,
    pub banking: Money,
    pub change_given: Money,
    /// `Σ(customerPayment − change)`.
    pub total_revenue: Money,
    pub pending_checkins: i64,
    pub handed_over_checkins: i64,
    pub same_shift_checkouts: i64,
    pub cross_shift_checkouts: i64,
    pub other_entries: i64,
}

/// Builds the report of `shift_id` from its rows.
///
/// Reports use `details.customerPayment` when present (what the guest handed
/// over) and take change back out of the cash bucket, since change is always
/// returned in cash.
pub fn shift_report(shift_id: &str, rows: &[ShiftTransaction]) -> ShiftReport {
    let mut report = ShiftReport::default();

    for entry in rows.iter().map(LedgerEntry::classify) {
        match entry {
            LedgerEntry::CheckinPending(_) => report.pending_checkins += 1,
            LedgerEntry::CheckinHandedOver(_) => report.handed_over_checkins += 1,
            LedgerEntry::CheckoutSameShift(_) => report.same_shift_checkouts += 1,
            LedgerEntry::CheckoutCrossShift(_) => report.cross_shift_checkouts += 1,
            LedgerEntry::Other(_) => report.other_entries += 1,
        }

        if !entry.is_revenue_of(shift_id) {
            continue;
        }

        let tx = entry.row();
        let paid = tx.details.customer_payment.unwrap_or(tx.amount);
        let change = tx.details.change.unwrap_or_default();

        match tx.method {
            PaymentMethod::Cash => report.cash += paid,
            PaymentMethod::Banking => report.banking += paid,
        }
        report.cash -= change;
        report.change_given += change;
        report.total_revenue += paid - change;
    }

    report
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionDetails;
    use chrono::Utc;

    fn row(
        shift: &str,
        tx_type: TransactionType,
        status: TransactionStatus,
        method: PaymentMethod,
        amount: i64,
    ) -> ShiftTransaction {
        ShiftTransaction {
            id: format!("{}-{:?}", shift, tx_type),
            shift_id: shift.to_string(),
            rental_id: Some("rental".into()),
            room_number: Some("101".into()),
            amount: Money::new(amount),
            method,
            tx_type,
            status,
            details: TransactionDetails::default(),
            check_in_shift_id: Some(shift.to_string()),
            check_out_shift_id: None,
            is_cross_shift: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn same_shift_checkout(shift: &str, method: PaymentMethod, amount: i64) -> ShiftTransaction {
        let mut tx = row(shift, TransactionType::Checkout, TransactionStatus::Completed, method, amount);
        tx.check_out_shift_id = Some(shift.to_string());
        tx
    }

    fn cross_shift_pair(from: &str, to: &str, amount: i64) -> (ShiftTransaction, ShiftTransaction) {
        let handed = row(from, TransactionType::Checkin, TransactionStatus::Completed, PaymentMethod::Cash, 0);
        let mut checkout = row(to, TransactionType::Checkout, TransactionStatus::Completed, PaymentMethod::Cash, amount);
        checkout.check_in_shift_id = Some(from.to_string());
        checkout.check_out_shift_id = Some(to.to_string());
        checkout.is_cross_shift = true;
        (handed, checkout)
    }

    #[test]
    fn test_classify() {
        let pending = row("A", TransactionType::Checkin, TransactionStatus::Processing, PaymentMethod::Cash, 0);
        assert!(matches!(LedgerEntry::classify(&pending), LedgerEntry::CheckinPending(_)));

        let (handed, cross) = cross_shift_pair("A", "B", 80_000);
        assert!(matches!(LedgerEntry::classify(&handed), LedgerEntry::CheckinHandedOver(_)));
        assert!(matches!(LedgerEntry::classify(&cross), LedgerEntry::CheckoutCrossShift(_)));

        let same = same_shift_checkout("A", PaymentMethod::Cash, 80_000);
        assert!(matches!(LedgerEntry::classify(&same), LedgerEntry::CheckoutSameShift(_)));

        let deposit = row("A", TransactionType::Deposit, TransactionStatus::Completed, PaymentMethod::Cash, 1);
        assert!(matches!(LedgerEntry::classify(&deposit), LedgerEntry::Other(_)));
    }

    #[test]
    fn test_checkins_never_count() {
        let pending = row("A", TransactionType::Checkin, TransactionStatus::Processing, PaymentMethod::Cash, 999);
        let totals = close_totals("A", &[pending]);
        assert_eq!(totals.total_amount, Money::zero());
    }

    #[test]
    fn test_cross_shift_revenue_goes_to_checkout_shift() {
        let (handed, cross) = cross_shift_pair("A", "B", 80_000);
        let rows = vec![handed, cross];

        assert_eq!(close_totals("A", &rows).total_amount, Money::zero());
        assert_eq!(close_totals("B", &rows).total_amount, Money::new(80_000));
    }

    #[test]
    fn test_close_totals_by_method() {
        let rows = vec![
            same_shift_checkout("A", PaymentMethod::Cash, 80_000),
            same_shift_checkout("A", PaymentMethod::Banking, 120_000),
            row("A", TransactionType::Other, TransactionStatus::Completed, PaymentMethod::Cash, 5_000),
            row("A", TransactionType::Other, TransactionStatus::Processing, PaymentMethod::Cash, 7_000),
        ];
        let totals = close_totals("A", &rows);
        assert_eq!(totals.cash_amount, Money::new(85_000));
        assert_eq!(totals.banking_amount, Money::new(120_000));
        assert_eq!(totals.total_amount, Money::new(205_000));
    }

    #[test]
    fn test_report_prefers_customer_payment_and_takes_change_from_cash() {
        let mut paid_by_bank = same_shift_checkout("A", PaymentMethod::Banking, 80_000);
        paid_by_bank.details.customer_payment = Some(Money::new(100_000));
        paid_by_bank.details.change = Some(Money::new(20_000));

        let mut paid_cash = same_shift_checkout("A", PaymentMethod::Cash, 50_000);
        paid_cash.details.customer_payment = Some(Money::new(50_000));

        let pending = row("A", TransactionType::Checkin, TransactionStatus::Processing, PaymentMethod::Cash, 0);

        let report = shift_report("A", &[paid_by_bank, paid_cash, pending]);
        assert_eq!(report.banking, Money::new(100_000));
        assert_eq!(report.cash, Money::new(30_000));
        assert_eq!(report.change_given, Money::new(20_000));
        assert_eq!(report.total_revenue, Money::new(130_000));
        assert_eq!(report.same_shift_checkouts, 2);
        assert_eq!(report.pending_checkins, 1);
    }
}
