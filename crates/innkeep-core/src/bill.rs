//! # Checkout Bill
//!
//! Turns a room charge and drink lines into [`Charges`], and a tendered
//! amount into a [`PaymentRecord`].
//!
//! ```text
//! subtotal = room + drinks
//! final    = subtotal − discount + additionalCharge      (must be ≥ 0)
//! change   = max(0, tendered − final)
//! status   = completed if tendered ≥ final, else pending
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Charges, PaymentMethod, PaymentRecord, PaymentStatus, RentalDrink};
use crate::validation::validate_amount;

/// Sum of all drink lines.
pub fn drinks_total(drinks: &[RentalDrink]) -> Money {
    drinks.iter().map(RentalDrink::line_total).sum()
}

/// Builds the bill.
pub fn compose_charges(
    room: Money,
    drinks: Money,
    discount: Money,
    additional_charge: Money,
) -> CoreResult<Charges> {
    validate_amount("discount", discount)?;
    validate_amount("additionalCharges", additional_charge)?;

    let subtotal = room + drinks;
    let final_amount = subtotal - discount + additional_charge;
    if final_amount.is_negative() {
        return Err(CoreError::InvalidPayment {
            reason: format!("discount {} exceeds the bill {}", discount, subtotal + additional_charge),
        });
    }

    Ok(Charges {
        room,
        drinks,
        discount,
        additional_charge,
        subtotal,
        final_amount,
    })
}

/// Records what the customer handed over against the final amount.
pub fn settle(final_amount: Money, tendered: Money, method: PaymentMethod) -> CoreResult<PaymentRecord> {
    validate_amount("customerPayment", tendered)?;

    let status = if tendered >= final_amount {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Pending
    };

    Ok(PaymentRecord {
        amount: tendered,
        change: tendered.saturating_sub(final_amount),
        method,
        status,
    })
}

/// Adds a further payment to a pending one.
///
/// The amounts accumulate; the latest method wins.
pub fn settle_further(
    previous: Option<&PaymentRecord>,
    final_amount: Money,
    tendered: Money,
    method: PaymentMethod,
) -> CoreResult<PaymentRecord> {
    validate_amount("customerPayment", tendered)?;
    if tendered.is_zero() {
        return Err(CoreError::InvalidPayment {
            reason: "payment must be positive".to_string(),
        });
    }
    let already_paid = previous.map(|p| p.amount).unwrap_or_default();
    settle(final_amount, already_paid + tendered, method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_examples() {
        let p = settle(Money::new(80_000), Money::new(100_000), PaymentMethod::Cash).unwrap();
        assert_eq!(p.change, Money::new(20_000));
        assert_eq!(p.status, PaymentStatus::Completed);

        let p = settle(Money::new(80_000), Money::new(50_000), PaymentMethod::Cash).unwrap();
        assert_eq!(p.change, Money::zero());
        assert_eq!(p.status, PaymentStatus::Pending);

        let p = settle(Money::new(80_000), Money::new(80_000), PaymentMethod::Banking).unwrap();
        assert_eq!(p.change, Money::zero());
        assert_eq!(p.status, PaymentStatus::Completed);
    }

    #[test]
    fn test_compose_charges() {
        let c = compose_charges(
            Money::new(80_000),
            Money::new(50_000),
            Money::new(10_000),
            Money::new(5_000),
        )
        .unwrap();
        assert_eq!(c.subtotal, Money::new(130_000));
        assert_eq!(c.final_amount, Money::new(125_000));
    }

    #[test]
    fn test_rejects_negative_inputs_and_result() {
        assert!(compose_charges(Money::new(1), Money::zero(), Money::new(-1), Money::zero()).is_err());
        assert!(compose_charges(Money::new(1), Money::zero(), Money::zero(), Money::new(-1)).is_err());
        assert!(matches!(
            compose_charges(Money::new(70_000), Money::zero(), Money::new(90_000), Money::zero()),
            Err(CoreError::InvalidPayment { .. })
        ));
        assert!(settle(Money::new(1), Money::new(-5), PaymentMethod::Cash).is_err());
    }

    #[test]
    fn test_settle_further_accumulates() {
        let first = settle(Money::new(80_000), Money::new(50_000), PaymentMethod::Cash).unwrap();
        let second =
            settle_further(Some(&first), Money::new(80_000), Money::new(40_000), PaymentMethod::Banking)
                .unwrap();
        assert_eq!(second.amount, Money::new(90_000));
        assert_eq!(second.change, Money::new(10_000));
        assert_eq!(second.status, PaymentStatus::Completed);
        assert_eq!(second.method, PaymentMethod::Banking);

        assert!(settle_further(Some(&first), Money::new(80_000), Money::zero(), PaymentMethod::Cash).is_err());
    }

    #[test]
    fn test_drinks_total() {
        let line = |qty, price| RentalDrink {
            id: "l".into(),
            rental_id: "r".into(),
            drink_id: "d".into(),
            name: "Beer".into(),
            quantity: qty,
            unit_price: Money::new(price),
        };
        assert_eq!(drinks_total(&[line(2, 25_000), line(1, 15_000)]), Money::new(65_000));
        assert_eq!(drinks_total(&[]), Money::zero());
    }
}
