//! Price preview before check-in.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::PriceLogic;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::RentType;

/// What the front desk quotes before a guest checks in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub rent_type: RentType,
    pub base_price: Money,
    /// Price of every hour beyond the quoted block.
    pub additional_price: Money,
    #[ts(as = "String")]
    pub estimated_checkout: NaiveDateTime,
    pub note: String,
}

/// Quotes a rent type for a room type, starting at `now`.
///
/// ```text
/// hourly     baseHourPrice   checkout now + 1h
/// halfday    halfDayPrice    checkout now + maxHalfDayHours
/// overnight  fullDayPrice    checkout now + 24h
/// ```
pub fn estimate_calculation(
    logic: &PriceLogic,
    rent_type: RentType,
    room_type_id: &str,
    now: NaiveDateTime,
) -> CoreResult<Estimate> {
    let prices = logic.room_price(room_type_id)?;

    let (base_price, hours, note) = match rent_type {
        RentType::Hourly => (
            logic.base_hour_price,
            1,
            format!(
                "First hour {}, then {} per hour",
                logic.base_hour_price, logic.additional_hour_price
            ),
        ),
        RentType::Halfday => (
            prices.half_day_price,
            logic.max_half_day_hours,
            format!(
                "Covers up to {}h, then {} per hour",
                logic.max_half_day_hours, logic.additional_hour_price
            ),
        ),
        RentType::Overnight => (
            prices.full_day_price,
            24,
            "Covers 24h; longer stays are billed by remaining-hour band".to_string(),
        ),
    };

    Ok(Estimate {
        rent_type,
        base_price,
        additional_price: logic.additional_hour_price,
        estimated_checkout: now + Duration::hours(hours),
        note,
    })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::{calculate_charge, ChargeRequest};
    use super::*;

    #[test]
    fn test_estimates() {
        let logic = logic();
        let now = at(10, 0);

        let e = estimate_calculation(&logic, RentType::Hourly, ROOM_TYPE, now).unwrap();
        assert_eq!(e.base_price, Money::new(70_000));
        assert_eq!(e.estimated_checkout, at(11, 0));

        let e = estimate_calculation(&logic, RentType::Halfday, ROOM_TYPE, now).unwrap();
        assert_eq!(e.base_price, Money::new(300_000));
        assert_eq!(e.estimated_checkout, at(22, 0));

        let e = estimate_calculation(&logic, RentType::Overnight, ROOM_TYPE, now).unwrap();
        assert_eq!(e.base_price, Money::new(500_000));
        assert_eq!(e.additional_price, Money::new(10_000));
        assert_eq!(e.estimated_checkout, now + Duration::hours(24));
    }

    #[test]
    fn test_estimate_agrees_with_charge_without_overage() {
        let logic = logic();
        let now = at(10, 0);

        for rent_type in RentType::ALL {
            let e = estimate_calculation(&logic, rent_type, ROOM_TYPE, now).unwrap();
            let charge = calculate_charge(
                &logic,
                &ChargeRequest {
                    check_in: now,
                    check_out: e.estimated_checkout,
                    rent_type,
                    room_type_id: ROOM_TYPE,
                    has_prior_warning: false,
                },
            )
            .unwrap();
            assert_eq!(charge.amount, e.base_price, "{}", rent_type);
        }
    }

    #[test]
    fn test_unknown_room_type() {
        assert!(estimate_calculation(&PriceLogic::default(), RentType::Hourly, "x", at(10, 0)).is_err());
    }
}
