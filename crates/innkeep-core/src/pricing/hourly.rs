//! Hourly tier.
//!
//! ```text
//! billed ≤ 1h               baseHourPrice                           hourly_base
//! billed > 1h               base + (billed − 1) × additional        hourly_mixed
//!
//! threshold < billed ≤ maxHalfDay    warn: halfday   @ halfDayPrice
//! maxHalfDay < billed ≤ maxFullDay   warn: overnight @ fullDayPrice
//! ```

use super::{ChargeResult, ChargeTier, ChargeWarning, HourlyDetails, PriceLogic, RoomPrice, StayDuration, TierDetails};
use crate::money::Money;
use crate::types::RentType;

pub(super) fn charge(logic: &PriceLogic, prices: RoomPrice, duration: StayDuration) -> ChargeResult {
    let billed = duration.billed_hours;
    let additional_hours = (billed - 1).max(0);
    let additional_cost = logic.additional_hour_price.times(additional_hours);

    let tier = if billed <= 1 {
        ChargeTier::HourlyBase
    } else {
        ChargeTier::HourlyMixed
    };

    ChargeResult {
        tier,
        amount: logic.base_hour_price + additional_cost,
        duration,
        details: TierDetails::Hourly(HourlyDetails {
            first_hour: logic.base_hour_price,
            additional_hours,
            additional_cost,
        }),
        warning: upsell(logic, prices, billed),
        escalation: None,
    }
}

fn upsell(logic: &PriceLogic, prices: RoomPrice, billed: i64) -> Option<ChargeWarning> {
    let (suggested_type, suggested_price): (RentType, Money) =
        if billed > logic.hourly_threshold && billed <= logic.max_half_day_hours {
            (RentType::Halfday, prices.half_day_price)
        } else if billed > logic.max_half_day_hours && billed <= logic.max_full_day_hours {
            (RentType::Overnight, prices.full_day_price)
        } else {
            return None;
        };

    Some(ChargeWarning {
        suggested_type,
        suggested_price,
        message: format!(
            "Hourly stay of {}h exceeds {}h; switch to {} at {}",
            billed,
            if suggested_type == RentType::Halfday {
                logic.hourly_threshold
            } else {
                logic.max_half_day_hours
            },
            suggested_type,
            suggested_price
        ),
    })
}
