//! Overnight tier.
//!
//! One `fullDayPrice` per whole 24h block (at least one). The remaining
//! hours `r` fall into a band:
//!
//! ```text
//!   r == 0                 none
//!   r ≤ hourlyThreshold    r × additionalHourPrice
//!   r ≤ 14                 halfDayPrice
//!   r < 17                 halfDayPrice + (r − 14) × additionalHourPrice
//!   r ≥ 17                 fullDayPrice
//! ```
//!
//! Under 24h the band is still reported but charged as zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ChargeResult, ChargeTier, OvernightDetails, PriceLogic, RoomPrice, StayDuration, TierDetails};
use crate::money::Money;

const HALF_DAY_BAND_END: i64 = 14;
const FULL_DAY_BAND_START: i64 = 17;
const HOURS_PER_DAY: i64 = 24;

/// Band the remaining hours of an overnight stay fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OvernightBand {
    None,
    Hourly,
    HalfDay,
    HalfDayPlusHours,
    FullDay,
}

pub(super) fn charge(logic: &PriceLogic, prices: RoomPrice, duration: StayDuration) -> ChargeResult {
    let billed = duration.billed_hours;
    let full_days = (billed / HOURS_PER_DAY).max(1);
    let remaining_hours = if billed < HOURS_PER_DAY {
        billed
    } else {
        billed % HOURS_PER_DAY
    };

    let (band, band_amount) = band(logic, prices, remaining_hours);
    let overage_cost = if billed < HOURS_PER_DAY {
        Money::zero()
    } else {
        band_amount
    };
    let full_day_cost = prices.full_day_price.times(full_days);

    ChargeResult {
        tier: ChargeTier::Overnight,
        amount: full_day_cost + overage_cost,
        duration,
        details: TierDetails::Overnight(OvernightDetails {
            full_days,
            full_day_cost,
            remaining_hours,
            band,
            band_amount,
            overage_cost,
        }),
        warning: None,
        escalation: None,
    }
}

fn band(logic: &PriceLogic, prices: RoomPrice, r: i64) -> (OvernightBand, Money) {
    if r <= 0 {
        (OvernightBand::None, Money::zero())
    } else if r <= logic.hourly_threshold {
        (OvernightBand::Hourly, logic.additional_hour_price.times(r))
    } else if r <= HALF_DAY_BAND_END {
        (OvernightBand::HalfDay, prices.half_day_price)
    } else if r < FULL_DAY_BAND_START {
        (
            OvernightBand::HalfDayPlusHours,
            prices.half_day_price + logic.additional_hour_price.times(r - HALF_DAY_BAND_END),
        )
    } else {
        (OvernightBand::FullDay, prices.full_day_price)
    }
}
