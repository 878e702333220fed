//! Half-day tier.
//!
//! ```text
//! billed ≤ maxHalfDay      halfDayPrice
//! billed > maxHalfDay      halfDayPrice + (billed − maxHalfDay) × additional
//!                          + warn: overnight @ fullDayPrice
//!   ...with prior warning  re-priced as overnight, escalation halfday → overnight
//! ```
//!
//! The window check looks at hour-of-day only (dates are ignored), so a
//! multi-day stay that starts and ends inside the window counts as inside.
//! The window only annotates the details; the overflow rule is the same
//! either way.

use super::{
    overnight, ChargeRequest, ChargeResult, ChargeTier, ChargeWarning, Escalation, HalfdayDetails,
    PriceLogic, RoomPrice, StayDuration, TierDetails,
};
use crate::error::CoreResult;
use crate::types::RentType;
use chrono::Timelike;

pub(super) fn charge(
    logic: &PriceLogic,
    prices: RoomPrice,
    duration: StayDuration,
    req: &ChargeRequest<'_>,
) -> CoreResult<ChargeResult> {
    let (start, end) = logic.half_day_window()?;
    let within_window =
        in_window(start, end, req.check_in.hour()) && in_window(start, end, req.check_out.hour());

    let billed = duration.billed_hours;
    let overflow = billed > logic.max_half_day_hours;

    if overflow && req.has_prior_warning {
        let mut result = overnight::charge(logic, prices, duration);
        result.escalation = Some(Escalation {
            previous_type: RentType::Halfday,
            changed_to: RentType::Overnight,
        });
        return Ok(result);
    }

    let extra_hours = if overflow {
        billed - logic.max_half_day_hours
    } else {
        0
    };
    let extra_cost = logic.additional_hour_price.times(extra_hours);

    let warning = overflow.then(|| ChargeWarning {
        suggested_type: RentType::Overnight,
        suggested_price: prices.full_day_price,
        message: format!(
            "Half-day stay of {}h exceeds {}h; switch to overnight at {}",
            billed, logic.max_half_day_hours, prices.full_day_price
        ),
    });

    Ok(ChargeResult {
        tier: ChargeTier::Halfday,
        amount: prices.half_day_price + extra_cost,
        duration,
        details: TierDetails::Halfday(HalfdayDetails {
            base: prices.half_day_price,
            within_window,
            extra_hours,
            extra_cost,
        }),
        warning,
        escalation: None,
    })
}

/// `start ≤ h ≤ end`, wrapping past midnight when `start > end`.
fn in_window(start: u32, end: u32, hour: u32) -> bool {
    if start <= end {
        start <= hour && hour <= end
    } else {
        hour >= start || hour <= end
    }
}
