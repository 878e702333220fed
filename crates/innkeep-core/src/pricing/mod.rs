//! # Price Calculation Engine
//!
//! Converts an elapsed stay and a rent type into a billable room charge.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ChargeRequest { checkIn, checkOut, rentType, roomTypeId, prior warn } │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  StayDuration::between   (round up when remainder > 10 min)            │
//! │           │                                                             │
//! │           ├── hourly    ──► hourly::charge                             │
//! │           ├── halfday   ──► halfday::charge ──(prior warning)──┐       │
//! │           └── overnight ──► overnight::charge ◄────────────────┘       │
//! │                                                                         │
//! │  ChargeResult { tier, amount, duration, details,                       │
//! │                 warning?    (upsell hint, never changes the amount)    │
//! │                 escalation? (tier changed; caller must apply it) }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is a pure function of its inputs and a [`PriceLogic`]
//! snapshot. It never reads the clock and never touches a rental; an
//! escalation is reported, and the rental lifecycle applies it.

mod duration;
mod estimate;
mod halfday;
mod hourly;
mod logic;
mod overnight;

pub use duration::StayDuration;
pub use estimate::{estimate_calculation, Estimate};
pub use logic::{PriceLogic, RoomPrice};
pub use overnight::OvernightBand;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::RentType;

// =============================================================================
// Request
// =============================================================================

/// Input to [`calculate_charge`].
#[derive(Debug, Clone)]
pub struct ChargeRequest<'a> {
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub rent_type: RentType,
    pub room_type_id: &'a str,
    /// A warning was already recorded on the rental; half-day overflow
    /// then converts to overnight instead of warning again.
    pub has_prior_warning: bool,
}

// =============================================================================
// Result
// =============================================================================

/// Tier label of a computed charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChargeTier {
    /// Hourly stay of at most one billed hour.
    HourlyBase,
    /// Hourly stay: first hour plus additional hours.
    HourlyMixed,
    Halfday,
    Overnight,
}

/// Upsell hint attached to a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChargeWarning {
    pub suggested_type: RentType,
    pub suggested_price: Money,
    pub message: String,
}

/// The stay was re-priced under a different tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Escalation {
    pub previous_type: RentType,
    pub changed_to: RentType,
}

/// Hourly breakdown: first hour plus additional hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HourlyDetails {
    pub first_hour: Money,
    pub additional_hours: i64,
    pub additional_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HalfdayDetails {
    pub base: Money,
    /// Check-in and check-out hours both inside the half-day window.
    pub within_window: bool,
    pub extra_hours: i64,
    pub extra_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OvernightDetails {
    pub full_days: i64,
    pub full_day_cost: Money,
    pub remaining_hours: i64,
    pub band: OvernightBand,
    /// What the remainder band would cost.
    pub band_amount: Money,
    /// What was charged for it (zero under 24h).
    pub overage_cost: Money,
}

/// Per-tier breakdown, enough to rebuild the amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TierDetails {
    Hourly(HourlyDetails),
    Halfday(HalfdayDetails),
    Overnight(OvernightDetails),
}

/// A computed room charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    #[serde(rename = "type")]
    pub tier: ChargeTier,
    pub amount: Money,
    pub duration: StayDuration,
    pub details: TierDetails,
    pub warning: Option<ChargeWarning>,
    pub escalation: Option<Escalation>,
}

impl ChargeResult {
    /// Tier the rental must be moved to, if pricing escalated it.
    #[inline]
    pub fn escalated_to(&self) -> Option<RentType> {
        self.escalation.map(|e| e.changed_to)
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Prices a stay.
///
/// ## Errors
/// - `CheckoutBeforeCheckIn` when `check_out < check_in`
/// - `RoomPriceNotConfigured` when the room type has no prices
/// - `Validation` when the half-day window is malformed
pub fn calculate_charge(logic: &PriceLogic, req: &ChargeRequest<'_>) -> CoreResult<ChargeResult> {
    let duration = StayDuration::between(req.check_in, req.check_out)?;
    let prices = logic.room_price(req.room_type_id)?;

    match req.rent_type {
        RentType::Hourly => Ok(hourly::charge(logic, prices, duration)),
        RentType::Halfday => halfday::charge(logic, prices, duration, req),
        RentType::Overnight => Ok(overnight::charge(logic, prices, duration)),
    }
}

// =============================================================================
// Shared Test Fixtures
// =============================================================================


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_worked_examples() {
        let logic = logic();

        // 10:00 → 10:45 rounds to 1h
        let r = calculate_charge(&logic, &request(RentType::Hourly, at(10, 0), 45, false)).unwrap();
        assert_eq!(r.amount, Money::new(70_000));

        // 10:00 → 12:05 stays at 2h
        let r = calculate_charge(&logic, &request(RentType::Hourly, at(10, 0), 125, false)).unwrap();
        assert_eq!(r.amount, Money::new(80_000));
    }

    #[test]
    fn test_unknown_room_type() {
        let logic = PriceLogic::default();
        let err = calculate_charge(&logic, &request(RentType::Hourly, at(10, 0), 30, false))
            .unwrap_err();
        assert!(matches!(err, CoreError::RoomPriceNotConfigured { .. }));
    }

    #[test]
    fn test_negative_duration() {
        let logic = logic();
        let err = calculate_charge(&logic, &request(RentType::Overnight, at(10, 0), -5, false))
            .unwrap_err();
        assert!(matches!(err, CoreError::CheckoutBeforeCheckIn { .. }));
    }

    #[test]
    fn test_result_wire_format() {
        let logic = logic();
        let r = calculate_charge(&logic, &request(RentType::Hourly, at(10, 0), 300, false)).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["type"], "hourly_mixed");
        assert_eq!(json["details"]["kind"], "hourly");
        assert_eq!(json["details"]["additionalHours"], 4);
        assert_eq!(json["warning"]["suggestedType"], "halfday");
        assert!(json["escalation"].is_null());
    }
}
