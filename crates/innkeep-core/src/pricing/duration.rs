//! Elapsed stay time and the billing-hour rounding rule.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::ROUND_UP_AFTER_MINUTES;

/// Elapsed time of a stay.
///
/// ```text
/// 10:00 → 12:05   hours=2 minutes=5    billedHours=2   (5 ≤ 10, truncate)
/// 10:00 → 12:11   hours=2 minutes=11   billedHours=3   (11 > 10, round up)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StayDuration {
    /// Whole hours elapsed.
    pub hours: i64,
    /// Minutes past the last whole hour.
    pub minutes: i64,
    /// Hour count every tier bills on.
    pub billed_hours: i64,
}

impl StayDuration {
    /// Measures `check_in → check_out`.
    pub fn between(check_in: NaiveDateTime, check_out: NaiveDateTime) -> CoreResult<Self> {
        if check_out < check_in {
            return Err(CoreError::CheckoutBeforeCheckIn {
                check_in: check_in.to_string(),
                check_out: check_out.to_string(),
            });
        }

        let total_minutes = (check_out - check_in).num_minutes();
        Ok(Self::from_minutes(total_minutes))
    }

    pub fn from_minutes(total_minutes: i64) -> Self {
        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;
        let billed_hours = if minutes > ROUND_UP_AFTER_MINUTES {
            hours + 1
        } else {
            hours
        };

        StayDuration {
            hours,
            minutes,
            billed_hours,
        }
    }
}
