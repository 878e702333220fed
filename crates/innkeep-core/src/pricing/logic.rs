//! PriceLogic: the singleton pricing configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{parse_time_of_day, validate_price, validate_range, ValidationResult};

/// Half-day and full-day prices of one room type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomPrice {
    pub half_day_price: Money,
    pub full_day_price: Money,
}

/// Global pricing configuration (exactly one row exists).
///
/// ## Defaults
/// ```text
/// hourlyThreshold      4h         halfDayStart/End   08:00 / 20:00
/// baseHourPrice        70000      min/maxHalfDay     11h / 12h
/// additionalHourPrice  10000      min/maxFullDay     20h / 24h
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceLogic {
    /// Hours after which an hourly stay is nudged towards half-day (1–10).
    pub hourly_threshold: i64,
    pub base_hour_price: Money,
    pub additional_hour_price: Money,
    /// `HH:mm`
    pub half_day_start: String,
    /// `HH:mm`
    pub half_day_end: String,
    pub min_half_day_hours: i64,
    pub max_half_day_hours: i64,
    pub min_full_day_hours: i64,
    pub max_full_day_hours: i64,
    /// Keyed by room type id.
    pub room_prices: BTreeMap<String, RoomPrice>,
}

impl Default for PriceLogic {
    fn default() -> Self {
        PriceLogic {
            hourly_threshold: 4,
            base_hour_price: Money::new(70_000),
            additional_hour_price: Money::new(10_000),
            half_day_start: "08:00".to_string(),
            half_day_end: "20:00".to_string(),
            min_half_day_hours: 11,
            max_half_day_hours: 12,
            min_full_day_hours: 20,
            max_full_day_hours: 24,
            room_prices: BTreeMap::new(),
        }
    }
}

impl PriceLogic {
    /// Prices for a room type.
    ///
    /// Every tier needs them (hourly warnings quote the half-day price), so a
    /// missing entry is an error rather than a silent zero.
    pub fn room_price(&self, room_type_id: &str) -> CoreResult<RoomPrice> {
        self.room_prices
            .get(room_type_id)
            .copied()
            .ok_or_else(|| CoreError::RoomPriceNotConfigured {
                room_type_id: room_type_id.to_string(),
            })
    }

    /// Half-day window as `(start_hour, end_hour)`.
    pub fn half_day_window(&self) -> ValidationResult<(u32, u32)> {
        let (start, _) = parse_time_of_day("halfDayStart", &self.half_day_start)?;
        let (end, _) = parse_time_of_day("halfDayEnd", &self.half_day_end)?;
        Ok((start, end))
    }

    /// Checks every bound before the config is stored.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_range("hourlyThreshold", self.hourly_threshold, 1, 10)?;
        validate_price("baseHourPrice", self.base_hour_price)?;
        validate_price("additionalHourPrice", self.additional_hour_price)?;
        self.half_day_window()?;

        validate_range("minHalfDayHours", self.min_half_day_hours, 11, 14)?;
        validate_range("maxHalfDayHours", self.max_half_day_hours, 11, 14)?;
        if self.max_half_day_hours <= self.min_half_day_hours {
            return Err(ValidationError::MustExceed {
                field: "maxHalfDayHours".to_string(),
                other: "minHalfDayHours".to_string(),
            });
        }

        validate_range("minFullDayHours", self.min_full_day_hours, 15, 24)?;
        validate_range("maxFullDayHours", self.max_full_day_hours, 15, 24)?;
        if self.max_full_day_hours <= self.min_full_day_hours {
            return Err(ValidationError::MustExceed {
                field: "maxFullDayHours".to_string(),
                other: "minFullDayHours".to_string(),
            });
        }

        for price in self.room_prices.values() {
            validate_price("halfDayPrice", price.half_day_price)?;
            validate_price("fullDayPrice", price.full_day_price)?;
        }

        Ok(())
    }
}
