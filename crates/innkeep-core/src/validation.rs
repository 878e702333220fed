//! # Validation Module
//!
//! Input validation utilities for innkeep.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (axum extractors)                                       │
//! │  └── Type validation (JSON deserialization, enum names)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services (innkeep-db)                                        │
//! │  └── THIS MODULE: ranges, formats, required fields                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity ≥ 1, stock ≥ 0)                       │
//! │  └── Partial UNIQUE indexes (one active shift, one rental per room)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use innkeep_core::validation::{validate_number_of_guests, parse_time_of_day};
//!
//! validate_number_of_guests(2).unwrap();
//! assert_eq!(parse_time_of_day("halfDayStart", "08:30").unwrap(), (8, 30));
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CAR_NUMBER_LEN, MAX_GUESTS, MAX_NOTE_LEN, MAX_PRICE, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a licence plate and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters
/// - Letters, digits, `-` and `.` only (plates are stored as typed)
pub fn validate_car_number(car_number: &str) -> ValidationResult<String> {
    let car_number = car_number.trim();

    if car_number.is_empty() {
        return Err(ValidationError::Required {
            field: "carNumber".to_string(),
        });
    }

    if car_number.chars().count() > MAX_CAR_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "carNumber".to_string(),
            max: MAX_CAR_NUMBER_LEN,
        });
    }

    if !car_number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "carNumber".to_string(),
            reason: "must contain only letters, digits, '-' and '.'".to_string(),
        });
    }

    Ok(car_number.to_string())
}

/// Validates an optional free-text note, returning `None` for blank input.
pub fn validate_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if note.chars().count() > MAX_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LEN,
        });
    }

    Ok(Some(note.to_string()))
}

/// Validates that a string is a UUID (entity ids are UUID v4 strings).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    Ok(())
}

/// Parses an `HH:mm` time of day.
///
/// ## Example
/// ```rust
/// use innkeep_core::validation::parse_time_of_day;
///
/// assert_eq!(parse_time_of_day("halfDayEnd", "20:00").unwrap(), (20, 0));
/// assert!(parse_time_of_day("halfDayEnd", "24:00").is_err());
/// assert!(parse_time_of_day("halfDayEnd", "8am").is_err());
/// ```
pub fn parse_time_of_day(field: &str, value: &str) -> ValidationResult<(u32, u32)> {
    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("expected HH:mm, got '{}'", value),
    };

    let (h, m) = value.trim().split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }

    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }

    Ok((hour, minute))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the number of guests on a rental or additional car.
pub fn validate_number_of_guests(guests: i64) -> ValidationResult<()> {
    if guests < 1 || guests > MAX_GUESTS {
        return Err(ValidationError::OutOfRange {
            field: "numberOfGuests".to_string(),
            min: 1,
            max: MAX_GUESTS,
        });
    }

    Ok(())
}

/// Validates a drink quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a configured price: `0 ≤ price ≤ MAX_PRICE`.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.amount() > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }

    Ok(())
}

/// Validates a caller-supplied amount (discount, surcharge, payment).
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_price(field, amount)
}

/// Validates an integer within an inclusive range.
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_car_number() {
        assert_eq!(validate_car_number("  51F-123.45 ").unwrap(), "51F-123.45");
        assert!(validate_car_number("").is_err());
        assert!(validate_car_number("   ").is_err());
        assert!(validate_car_number("51F 12345").is_err());
        assert!(validate_car_number(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_note() {
        assert_eq!(validate_note(None).unwrap(), None);
        assert_eq!(validate_note(Some("  ")).unwrap(), None);
        assert_eq!(validate_note(Some(" late ")).unwrap(), Some("late".to_string()));
        assert!(validate_note(Some(&"x".repeat(MAX_NOTE_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("roomId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("roomId", "").is_err());
        assert!(validate_id("roomId", "room-101").is_err());
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("t", "00:00").unwrap(), (0, 0));
        assert_eq!(parse_time_of_day("t", "23:59").unwrap(), (23, 59));
        assert!(parse_time_of_day("t", "8:00").is_err());
        assert!(parse_time_of_day("t", "08:60").is_err());
        assert!(parse_time_of_day("t", "0800").is_err());
    }

    #[test]
    fn test_validate_guests() {
        assert!(validate_number_of_guests(1).is_ok());
        assert!(validate_number_of_guests(MAX_GUESTS).is_ok());
        assert!(validate_number_of_guests(0).is_err());
        assert!(validate_number_of_guests(MAX_GUESTS + 1).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(MAX_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("basePrice", Money::zero()).is_ok());
        assert!(validate_price("basePrice", Money::new(MAX_PRICE)).is_ok());
        assert!(validate_price("basePrice", Money::new(-1)).is_err());
        assert!(validate_price("basePrice", Money::new(MAX_PRICE + 1)).is_err());
    }
}
