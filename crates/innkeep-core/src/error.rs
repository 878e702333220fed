//! # Error Types
//!
//! Domain-specific error types for innkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  innkeep-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  innkeep-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  HTTP errors (innkeep-server)                                          │
//! │  └── ApiError         - Status code + {status, message} body           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant belongs to exactly one [`ErrorKind`]; the HTTP boundary maps
//! kinds to status codes, never individual variants.

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification used by the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or out-of-range input.
    Validation,
    /// The request collides with current state (room taken, stock short, ...).
    Conflict,
    /// A referenced entity does not exist.
    NotFound,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist (or was soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Room cannot take a new rental.
    ///
    /// ## When This Occurs
    /// - Room is occupied, being cleaned or under maintenance
    /// - Room was deactivated
    #[error("Room {room_number} is not available (status: {status})")]
    RoomUnavailable { room_number: String, status: String },

    /// A tracked customer may occupy only one room at a time.
    #[error("Customer {car_number} already has an active rental")]
    CustomerHasActiveRental { car_number: String },

    /// The plate is already attached to this rental.
    #[error("Car {car_number} is already attached to this rental")]
    DuplicateCarOnRental { car_number: String },

    /// Only one open walk-in additional car per rental.
    #[error("Rental already has a walk-in additional car")]
    WalkInCarExists,

    /// Drink is inactive and cannot be sold.
    #[error("Drink {name} is not available for sale")]
    DrinkUnavailable { name: String },

    /// Insufficient drink stock to complete the operation.
    ///
    /// ## User Workflow
    /// ```text
    /// Add drinks (Beer ×5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { drink: "Beer", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Nothing written, UI shows "Only 3 Beer in stock"
    /// ```
    #[error("Insufficient stock for {drink}: available {available}, requested {requested}")]
    InsufficientStock {
        drink: String,
        available: i64,
        requested: i64,
    },

    /// Rental is not in a state that allows the requested operation.
    #[error("Rental {rental_id} is {current_status}, cannot perform operation")]
    InvalidRentalStatus {
        rental_id: String,
        current_status: String,
    },

    /// Checkout time precedes check-in time.
    #[error("Checkout time {check_out} is before check-in time {check_in}")]
    CheckoutBeforeCheckIn { check_in: String, check_out: String },

    /// PriceLogic has no half-day/full-day prices for this room type.
    #[error("No room prices configured for room type {room_type_id}")]
    RoomPriceNotConfigured { room_type_id: String },

    /// The caller already has an open shift.
    #[error("You already have an active shift")]
    OwnShiftActive,

    /// Another user's shift is open; only one shift may be active.
    #[error("Another shift is active (opened by {owner}); it must be ended first")]
    ShiftActiveElsewhere { owner: String },

    /// An operation needs the caller's open shift.
    #[error("No active shift")]
    NoActiveShift,

    /// Payment amount is invalid.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Validation(_)
            | CoreError::CheckoutBeforeCheckIn { .. }
            | CoreError::InvalidPayment { .. }
            | CoreError::RoomPriceNotConfigured { .. } => ErrorKind::Validation,
            CoreError::RoomUnavailable { .. }
            | CoreError::CustomerHasActiveRental { .. }
            | CoreError::DuplicateCarOnRental { .. }
            | CoreError::WalkInCarExists
            | CoreError::DrinkUnavailable { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::InvalidRentalStatus { .. }
            | CoreError::OwnShiftActive
            | CoreError::ShiftActiveElsewhere { .. }
            | CoreError::NoActiveShift => ErrorKind::Conflict,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid time of day, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields violate an ordering rule (e.g. max must exceed min).
    #[error("{field} must be greater than {other}")]
    MustExceed { field: String, other: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            drink: "Tiger Beer".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Tiger Beer: available 3, requested 5"
        );

        let err = CoreError::ShiftActiveElsewhere {
            owner: "Lan".to_string(),
        };
        assert!(err.to_string().contains("Lan"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "roomId".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::not_found("Rental", "r1").kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::WalkInCarExists.kind(), ErrorKind::Conflict);
        assert_eq!(CoreError::NoActiveShift.kind(), ErrorKind::Conflict);
        assert_eq!(
            CoreError::CheckoutBeforeCheckIn {
                check_in: "a".into(),
                check_out: "b".into()
            }
            .kind(),
            ErrorKind::Validation
        );
    }
}
