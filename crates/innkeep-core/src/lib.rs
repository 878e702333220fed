//! # innkeep-core: Pure Business Logic for innkeep
//!
//! This crate is the **heart** of innkeep. It contains the stay pricing
//! engine, checkout bill math, drink stock arithmetic and the shift ledger
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        innkeep Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 innkeep-server (axum REST API)                  │   │
//! │  │      /rentals  /rentals/checkout  /shifts  /price-logic         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    innkeep-db (services)                        │   │
//! │  │        RentalService ──CheckoutEvent──► ShiftService            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ innkeep-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │   bill    │  │   stock   │  │  ledger   │  │   │
//! │  │   │  tiers    │  │  charges  │  │  packs +  │  │ LedgerEntry│ │   │
//! │  │   │  estimate │  │  change   │  │  units    │  │  totals   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Room, Rental, Shift, ShiftTransaction, ...)
//! - [`money`] - Integer money in the smallest currency unit
//! - [`pricing`] - Price Calculation Engine and PriceLogic config
//! - [`bill`] - Checkout charges and payment change
//! - [`stock`] - Pack/unit drink stock
//! - [`ledger`] - Shift ledger classification and totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use innkeep_core::pricing::{calculate_charge, ChargeRequest, PriceLogic, RoomPrice};
//! use innkeep_core::{Money, RentType};
//!
//! let mut logic = PriceLogic::default();
//! logic.room_prices.insert(
//!     "standard".to_string(),
//!     RoomPrice { half_day_price: Money::new(300_000), full_day_price: Money::new(500_000) },
//! );
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let charge = calculate_charge(&logic, &ChargeRequest {
//!     check_in: day.and_hms_opt(10, 0, 0).unwrap(),
//!     check_out: day.and_hms_opt(12, 5, 0).unwrap(),
//!     rent_type: RentType::Hourly,
//!     room_type_id: "standard",
//!     has_prior_warning: false,
//! }).unwrap();
//!
//! assert_eq!(charge.amount, Money::new(80_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod error;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minutes past the hour after which a stay bills the next hour.
pub const ROUND_UP_AFTER_MINUTES: i64 = 10;

/// Upper bound for any configured price or caller-supplied amount.
pub const MAX_PRICE: i64 = 100_000_000;

/// Guests per rental or additional car.
pub const MAX_GUESTS: i64 = 20;

/// Quantity of a single drink line.
pub const MAX_QUANTITY: i64 = 999;

pub const MAX_CAR_NUMBER_LEN: usize = 20;

pub const MAX_NOTE_LEN: usize = 500;

/// Prefix of the synthetic plate given to walk-in guests.
pub const WALK_IN_PREFIX: &str = "WALKIN-";
