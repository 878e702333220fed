//! # Domain Types
//!
//! Core domain types used throughout innkeep.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Room       │   │     Rental      │   │     Shift       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  room_id (FK)   │   │  id (UUID)      │       │
//! │  │  number         │   │  rent_type      │   │  user_id        │       │
//! │  │  room_type_id   │   │  charges (JSON) │   │  status         │       │
//! │  │  status         │   │  payment (JSON) │   │  cash/banking   │       │
//! │  └─────────────────┘   └────────┬────────┘   └────────▲────────┘       │
//! │                                 │                     │                 │
//! │            ┌────────────────────┼──────────┐          │                 │
//! │            ▼                    ▼          ▼          │                 │
//! │  ┌─────────────────┐ ┌──────────────┐ ┌───────────────┴──┐              │
//! │  │  RentalDrink    │ │ AdditionalCar│ │ ShiftTransaction │              │
//! │  │  (price snap)   │ │ (walk-in?)   │ │ checkin/checkout │              │
//! │  └─────────────────┘ └──────────────┘ └──────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Time Representation
//! - Rental check-in/check-out are local wall-clock times (`NaiveDateTime`);
//!   the pricing engine reads their hour-of-day.
//! - Audit timestamps (`created_at`, shift start/end) are UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{ChargeWarning, StayDuration};

// =============================================================================
// Users
// =============================================================================

/// Role carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
}

/// A staff member. Login is handled elsewhere; innkeep only reads users.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
}

// =============================================================================
// Rooms
// =============================================================================

/// Occupancy state of a room.
///
/// ```text
///   available ──create──► occupied ──checkout──► cleaning
///       ▲                    │                     │
///       └─────cancel─────────┘                     │
///       └──────────────mark cleaned────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Cleaning,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Cleaning => "cleaning",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    /// Human room number ("101"), unique among active rooms.
    pub number: String,
    pub floor: i64,
    pub room_type_id: String,
    pub status: RoomStatus,
    /// Soft delete flag.
    pub is_active: bool,
}

impl Room {
    /// A room accepts a new rental only when active and available.
    #[inline]
    pub fn can_accept_rental(&self) -> bool {
        self.is_active && self.status == RoomStatus::Available
    }
}

// =============================================================================
// Customers
// =============================================================================

/// A guest, keyed by vehicle plate.
///
/// Walk-ins (no tracked vehicle) receive a synthetic plate `WALKIN-xxxxxxxx`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub car_number: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_walk_in: bool,
    pub visit_count: i64,
    pub total_spent: Money,
    #[ts(as = "Option<String>")]
    pub last_visit_at: Option<NaiveDateTime>,
}

// =============================================================================
// Drinks
// =============================================================================

/// A drink sold by the pack or by the unit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Drink {
    pub id: String,
    pub name: String,
    pub cost_price: Money,
    pub selling_price: Money,
    pub units_per_pack: i64,
    pub pack_stock: i64,
    pub unit_stock: i64,
    pub alert_threshold: i64,
    pub is_active: bool,
}

impl Drink {
    /// Current stock as a [`StockLevel`](crate::stock::StockLevel).
    #[inline]
    pub fn stock(&self) -> crate::stock::StockLevel {
        crate::stock::StockLevel::new(self.units_per_pack, self.pack_stock, self.unit_stock)
    }

    /// `packStock × unitsPerPack + unitStock`.
    #[inline]
    pub fn total_units(&self) -> i64 {
        self.stock().total_units()
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.total_units() <= self.alert_threshold
    }
}

// =============================================================================
// Rent Type
// =============================================================================

/// Billing tier of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RentType {
    Hourly,
    Halfday,
    Overnight,
}

impl RentType {
    pub const ALL: [RentType; 3] = [RentType::Hourly, RentType::Halfday, RentType::Overnight];

    pub fn as_str(&self) -> &'static str {
        match self {
            RentType::Hourly => "hourly",
            RentType::Halfday => "halfday",
            RentType::Overnight => "overnight",
        }
    }
}

impl fmt::Display for RentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "rentType".to_string(),
                allowed: RentType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash at the front desk.
    Cash,
    /// Bank transfer / QR payment.
    Banking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// Payment captured at checkout (recorded, not processed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Amount the customer handed over (cumulative across settlements).
    pub amount: Money,
    /// `max(0, amount − final)`.
    pub change: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

// =============================================================================
// Rental
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Active,
    Completed,
    Cancelled,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        }
    }
}

/// Structured bill of a rental.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Charges {
    pub room: Money,
    pub drinks: Money,
    pub discount: Money,
    pub additional_charge: Money,
    /// `room + drinks`.
    pub subtotal: Money,
    /// `subtotal − discount + additionalCharge`.
    #[serde(rename = "final")]
    pub final_amount: Money,
}

/// A room occupancy.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: String,
    pub room_id: String,
    pub customer_id: String,
    /// User who checked the guest in.
    pub user_id: String,
    pub car_number: String,
    pub number_of_guests: i64,
    #[ts(as = "String")]
    pub check_in_time: NaiveDateTime,
    #[ts(as = "Option<String>")]
    pub check_out_time: Option<NaiveDateTime>,
    pub status: RentalStatus,
    /// Billing tier; overwritten when checkout escalates the stay.
    pub rent_type: RentType,
    /// Tier before an escalation, if one happened.
    pub previous_rent_type: Option<RentType>,
    pub has_warning: bool,
    pub warning_details: Option<ChargeWarning>,
    pub charges: Option<Charges>,
    pub duration: Option<StayDuration>,
    pub payment: Option<PaymentRecord>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub total_amount: Money,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RentalStatus::Active
    }

    /// Completed at checkout but the customer has not paid in full yet.
    #[inline]
    pub fn awaits_payment(&self) -> bool {
        self.status == RentalStatus::Completed && self.payment_status == PaymentStatus::Pending
    }
}

/// A drink line on a rental.
/// Uses snapshot pattern to freeze the drink name and price at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RentalDrink {
    pub id: String,
    pub rental_id: String,
    pub drink_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl RentalDrink {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    Active,
    Left,
}

/// An extra vehicle (and its guests) sharing a rental.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RentalAdditionalCar {
    pub id: String,
    pub rental_id: String,
    pub car_number: String,
    pub customer_id: Option<String>,
    pub is_walk_in: bool,
    pub number_of_guests: i64,
    pub status: CarStatus,
}

/// A rental with everything hanging off it, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RentalDetails {
    #[serde(flatten)]
    pub rental: Rental,
    pub room_number: String,
    pub room_type_id: String,
    pub drinks: Vec<RentalDrink>,
    pub additional_cars: Vec<RentalAdditionalCar>,
}

// =============================================================================
// Shift
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Active,
    Completed,
}

/// A bounded work period. At most one is active system-wide.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
    pub start_cash: Money,
    /// Frozen at close.
    pub cash_amount: Money,
    /// Frozen at close.
    pub banking_amount: Money,
    /// Frozen at close.
    pub total_amount: Money,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Checkin,
    Checkout,
    Deposit,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Processing,
    Completed,
}

/// Snapshot stored with every ledger row (JSON column).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionDetails {
    pub number_of_guests: Option<i64>,
    #[ts(as = "Option<String>")]
    pub check_in_time: Option<NaiveDateTime>,
    #[ts(as = "Option<String>")]
    pub check_out_time: Option<NaiveDateTime>,
    /// What the customer handed over; preferred over `amount` in reports.
    pub customer_payment: Option<Money>,
    /// Change returned, always in cash.
    pub change: Option<Money>,
    pub room_type_id: Option<String>,
    pub rent_type: Option<RentType>,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// One row of the shift ledger. Rows are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTransaction {
    pub id: String,
    /// Shift the row is filed under.
    pub shift_id: String,
    pub rental_id: Option<String>,
    pub room_number: Option<String>,
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub details: TransactionDetails,
    pub check_in_shift_id: Option<String>,
    pub check_out_shift_id: Option<String>,
    pub is_cross_shift: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
