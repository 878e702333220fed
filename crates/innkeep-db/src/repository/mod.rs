//! # Repository Module
//!
//! Database repository implementations for innkeep.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Handle methods (`&self`)          Connection functions (`conn`)       │
//! │  ───────────────────────           ────────────────────────────        │
//! │  db.rooms().list()                 RoomRepository::occupy(&mut tx, id) │
//! │  db.drinks().get(id)               DrinkRepository::take_units(...)    │
//! │                                                                         │
//! │  acquire a pooled connection       run on whatever connection the      │
//! │  for a single statement            caller holds, usually an open       │
//! │                                    transaction in a service            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services compose the connection functions inside one `pool.begin()`
//! transaction, so every multi-entity mutation commits or rolls back as a
//! unit.
//!
//! ## Available Repositories
//!
//! - [`RoomRepository`] / [`RoomTypeRepository`] - rooms and their status
//! - [`CustomerRepository`] - customers, visit stats, relations
//! - [`DrinkRepository`] - drinks and pack/unit stock
//! - [`PriceLogicRepository`] - the singleton pricing config
//! - [`RentalRepository`] - rentals, drink lines, additional cars
//! - [`ShiftRepository`] - shifts and ledger rows
//! - [`UserRepository`] - staff accounts (read mostly)

pub mod customer;
pub mod drink;
pub mod price_logic;
pub mod rental;
pub mod room;
pub mod shift;
pub mod user;

pub use customer::{CustomerRelation, CustomerRepository};
pub use drink::{DrinkRepository, NewDrink};
pub use price_logic::PriceLogicRepository;
pub use rental::RentalRepository;
pub use room::{RoomRepository, RoomTypeRepository};
pub use shift::ShiftRepository;
pub use user::UserRepository;

/// Generates a new entity id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Decodes a JSON TEXT column.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> crate::error::DbResult<T> {
    serde_json::from_str(raw).map_err(|e| crate::error::DbError::CorruptColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

/// Encodes a value for a JSON TEXT column.
pub(crate) fn encode_json<T: serde::Serialize>(
    column: &str,
    value: &T,
) -> crate::error::DbResult<String> {
    serde_json::to_string(value).map_err(|e| crate::error::DbError::CorruptColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}
