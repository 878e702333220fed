//! # innkeep-db: Database Layer for innkeep
//!
//! SQLite storage for rooms, customers, drinks, rentals and shifts, plus the
//! transactional services that change several of them at once.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        innkeep Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/rentals/checkout)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   innkeep-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service/)    │───►│ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ RentalService │    │ RoomRepo      │    │ 001_initial  │  │   │
//! │  │   │ ShiftService  │    │ RentalRepo    │    │   _schema    │  │   │
//! │  │   │ one tx each   │    │ ShiftRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │            │                                                    │   │
//! │  │            ▼  pricing, bill, ledger math                        │   │
//! │  │       innkeep-core                                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Single-table reads and writes
//! - [`service`] - Rental lifecycle and shift ledger
//!
//! ## Usage
//!
//! ```rust,ignore
//! use innkeep_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("innkeep.db")).await?;
//!
//! let shift = db.shifts().start(&user, None).await?;
//! let rental = db.rentals().create(&user, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    CustomerRelation, CustomerRepository, DrinkRepository, NewDrink, PriceLogicRepository,
    RentalRepository, RoomRepository, RoomTypeRepository, ShiftRepository, UserRepository,
};
pub use service::{
    CheckoutBreakdown, CheckoutPreview, CheckoutRequest, CreateRental, CustomerRef,
    NewAdditionalCar, RentalService, ShiftService, ShiftSummary,
};
