//! # innkeep-server
//!
//! REST API for the front desk: rentals, drink sales and shifts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         innkeep-server                                  │
//! │                                                                         │
//! │  HTTP ──► TraceLayer ──► Router ──► AuthUser (bearer JWT → active user) │
//! │                             │                                           │
//! │                             ▼                                           │
//! │                    handlers (routes/)                                   │
//! │                             │  RentalService / ShiftService             │
//! │                             ▼                                           │
//! │                       innkeep-db ──► SQLite                             │
//! │                                                                         │
//! │  errors: CoreError / DbError ──► ApiError ──► {"status":"fail"|"error"} │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `INNKEEP_HTTP_PORT` - HTTP port (default: 8080)
//! - `INNKEEP_BIND_ADDR` - Interface (default: 0.0.0.0)
//! - `INNKEEP_DB_PATH` - SQLite file (default: ./innkeep.db)
//! - `INNKEEP_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `INNKEEP_JWT_SECRET` - Secret for bearer tokens
//! - `INNKEEP_JWT_LIFETIME_SECS` - Token lifetime (default: 43200)
//! - `RUST_LOG` - Log filter (default: `info,innkeep=debug,sqlx=warn`)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use tracing_subscriber::EnvFilter;

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;

const DEFAULT_LOG_FILTER: &str = "info,innkeep=debug,innkeep_core=debug,innkeep_db=debug,innkeep_server=debug,sqlx=warn";

/// Installs the global tracing subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
