//! Shared application state.

use std::sync::Arc;

use innkeep_db::Database;

use crate::auth::JwtManager;
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
        }
    }

    pub fn from_config(db: Database, config: &ServerConfig) -> Self {
        Self::new(db, JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs))
    }
}
