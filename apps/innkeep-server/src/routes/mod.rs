//! HTTP routes.
//!
//! ```text
//! GET  /health                           (no auth)
//! /rentals/...                           rentals.rs
//! /shifts/...                            shifts.rs
//! /price-logic                           price_logic.rs
//! ```
//!
//! Every success is `{"status":"success","data":...}`.

mod price_logic;
mod rentals;
mod shifts;

use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(rentals::router())
        .merge(shifts::router())
        .merge(price_logic::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Envelope and extractors
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    data: T,
}

/// 200 with the success envelope.
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope { status: "success", data })).into_response()
}

/// 201 with the success envelope.
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope { status: "success", data })).into_response()
}

/// `Json` whose rejection is an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejection is an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` whose rejection is an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

async fn health(State(state): State<AppState>) -> Response {
    if state.db.health_check().await {
        ok(serde_json::json!({ "database": "ok" }))
    } else {
        ApiError::Internal("database health check failed".to_string()).into_response()
    }
}

// =============================================================================
// Router tests
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use innkeep_core::pricing::RoomPrice;
    use innkeep_core::{Money, Room, User, UserRole};
    use innkeep_db::{Database, DbConfig, RoomTypeRepository};

    use crate::auth::JwtManager;
    use crate::state::AppState;

    pub struct TestApp {
        pub app: Router,
        pub db: Database,
        pub jwt: std::sync::Arc<JwtManager>,
        pub admin: User,
        pub staff: User,
        pub room: Room,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            let admin = db.users().create("boss", "The Boss", UserRole::Admin).await.unwrap();
            let staff = db.users().create("lan", "Lan Nguyen", UserRole::Staff).await.unwrap();

            let room_type = RoomTypeRepository::new(db.pool().clone())
                .create("Standard")
                .await
                .unwrap();
            let room = db.rooms().create("101", 1, &room_type.id).await.unwrap();
            let mut logic = db.price_logic().get().await.unwrap();
            logic.room_prices.insert(
                room_type.id.clone(),
                RoomPrice {
                    half_day_price: Money::new(300_000),
                    full_day_price: Money::new(500_000),
                },
            );
            db.price_logic().update(logic).await.unwrap();

            let state = AppState::new(db.clone(), JwtManager::new("test-secret", 3600));
            let jwt = state.jwt.clone();

            TestApp {
                app: super::router(state),
                db,
                jwt,
                admin,
                staff,
                room,
            }
        }

        pub fn token(&self, user: &User) -> String {
            self.jwt.issue(user).unwrap()
        }

        /// Sends a request and returns status plus parsed JSON body.
        pub async fn call(
            &self,
            method: Method,
            uri: &str,
            as_user: Option<&User>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user) = as_user {
                builder = builder.header("authorization", format!("Bearer {}", self.token(user)));
            }
            let request = match body {
                Some(json) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::testing::TestApp;

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let t = TestApp::new().await;
        let (status, body) = t.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["database"], "ok");
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let t = TestApp::new().await;
        let (status, body) = t.call(Method::GET, "/rentals/active", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_inactive_user_is_401() {
        let t = TestApp::new().await;
        deactivate_staff(&t).await;
        let (status, _) = t.call(Method::GET, "/rentals/active", Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    async fn deactivate_staff(t: &TestApp) {
        innkeep_db::UserRepository::new(t.db.pool().clone())
            .set_active(&t.staff.id, false)
            .await
            .unwrap();
    }
}
