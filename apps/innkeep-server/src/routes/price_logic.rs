//! Price logic routes.

use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tracing::info;

use innkeep_core::pricing::PriceLogic;

use super::{ok, ApiJson};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/price-logic", get(show).put(update))
}

/// GET /price-logic
async fn show(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Response> {
    Ok(ok(state.db.price_logic().get().await?))
}

/// PUT /price-logic (admin)
async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(logic): ApiJson<PriceLogic>,
) -> ApiResult<Response> {
    user.require_admin()?;
    let logic = state.db.price_logic().update(logic).await?;
    info!(by = %user.0.username, room_types = logic.room_prices.len(), "Price logic updated");
    Ok(ok(logic))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::testing::TestApp;

    #[tokio::test]
    async fn test_update_requires_admin_and_validates() {
        let t = TestApp::new().await;
        let (status, body) = t.call(Method::GET, "/price-logic", Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::OK);
        let mut logic = body["data"].clone();
        assert_eq!(logic["hourlyThreshold"], 4);

        logic["baseHourPrice"] = 80_000.into();
        let (status, _) = t
            .call(Method::PUT, "/price-logic", Some(&t.staff), Some(logic.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = t
            .call(Method::PUT, "/price-logic", Some(&t.admin), Some(logic.clone()))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["baseHourPrice"], 80_000);

        logic["hourlyThreshold"] = 0.into();
        let (status, body) = t.call(Method::PUT, "/price-logic", Some(&t.admin), Some(logic)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }
}
