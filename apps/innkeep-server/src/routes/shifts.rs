//! Shift routes.

use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use innkeep_core::Money;

use super::{ok, ApiJson, ApiPath};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shifts/start", post(start))
        .route("/shifts/end", post(end))
        .route("/shifts/current", get(current))
        .route("/shifts/current/report", get(current_report))
        .route("/shifts/all", get(list_all))
        .route("/shifts/{shift_id}/summary", get(summary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartBody {
    start_cash: Option<Money>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndBody {
    note: Option<String>,
}

/// POST /shifts/start
async fn start(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<StartBody>,
) -> ApiResult<Response> {
    Ok(ok(state.db.shifts().start(&user, body.start_cash).await?))
}

/// POST /shifts/end
async fn end(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<EndBody>,
) -> ApiResult<Response> {
    Ok(ok(state.db.shifts().end(&user, body.note.as_deref()).await?))
}

/// GET /shifts/current (`data: null` when the caller has no open shift)
async fn current(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Response> {
    Ok(ok(state.db.shifts().current(&user).await?))
}

/// GET /shifts/current/report
async fn current_report(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Response> {
    Ok(ok(state.db.shifts().current_report(&user).await?))
}

/// GET /shifts/{shift_id}/summary
async fn summary(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(shift_id): ApiPath<String>,
) -> ApiResult<Response> {
    Ok(ok(state.db.shifts().summary(&shift_id).await?))
}

/// GET /shifts/all (admin)
async fn list_all(State(state): State<AppState>, user: AuthUser) -> ApiResult<Response> {
    user.require_admin()?;
    Ok(ok(state.db.shifts().list_all().await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::testing::TestApp;

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let t = TestApp::new().await;
        let (status, body) = t
            .call(Method::POST, "/shifts/start", Some(&t.staff), Some(json!({ "startCash": 500000 })))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["status"], "active");

        let (status, body) = t
            .call(Method::POST, "/shifts/start", Some(&t.admin), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert!(body["message"].as_str().unwrap().contains("Lan Nguyen"));

        let (_, body) = t.call(Method::GET, "/shifts/all", Some(&t.admin), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_current_and_report() {
        let t = TestApp::new().await;
        let (status, body) = t.call(Method::GET, "/shifts/current", Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_null());

        let (status, _) = t.call(Method::GET, "/shifts/current/report", Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        t.call(Method::POST, "/shifts/start", Some(&t.staff), Some(json!({}))).await;
        let (status, body) = t.call(Method::GET, "/shifts/current/report", Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["totals"]["totalAmount"], 0);

        let (status, body) = t
            .call(Method::POST, "/shifts/end", Some(&t.staff), Some(json!({ "note": "done" })))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_list_all_is_admin_only() {
        let t = TestApp::new().await;
        let (status, body) = t.call(Method::GET, "/shifts/all", Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_unknown_summary_is_404() {
        let t = TestApp::new().await;
        let (status, _) = t.call(Method::GET, "/shifts/nope/summary", Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
