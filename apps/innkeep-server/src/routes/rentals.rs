//! Rental routes.

use axum::extract::State;
use axum::response::Response;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use chrono::NaiveDateTime;
use serde::Deserialize;

use innkeep_core::stock::DrinkOrder;
use innkeep_core::{Money, PaymentMethod, RentType};
use innkeep_db::{CheckoutPreview, CheckoutRequest, CreateRental, NewAdditionalCar};

use super::{created, ok, ApiJson, ApiPath, ApiQuery};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rentals", post(create))
        .route("/rentals/active", get(list_active))
        .route("/rentals/estimate-price", get(estimate_price))
        .route("/rentals/calculate-checkout", post(calculate_checkout))
        .route("/rentals/checkout", post(checkout))
        .route("/rentals/{rental_id}", get(get_rental))
        .route("/rentals/{rental_id}/payment", post(settle_payment))
        .route("/rentals/{rental_id}/check-warning", post(check_warning))
        .route("/rentals/{rental_id}/cancel", post(cancel))
        .route("/rentals/{rental_id}/drinks", post(add_drinks))
        .route(
            "/rentals/{rental_id}/drinks/{drink_id}",
            patch(update_drink).delete(delete_drink),
        )
        .route("/rentals/{rental_id}/cars", post(add_car))
        .route("/rentals/{rental_id}/cars/{car_id}", delete(remove_car))
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateQuery {
    rent_type: String,
    room_type_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentBody {
    customer_payment: Money,
    #[serde(default = "default_method")]
    payment_method: PaymentMethod,
}

fn default_method() -> PaymentMethod {
    PaymentMethod::Cash
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WarningQuery {
    at: Option<NaiveDateTime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelBody {
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrinksBody {
    drinks: Vec<DrinkOrder>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuantityBody {
    change: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /rentals
async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateRental>,
) -> ApiResult<Response> {
    let rental = state.db.rentals().create(&user, req).await?;
    Ok(created(rental))
}

/// GET /rentals/active
async fn list_active(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().list_active().await?))
}

/// GET /rentals/{rental_id}
async fn get_rental(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(rental_id): ApiPath<String>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().get(&rental_id).await?))
}

/// GET /rentals/estimate-price?rentType&roomTypeId
async fn estimate_price(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<EstimateQuery>,
) -> ApiResult<Response> {
    let rent_type: RentType = query.rent_type.parse()?;
    let estimate = state.db.rentals().estimate(rent_type, &query.room_type_id).await?;
    Ok(ok(estimate))
}

/// POST /rentals/calculate-checkout
async fn calculate_checkout(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<CheckoutPreview>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().calculate_checkout(req).await?))
}

/// POST /rentals/checkout
async fn checkout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().checkout(&user, req).await?))
}

/// POST /rentals/{rental_id}/payment
async fn settle_payment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(rental_id): ApiPath<String>,
    ApiJson(body): ApiJson<PaymentBody>,
) -> ApiResult<Response> {
    let rental = state
        .db
        .rentals()
        .settle_payment(&user, &rental_id, body.customer_payment, body.payment_method)
        .await?;
    Ok(ok(rental))
}

/// POST /rentals/{rental_id}/check-warning[?at=]
async fn check_warning(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(rental_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<WarningQuery>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().flag_warning(&rental_id, query.at).await?))
}

/// POST /rentals/{rental_id}/cancel
async fn cancel(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(rental_id): ApiPath<String>,
    ApiJson(body): ApiJson<CancelBody>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().cancel(&rental_id, body.note.as_deref()).await?))
}

/// POST /rentals/{rental_id}/drinks
async fn add_drinks(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(rental_id): ApiPath<String>,
    ApiJson(body): ApiJson<DrinksBody>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().add_drinks(&rental_id, &body.drinks).await?))
}

/// PATCH /rentals/{rental_id}/drinks/{drink_id}
async fn update_drink(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath((rental_id, drink_id)): ApiPath<(String, String)>,
    ApiJson(body): ApiJson<QuantityBody>,
) -> ApiResult<Response> {
    let rental = state
        .db
        .rentals()
        .update_drink_quantity(&rental_id, &drink_id, body.change)
        .await?;
    Ok(ok(rental))
}

/// DELETE /rentals/{rental_id}/drinks/{drink_id}
async fn delete_drink(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath((rental_id, drink_id)): ApiPath<(String, String)>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().delete_drink(&rental_id, &drink_id).await?))
}

/// POST /rentals/{rental_id}/cars
async fn add_car(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(rental_id): ApiPath<String>,
    ApiJson(body): ApiJson<NewAdditionalCar>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().add_additional_car(&rental_id, body).await?))
}

/// DELETE /rentals/{rental_id}/cars/{car_id}
async fn remove_car(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath((rental_id, car_id)): ApiPath<(String, String)>,
) -> ApiResult<Response> {
    Ok(ok(state.db.rentals().remove_additional_car(&rental_id, &car_id).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::testing::TestApp;

    #[tokio::test]
    async fn test_create_then_checkout() {
        let t = TestApp::new().await;
        let (status, body) = t
            .call(
                Method::POST,
                "/rentals",
                Some(&t.staff),
                Some(json!({
                    "roomId": t.room.id,
                    "rentType": "hourly",
                    "checkInTime": "2024-03-01T10:00:00",
                    "numberOfGuests": 2,
                    "mainCustomer": { "carNumber": "51F-11111" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["status"], "success");
        let rental_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = t
            .call(
                Method::POST,
                "/rentals/calculate-checkout",
                Some(&t.staff),
                Some(json!({ "rentalId": rental_id, "checkoutTime": "2024-03-01T10:45:00" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["charges"]["final"], 70_000);

        let (status, body) = t
            .call(
                Method::POST,
                "/rentals/checkout",
                Some(&t.staff),
                Some(json!({
                    "rentalId": rental_id,
                    "paymentMethod": "cash",
                    "customerPayment": 100_000,
                    "checkoutTime": "2024-03-01T12:05:00"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["totalAmount"], 80_000);
        assert_eq!(body["data"]["payment"]["change"], 20_000);
        assert_eq!(body["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_checkout_before_check_in_is_400() {
        let t = TestApp::new().await;
        let (_, body) = t
            .call(
                Method::POST,
                "/rentals",
                Some(&t.staff),
                Some(json!({
                    "roomId": t.room.id,
                    "rentType": "hourly",
                    "checkInTime": "2024-03-01T10:00:00",
                    "numberOfGuests": 1,
                    "mainCustomer": { "isWalkIn": true }
                })),
            )
            .await;
        let rental_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = t
            .call(
                Method::POST,
                "/rentals/checkout",
                Some(&t.staff),
                Some(json!({
                    "rentalId": rental_id,
                    "paymentMethod": "cash",
                    "customerPayment": 100_000,
                    "checkoutTime": "2024-03-01T09:00:00"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_unknown_room_is_404() {
        let t = TestApp::new().await;
        let create = |room_id: &str| {
            json!({
                "roomId": room_id,
                "rentType": "hourly",
                "numberOfGuests": 1,
                "mainCustomer": { "isWalkIn": true }
            })
        };

        let (status, body) = t
            .call(
                Method::POST,
                "/rentals",
                Some(&t.staff),
                Some(create("7f2c1e4a-0000-4000-8000-000000000101")),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
        assert_eq!(body["status"], "fail");

        let (status, body) = t
            .call(Method::POST, "/rentals", Some(&t.staff), Some(create("room-101")))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400_envelope() {
        let t = TestApp::new().await;
        let (status, body) = t
            .call(Method::POST, "/rentals", Some(&t.staff), Some(json!({ "roomId": 5 })))
            .await;
        assert!(status.is_client_error());
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn test_estimate_price() {
        let t = TestApp::new().await;
        let uri = format!("/rentals/estimate-price?rentType=overnight&roomTypeId={}", t.room.room_type_id);
        let (status, body) = t.call(Method::GET, &uri, Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["basePrice"], 500_000);

        let uri = format!("/rentals/estimate-price?rentType=weekly&roomTypeId={}", t.room.room_type_id);
        let (status, _) = t.call(Method::GET, &uri, Some(&t.staff), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
