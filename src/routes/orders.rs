use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderHistoryQuery, OrderListResponse, OrderResponse},
    error::{AppError, AppResult},
    services::{normalize_email, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_orders).post(create_order))
}

#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("email" = String, Query, description = "Customer email the orders were placed under"),
    ),
    responses(
        (status = 200, description = "Orders for that customer, newest first", body = OrderListResponse),
        (status = 400, description = "Missing email query parameter"),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderHistoryQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let email = query
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing email query parameter".to_string()))?;

    let orders = order_service::list_orders_by_email(&state, &email).await?;
    Ok(Json(OrderListResponse { orders }))
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "The persisted order with its items and linked user", body = OrderResponse),
        (status = 400, description = "Empty or invalid item list, or a referenced product no longer exists"),
        (status = 409, description = "Client-supplied order number already exists"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    let order = order_service::create_order(&state, payload).await?;
    Ok(Json(OrderResponse { order }))
}
