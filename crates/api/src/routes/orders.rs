//! Order endpoints: placement, reads, status changes and shipping info.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderStatus};
use domain::{OrderService, PlaceOrder, UpdateOrderStatus, UpdateShippingInfo};
use order_store::{Order, OrderStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub order_service: OrderService<S>,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub payment_info: Option<serde_json::Value>,
}

// -- Response types --

/// Envelope used by the shipping-info endpoint.
#[derive(Serialize)]
pub struct DataResponse<T> {
    pub status: bool,
    pub data: T,
}

// -- Handlers --

/// POST /orders — place an order at checkout.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.order_service.place_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — list all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.order_service.list_orders().await?))
}

/// GET /orders/{id} — load one order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.order_service.get_order(order_id).await?))
}

/// DELETE /orders/{id} — hard-delete an order and its items.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.order_service.delete_order(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /orders/{id}/status — change the status of an order.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status: OrderStatus = req
        .status
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("status is required".to_string()))?
        .parse()
        .map_err(|e: common::ParseStatusError| ApiError::BadRequest(e.to_string()))?;

    let cmd = UpdateOrderStatus {
        order_id,
        status,
        payment_method: req.payment_method,
        payment_info: req.payment_info,
    };

    Ok(Json(state.order_service.update_order_status(cmd).await?))
}

/// POST /orders/shipping-info — record shipping details and notify the
/// customer.
#[tracing::instrument(skip(state, req))]
pub async fn shipping_info<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<UpdateShippingInfo>,
) -> Result<Json<DataResponse<Order>>, ApiError> {
    let order = state.order_service.update_shipping_info(req).await?;
    Ok(Json(DataResponse {
        status: true,
        data: order,
    }))
}

/// Ids that do not parse cannot name an existing order.
fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse().map_err(|_| ApiError::order_not_found())
}
