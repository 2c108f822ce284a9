//! Order placement, history and administrative endpoints.

use crate::apis::tracking::UpdateStatusRequest;
use crate::apis::ApiError;
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracker_types::{Order, OrderRequest, TrackingStatus};

/// Order summary returned by the order endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
	pub id: u64,
	pub reference_number: String,
	pub status: TrackingStatus,
	pub created_at: u64,
	pub router_model: String,
	pub num_routers: u32,
	pub site_name: String,
	pub site_primary_email: String,
}

impl From<Order> for OrderResponse {
	fn from(order: Order) -> Self {
		Self {
			id: order.id,
			reference_number: order.reference.to_string(),
			status: order.status,
			created_at: order.created_at,
			router_model: order.router_model,
			num_routers: order.num_routers,
			site_name: order.site.name,
			site_primary_email: order.site.primary_email,
		}
	}
}

/// Query parameters for the order history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
	pub email: Option<String>,
}

/// Request body for reordering an existing order.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
	pub email: String,
}

/// Handles POST /api/orders requests.
pub async fn place_order(
	State(state): State<AppState>,
	Json(request): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
	let order = state.tracker.orders().place_order(request).await?;
	Ok(Json(order.into()))
}

/// Handles GET /api/orders?email= requests.
pub async fn order_history(
	State(state): State<AppState>,
	Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
	let email = query
		.email
		.ok_or_else(|| ApiError::bad_request("VALIDATION", "email query parameter is required"))?;
	let orders = state.tracker.orders().orders_for_email(&email).await?;
	Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Handles GET /api/orders/pending requests.
pub async fn pending_orders(
	State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
	let orders = state.tracker.orders().pending_orders().await?;
	Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Handles PUT /api/orders/{id}/status requests.
///
/// Administrative bulk path: the status notification is queued rather
/// than awaited, so repeated updates are not serialized behind delivery
/// latency.
pub async fn update_order_status(
	State(state): State<AppState>,
	Path(order_id): Path<u64>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
	let status: TrackingStatus = request.status.parse().map_err(|_| {
		ApiError::bad_request("INVALID_STATUS", format!("Unknown order status: {}", request.status))
	})?;
	state.tracker.orders().update_order_status(order_id, status).await?;
	let order = state.tracker.orders().get_order(order_id).await?;
	Ok(Json(order.into()))
}

/// Handles POST /api/orders/{id}/reorder requests.
pub async fn reorder(
	State(state): State<AppState>,
	Path(order_id): Path<u64>,
	Json(request): Json<ReorderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
	let (order, _record) = state.tracker.orders().reorder(order_id, &request.email).await?;
	Ok(Json(order.into()))
}
