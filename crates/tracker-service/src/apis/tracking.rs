//! Customer-facing tracking endpoints.
//!
//! These handlers resolve the public reference number, invoke the
//! lifecycle manager and shape the combined tracking-plus-order view the
//! frontend renders.

use crate::apis::ApiError;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracker_types::{Order, OrderChanges, ReferenceNumber, TrackingRecord, TrackingStatus};

/// Request body for creating a tracking record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrackingRequest {
	pub order_id: u64,
}

/// Request body for a status update.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
	pub status: String,
}

/// Combined tracking and order view returned by the tracking endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResponse {
	pub reference_number: String,
	pub status: TrackingStatus,
	pub can_modify: bool,
	pub can_cancel: bool,
	pub created_at: u64,
	pub updated_at: u64,
	pub router_model: String,
	pub num_routers: u32,
	pub site_name: String,
	pub site_address: String,
	pub site_postcode: String,
	pub site_primary_email: String,
	pub site_phone_number: String,
	pub site_contact_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority_level: Option<String>,
	pub vlan_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inside_connections: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_information: Option<String>,
}

impl TrackingResponse {
	fn new(record: TrackingRecord, order: Order) -> Self {
		Self {
			reference_number: record.reference_number.to_string(),
			status: record.status,
			can_modify: record.can_modify,
			can_cancel: record.can_cancel,
			created_at: record.created_at,
			updated_at: record.updated_at,
			router_model: order.router_model,
			num_routers: order.num_routers,
			site_name: order.site.name,
			site_address: order.site.address,
			site_postcode: order.site.postcode,
			site_primary_email: order.site.primary_email,
			site_phone_number: order.site.phone_number,
			site_contact_name: order.site.contact_name,
			priority_level: order.priority_level,
			vlan_type: order.vlans.to_string(),
			inside_connections: order.inside_connections,
			additional_information: order.additional_information,
		}
	}
}

fn parse_reference(raw: &str) -> Result<ReferenceNumber, ApiError> {
	raw.parse()
		.map_err(|_| ApiError::bad_request("INVALID_REFERENCE", format!("Malformed reference number: {}", raw)))
}

fn parse_status(raw: &str) -> Result<TrackingStatus, ApiError> {
	raw.parse()
		.map_err(|_| ApiError::bad_request("INVALID_STATUS", format!("Unknown order status: {}", raw)))
}

/// Handles POST /api/order-tracking requests.
pub async fn create_tracking(
	State(state): State<AppState>,
	Json(request): Json<CreateTrackingRequest>,
) -> Result<Json<TrackingResponse>, ApiError> {
	let record = state.tracker.tracking().create_tracking(request.order_id).await?;
	let order = state.tracker.orders().get_order(record.order_id).await?;
	Ok(Json(TrackingResponse::new(record, order)))
}

/// Handles GET /api/order-tracking/{reference} requests.
pub async fn get_tracking(
	State(state): State<AppState>,
	Path(reference): Path<String>,
) -> Result<Json<TrackingResponse>, ApiError> {
	let reference = parse_reference(&reference)?;
	let record = state.tracker.tracking().get_tracking(&reference).await?;
	let order = state.tracker.orders().get_order(record.order_id).await?;
	Ok(Json(TrackingResponse::new(record, order)))
}

/// Handles PUT /api/order-tracking/{reference}/status requests.
///
/// Reference-keyed updates await the status notification before
/// responding; a notification failure still cannot fail the request.
pub async fn update_status(
	State(state): State<AppState>,
	Path(reference): Path<String>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<TrackingResponse>, ApiError> {
	let reference = parse_reference(&reference)?;
	let status = parse_status(&request.status)?;
	let record = state
		.tracker
		.tracking()
		.update_status(tracker_core::TrackingKey::Reference(&reference), status)
		.await?;
	let order = state.tracker.orders().get_order(record.order_id).await?;
	Ok(Json(TrackingResponse::new(record, order)))
}

/// Handles POST /api/order-tracking/{reference}/cancel requests.
pub async fn cancel_order(
	State(state): State<AppState>,
	Path(reference): Path<String>,
) -> Result<Json<TrackingResponse>, ApiError> {
	let reference = parse_reference(&reference)?;
	let record = state.tracker.tracking().cancel_order(&reference).await?;
	let order = state.tracker.orders().get_order(record.order_id).await?;
	Ok(Json(TrackingResponse::new(record, order)))
}

/// Handles PUT /api/order-tracking/{reference}/modify requests.
pub async fn modify_order(
	State(state): State<AppState>,
	Path(reference): Path<String>,
	Json(changes): Json<OrderChanges>,
) -> Result<Json<TrackingResponse>, ApiError> {
	let reference = parse_reference(&reference)?;
	let order = state.tracker.tracking().modify_order(&reference, changes).await?;
	let record = state.tracker.tracking().get_tracking(&reference).await?;
	Ok(Json(TrackingResponse::new(record, order)))
}
