//! HTTP server for the tracker API.
//!
//! This module provides the HTTP surface over the lifecycle core:
//! routing, shared state and middleware. Payload shapes live with the
//! handlers under `apis`.

use crate::apis::{orders, tracking};
use axum::{
	extract::DefaultBodyLimit,
	routing::{get, post, put},
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracker_config::ApiConfig;
use tracker_core::Tracker;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the tracker core for processing requests.
	pub tracker: Arc<Tracker>,
}

/// Starts the HTTP server for the API.
///
/// This function creates and configures the HTTP server with routing,
/// middleware and error handling for the tracker endpoints.
pub async fn start_server(
	api_config: ApiConfig,
	tracker: Arc<Tracker>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { tracker };

	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(orders::place_order).get(orders::order_history))
				.route("/orders/pending", get(orders::pending_orders))
				.route("/orders/{id}/status", put(orders::update_order_status))
				.route("/orders/{id}/reorder", post(orders::reorder))
				.route("/order-tracking", post(tracking::create_tracking))
				.route("/order-tracking/{reference}", get(tracking::get_tracking))
				.route("/order-tracking/{reference}/status", put(tracking::update_status))
				.route("/order-tracking/{reference}/cancel", post(tracking::cancel_order))
				.route("/order-tracking/{reference}/modify", put(tracking::modify_order)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive())
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Tracker API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
