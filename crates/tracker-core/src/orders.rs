//! Order placement, history queries and reorder.
//!
//! Placement validates the request, allocates an id and a reference
//! number, and persists the order in `Pending`. Reorder copies every
//! descriptive field of an existing order into a fresh one and creates
//! its tracking record in the same batch, so a crash can never leave an
//! order without tracking.

use crate::lifecycle::{TrackingError, TrackingKey, TrackingService};
use crate::stores::{OrderStore, TrackingStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use tracker_notify::NotifierService;
use tracker_storage::{StorageError, StorageService, WriteMode};
use tracker_types::{
	current_timestamp, Notification, Order, OrderRequest, OrderSnapshot, ReferenceNumber,
	SiteContact, TrackingRecord, TrackingStatus, MAX_ADDITIONAL_INFO_LEN,
};

/// Errors that can occur while placing or querying orders.
#[derive(Debug, Error)]
pub enum OrderError {
	/// The referenced order does not exist.
	#[error("Order not found: {0}")]
	NotFound(u64),
	/// The caller does not own the order.
	#[error("Unauthorized to reorder this order")]
	Unauthorized,
	/// The request carries an invalid value.
	#[error("Validation error: {0}")]
	Validation(String),
	/// The storage backend failed.
	#[error("Storage error: {0}")]
	Storage(String),
	/// A delegated lifecycle operation failed.
	#[error(transparent)]
	Tracking(#[from] TrackingError),
}

impl OrderError {
	fn storage(e: StorageError) -> Self {
		OrderError::Storage(e.to_string())
	}
}

/// Service for placing orders and querying order history.
pub struct OrderService {
	storage: Arc<StorageService>,
	orders: Arc<OrderStore>,
	tracking_store: Arc<TrackingStore>,
	tracking: Arc<TrackingService>,
	notifier: Arc<NotifierService>,
}

impl OrderService {
	pub fn new(
		storage: Arc<StorageService>,
		orders: Arc<OrderStore>,
		tracking_store: Arc<TrackingStore>,
		tracking: Arc<TrackingService>,
		notifier: Arc<NotifierService>,
	) -> Self {
		Self {
			storage,
			orders,
			tracking_store,
			tracking,
			notifier,
		}
	}

	/// Validates and persists a new order.
	///
	/// The order receives a freshly generated reference number and starts
	/// in `Pending`. Tracking creation is the caller's next step via
	/// [`TrackingService::create_tracking`].
	#[instrument(skip_all)]
	pub async fn place_order(&self, request: OrderRequest) -> Result<Order, OrderError> {
		validate_request(&request)?;

		let id = self.orders.allocate_id().await.map_err(OrderError::storage)?;
		let order = build_order(id, ReferenceNumber::generate(), request, current_timestamp());

		self.orders.insert(&order).await.map_err(OrderError::storage)?;
		tracing::info!(order_id = id, reference = %order.reference, "Order placed");

		Ok(order)
	}

	/// Looks up an order by id.
	pub async fn get_order(&self, order_id: u64) -> Result<Order, OrderError> {
		self.orders.find_by_id(order_id).await.map_err(|e| match e {
			StorageError::NotFound => OrderError::NotFound(order_id),
			other => OrderError::storage(other),
		})
	}

	/// Places a new order copying an existing one.
	///
	/// Only the order's owner (its stored primary contact) may reorder.
	/// Every descriptive field is copied; the id, reference number and
	/// creation timestamp are fresh, the status resets to `Pending` and
	/// the primary contact becomes the requester. The new order and its
	/// tracking record are written as one batch.
	#[instrument(skip(self))]
	pub async fn reorder(
		&self,
		order_id: u64,
		requester_email: &str,
	) -> Result<(Order, TrackingRecord), OrderError> {
		let original = self.get_order(order_id).await?;

		// Confirm ownership
		if original.site.primary_email != requester_email {
			tracing::warn!(order_id, "Reorder attempted by non-owner");
			return Err(OrderError::Unauthorized);
		}

		let id = self.orders.allocate_id().await.map_err(OrderError::storage)?;
		let now = current_timestamp();
		let order = Order {
			id,
			reference: ReferenceNumber::generate(),
			site: SiteContact {
				primary_email: requester_email.to_string(),
				..original.site.clone()
			},
			created_at: now,
			status: TrackingStatus::Pending,
			..original
		};
		let record = TrackingRecord::new(id, order.reference.clone(), now);

		let writes = vec![
			self.orders
				.entry(&order, WriteMode::Insert)
				.map_err(OrderError::storage)?,
			self.tracking_store
				.record_entry(&record, WriteMode::Insert)
				.map_err(OrderError::storage)?,
			self.tracking_store
				.index_entry(&record, WriteMode::Insert)
				.map_err(OrderError::storage)?,
		];
		self.storage.write_batch(writes).await.map_err(OrderError::storage)?;

		tracing::info!(
			original_id = order_id,
			order_id = id,
			reference = %order.reference,
			"Order reissued"
		);

		self.notifier
			.send(Notification::OrderConfirmation {
				recipient: order.site.primary_email.clone(),
				reference: order.reference.clone(),
				snapshot: OrderSnapshot::from(&order),
			})
			.await;

		Ok((order, record))
	}

	/// Administrative status update keyed by order id.
	///
	/// Delegates to the lifecycle manager so both entry points share the
	/// same transition logic; the notification goes through the
	/// background queue.
	pub async fn update_order_status(
		&self,
		order_id: u64,
		status: TrackingStatus,
	) -> Result<TrackingRecord, OrderError> {
		Ok(self
			.tracking
			.update_status(TrackingKey::OrderId(order_id), status)
			.await?)
	}

	/// Returns the orders owned by `email`, oldest first.
	pub async fn orders_for_email(&self, email: &str) -> Result<Vec<Order>, OrderError> {
		self.orders.find_by_email(email).await.map_err(OrderError::storage)
	}

	/// Returns the orders still awaiting approval.
	pub async fn pending_orders(&self) -> Result<Vec<Order>, OrderError> {
		self.orders
			.find_by_status(TrackingStatus::Pending)
			.await
			.map_err(OrderError::storage)
	}

	/// Returns every stored order.
	pub async fn all_orders(&self) -> Result<Vec<Order>, OrderError> {
		self.orders.find_all().await.map_err(OrderError::storage)
	}
}

fn validate_request(request: &OrderRequest) -> Result<(), OrderError> {
	if request.site_primary_email.trim().is_empty() || !request.site_primary_email.contains('@') {
		return Err(OrderError::Validation(
			"A valid primary contact email is required".to_string(),
		));
	}
	if let Some(info) = &request.additional_information {
		if info.len() > MAX_ADDITIONAL_INFO_LEN {
			return Err(OrderError::Validation(format!(
				"Additional information must not exceed {} characters",
				MAX_ADDITIONAL_INFO_LEN
			)));
		}
	}
	Ok(())
}

fn build_order(id: u64, reference: ReferenceNumber, request: OrderRequest, now: u64) -> Order {
	Order {
		id,
		reference,
		customer_id: request.customer_id,
		router_id: request.router_id,
		router_model: request.router_model,
		router_preset_id: request.router_preset_id,
		primary_outside_connections: request.primary_outside_connections,
		secondary_outside_connections: request.secondary_outside_connections,
		inside_connections: request.inside_connections,
		vlans: request.vlans,
		dhcp: request.dhcp,
		num_routers: request.num_routers.filter(|n| *n > 0).unwrap_or(1),
		site: SiteContact {
			name: request.site_name,
			address: request.site_address,
			postcode: request.site_postcode,
			primary_email: request.site_primary_email,
			secondary_email: request.site_secondary_email,
			phone_number: request.site_phone_number,
			contact_name: request.site_contact_name,
		},
		priority_level: request.priority_level,
		additional_information: request.additional_information,
		created_at: now,
		status: TrackingStatus::Pending,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::{harness, order_request, NotifierMode};

	#[tokio::test]
	async fn place_order_defaults_quantity_and_assigns_reference() {
		let h = harness(NotifierMode::Deliver).await;

		let mut request = order_request();
		request.num_routers = None;
		let order = h.orders.place_order(request).await.unwrap();

		assert_eq!(order.num_routers, 1);
		assert_eq!(order.status, TrackingStatus::Pending);
		assert!(ReferenceNumber::is_valid(order.reference.as_str()));

		let stored = h.order_store.find_by_id(order.id).await.unwrap();
		assert_eq!(stored.reference, order.reference);
	}

	#[tokio::test]
	async fn place_order_rejects_oversized_additional_information() {
		let h = harness(NotifierMode::Deliver).await;

		let mut request = order_request();
		request.additional_information = Some("x".repeat(MAX_ADDITIONAL_INFO_LEN + 1));
		let result = h.orders.place_order(request).await;
		assert!(matches!(result, Err(OrderError::Validation(_))));

		let mut request = order_request();
		request.site_primary_email = "not-an-email".to_string();
		let result = h.orders.place_order(request).await;
		assert!(matches!(result, Err(OrderError::Validation(_))));
	}

	#[tokio::test]
	async fn reorder_requires_ownership() {
		let h = harness(NotifierMode::Deliver).await;
		let order = h.orders.place_order(order_request()).await.unwrap();

		let result = h.orders.reorder(order.id, "alice@example.com").await;
		assert!(matches!(result, Err(OrderError::Unauthorized)));

		let result = h.orders.reorder(9999, "test@example.com").await;
		assert!(matches!(result, Err(OrderError::NotFound(9999))));
	}

	#[tokio::test]
	async fn reorder_copies_fields_and_creates_tracking_atomically() {
		let h = harness(NotifierMode::Deliver).await;

		let mut request = order_request();
		request.num_routers = Some(4);
		let original = h.orders.place_order(request).await.unwrap();
		h.tracking.create_tracking(original.id).await.unwrap();
		h.orders
			.update_order_status(original.id, TrackingStatus::Delivered)
			.await
			.unwrap();

		let (order, record) = h
			.orders
			.reorder(original.id, "test@example.com")
			.await
			.unwrap();

		assert_ne!(order.id, original.id);
		assert_ne!(order.reference, original.reference);
		assert_eq!(order.num_routers, 4);
		assert_eq!(order.router_model, original.router_model);
		assert_eq!(order.site.name, original.site.name);
		assert_eq!(order.site.primary_email, "test@example.com");
		assert_eq!(order.status, TrackingStatus::Pending);

		// Tracking exists immediately, no separate create step
		assert_eq!(record.status, TrackingStatus::Pending);
		let found = h.tracking.get_tracking(&record.reference_number).await.unwrap();
		assert_eq!(found.order_id, order.id);
	}

	#[tokio::test]
	async fn history_queries_filter_by_email_and_status() {
		let h = harness(NotifierMode::Deliver).await;

		let first = h.orders.place_order(order_request()).await.unwrap();
		let second = h.orders.place_order(order_request()).await.unwrap();
		let mut other = order_request();
		other.site_primary_email = "someone-else@example.com".to_string();
		let third = h.orders.place_order(other).await.unwrap();

		h.tracking.create_tracking(first.id).await.unwrap();
		h.orders
			.update_order_status(first.id, TrackingStatus::Confirmed)
			.await
			.unwrap();

		let mine = h.orders.orders_for_email("test@example.com").await.unwrap();
		assert_eq!(
			mine.iter().map(|o| o.id).collect::<Vec<_>>(),
			vec![first.id, second.id]
		);

		let pending = h.orders.pending_orders().await.unwrap();
		assert_eq!(
			pending.iter().map(|o| o.id).collect::<Vec<_>>(),
			vec![second.id, third.id]
		);

		assert_eq!(h.orders.all_orders().await.unwrap().len(), 3);
	}
}
