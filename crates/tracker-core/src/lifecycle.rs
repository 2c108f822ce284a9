//! The order lifecycle manager.
//!
//! Owns every tracking record mutation: creation, status transitions,
//! customer cancellation and modification. A transition persists the
//! tracking record and the mirrored order status in one guarded batch,
//! then hands the matching notification to the gateway. Notification
//! failure is logged and swallowed; it never affects the committed
//! state.

use crate::stores::{OrderStore, TrackingStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use tracker_notify::NotifierService;
use tracker_storage::{StorageError, StorageService, WriteMode};
use tracker_types::{
	current_timestamp, Notification, Order, OrderChanges, OrderSnapshot, ReferenceNumber,
	TrackingRecord, TrackingStatus,
};

/// Errors that can occur during lifecycle operations.
///
/// Each variant is a synchronous, caller-visible failure that aborts the
/// attempted mutation with no partial state change.
#[derive(Debug, Error)]
pub enum TrackingError {
	/// The referenced order or tracking record does not exist.
	#[error("Not found: {0}")]
	NotFound(String),
	/// The requested customer action is not permitted in the current status.
	#[error("{0}")]
	InvalidState(&'static str),
	/// A tracking record already exists for the order.
	#[error("Tracking already exists for order {0}")]
	AlreadyTracked(u64),
	/// The requested change carries an invalid value.
	#[error("Validation error: {0}")]
	Validation(String),
	/// The storage backend failed.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl TrackingError {
	fn storage(e: StorageError) -> Self {
		TrackingError::Storage(e.to_string())
	}
}

/// Either external key a tracking record can be addressed by.
///
/// Both keys converge on the same lookup and the same transition logic;
/// they differ only in how the status-change notification is dispatched.
#[derive(Debug, Clone, Copy)]
pub enum TrackingKey<'a> {
	/// Public reference number; notifications are awaited.
	Reference(&'a ReferenceNumber),
	/// Internal order id, used by administrative bulk updates;
	/// notifications go through the background queue.
	OrderId(u64),
}

/// The order lifecycle manager.
///
/// Exclusively owns tracking record mutation. The order's status field
/// is a denormalized mirror this service keeps in lockstep with the
/// tracking record through batch writes.
pub struct TrackingService {
	storage: Arc<StorageService>,
	orders: Arc<OrderStore>,
	tracking: Arc<TrackingStore>,
	notifier: Arc<NotifierService>,
}

impl TrackingService {
	pub fn new(
		storage: Arc<StorageService>,
		orders: Arc<OrderStore>,
		tracking: Arc<TrackingStore>,
		notifier: Arc<NotifierService>,
	) -> Self {
		Self {
			storage,
			orders,
			tracking,
			notifier,
		}
	}

	/// Creates the tracking record for an existing order.
	///
	/// The record starts in `Pending` with both permissions granted. The
	/// order must already be persisted; a second call for the same order
	/// fails against the store-level uniqueness guard. Sends a
	/// best-effort confirmation notice to the order's primary contact.
	#[instrument(skip(self))]
	pub async fn create_tracking(&self, order_id: u64) -> Result<TrackingRecord, TrackingError> {
		let order = self.find_order(order_id).await?;

		let record = TrackingRecord::new(order_id, order.reference.clone(), current_timestamp());
		let writes = vec![
			self.tracking
				.record_entry(&record, WriteMode::Insert)
				.map_err(TrackingError::storage)?,
			self.tracking
				.index_entry(&record, WriteMode::Insert)
				.map_err(TrackingError::storage)?,
		];
		self.storage.write_batch(writes).await.map_err(|e| match e {
			StorageError::AlreadyExists => TrackingError::AlreadyTracked(order_id),
			other => TrackingError::storage(other),
		})?;

		tracing::info!(
			order_id,
			reference = %record.reference_number,
			"Created tracking record"
		);

		self.notifier
			.send(Notification::OrderConfirmation {
				recipient: order.site.primary_email.clone(),
				reference: record.reference_number.clone(),
				snapshot: OrderSnapshot::from(&order),
			})
			.await;

		Ok(record)
	}

	/// Exact lookup of a tracking record by its reference number.
	pub async fn get_tracking(
		&self,
		reference: &ReferenceNumber,
	) -> Result<TrackingRecord, TrackingError> {
		self.tracking
			.find_by_reference(reference)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => {
					TrackingError::NotFound(format!("tracking record {}", reference))
				},
				other => TrackingError::storage(other),
			})
	}

	/// Moves a tracking record to `status`.
	///
	/// Permissions are recomputed from the status table, and the order's
	/// mirrored status is persisted in the same batch as the record.
	/// Any status in the table is accepted unconditionally; transitions
	/// are administrator-driven and not restricted to a path.
	#[instrument(skip(self, key), fields(status = %status))]
	pub async fn update_status(
		&self,
		key: TrackingKey<'_>,
		status: TrackingStatus,
	) -> Result<TrackingRecord, TrackingError> {
		let record = self.resolve(key).await?;
		let (record, order) = self.apply_status(record, status).await?;

		tracing::info!(
			reference = %record.reference_number,
			status = %status,
			"Updated order status"
		);

		let notification = Notification::StatusUpdate {
			recipient: order.site.primary_email.clone(),
			reference: record.reference_number.clone(),
			status,
		};
		match key {
			TrackingKey::Reference(_) => self.notifier.send(notification).await,
			// Administrative bulk updates must not serialize behind
			// delivery latency
			TrackingKey::OrderId(_) => self.notifier.dispatch(notification),
		}

		Ok(record)
	}

	/// Cancels an order on the customer's behalf.
	///
	/// Only permitted while the record's `can_cancel` flag is set.
	/// Cancellation is terminal: no transition out of `Cancelled` is
	/// exposed anywhere.
	#[instrument(skip(self))]
	pub async fn cancel_order(
		&self,
		reference: &ReferenceNumber,
	) -> Result<TrackingRecord, TrackingError> {
		let record = self.get_tracking(reference).await?;
		if !record.can_cancel {
			tracing::warn!(%reference, "Cancellation attempted for non-cancellable order");
			return Err(TrackingError::InvalidState(
				"Order cannot be cancelled at this stage",
			));
		}

		let (record, order) = self.apply_status(record, TrackingStatus::Cancelled).await?;
		tracing::info!(%reference, "Order cancelled");

		self.notifier
			.send(Notification::Cancellation {
				recipient: order.site.primary_email.clone(),
				reference: record.reference_number.clone(),
			})
			.await;

		Ok(record)
	}

	/// Applies customer-requested field changes to a modifiable order.
	///
	/// Only the quantity is customer-adjustable. Status and permissions
	/// are untouched.
	#[instrument(skip(self, changes))]
	pub async fn modify_order(
		&self,
		reference: &ReferenceNumber,
		changes: OrderChanges,
	) -> Result<Order, TrackingError> {
		let record = self.get_tracking(reference).await?;
		if !record.can_modify {
			tracing::warn!(%reference, "Modification attempted for non-modifiable order");
			return Err(TrackingError::InvalidState(
				"Order cannot be modified at this stage",
			));
		}

		let mut order = self.find_order(record.order_id).await?;
		if let Some(num_routers) = changes.num_routers {
			if num_routers == 0 {
				return Err(TrackingError::Validation(
					"Number of routers must be at least 1".to_string(),
				));
			}
			order.num_routers = num_routers;
		}

		self.orders.save(&order).await.map_err(TrackingError::storage)?;
		tracing::info!(%reference, "Order modified");

		self.notifier
			.send(Notification::Modification {
				recipient: order.site.primary_email.clone(),
				reference: record.reference_number.clone(),
				snapshot: OrderSnapshot::from(&order),
			})
			.await;

		Ok(order)
	}

	/// Resolves either external key to the tracking record.
	async fn resolve(&self, key: TrackingKey<'_>) -> Result<TrackingRecord, TrackingError> {
		match key {
			TrackingKey::Reference(reference) => self.get_tracking(reference).await,
			TrackingKey::OrderId(order_id) => {
				self.tracking
					.find_by_order_id(order_id)
					.await
					.map_err(|e| match e {
						StorageError::NotFound => TrackingError::NotFound(format!(
							"tracking record for order {}",
							order_id
						)),
						other => TrackingError::storage(other),
					})
			},
		}
	}

	/// Persists a status change on the record and the mirrored order as
	/// one batch.
	async fn apply_status(
		&self,
		mut record: TrackingRecord,
		status: TrackingStatus,
	) -> Result<(TrackingRecord, Order), TrackingError> {
		let mut order = self.find_order(record.order_id).await?;

		record.apply_status(status, current_timestamp());
		order.status = status;

		let writes = vec![
			self.tracking
				.record_entry(&record, WriteMode::Update)
				.map_err(TrackingError::storage)?,
			self.orders
				.entry(&order, WriteMode::Update)
				.map_err(TrackingError::storage)?,
		];
		self.storage
			.write_batch(writes)
			.await
			.map_err(TrackingError::storage)?;

		Ok((record, order))
	}

	async fn find_order(&self, order_id: u64) -> Result<Order, TrackingError> {
		self.orders.find_by_id(order_id).await.map_err(|e| match e {
			StorageError::NotFound => TrackingError::NotFound(format!("order {}", order_id)),
			other => TrackingError::storage(other),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::{harness, order_request, Harness, NotifierMode};
	use tracker_types::TrackingStatus;

	async fn placed_and_tracked(h: &Harness) -> (u64, ReferenceNumber) {
		let order = h.orders.place_order(order_request()).await.unwrap();
		let record = h.tracking.create_tracking(order.id).await.unwrap();
		(order.id, record.reference_number)
	}

	#[tokio::test]
	async fn create_tracking_starts_pending_with_permissions() {
		let h = harness(NotifierMode::Deliver).await;
		let order = h.orders.place_order(order_request()).await.unwrap();

		let record = h.tracking.create_tracking(order.id).await.unwrap();
		assert_eq!(record.order_id, order.id);
		assert_eq!(record.reference_number, order.reference);
		assert_eq!(record.status, TrackingStatus::Pending);
		assert!(record.can_modify);
		assert!(record.can_cancel);

		// Confirmation notice went out
		assert_eq!(h.delivered().len(), 1);
		assert!(h.delivered()[0].subject.contains("Confirmation"));
	}

	#[tokio::test]
	async fn create_tracking_requires_existing_order() {
		let h = harness(NotifierMode::Deliver).await;
		let result = h.tracking.create_tracking(4242).await;
		assert!(matches!(result, Err(TrackingError::NotFound(_))));
		assert!(h.delivered().is_empty());
	}

	#[tokio::test]
	async fn second_create_tracking_is_rejected_by_uniqueness_guard() {
		let h = harness(NotifierMode::Deliver).await;
		let (order_id, _) = placed_and_tracked(&h).await;

		let result = h.tracking.create_tracking(order_id).await;
		assert!(matches!(result, Err(TrackingError::AlreadyTracked(id)) if id == order_id));
	}

	#[tokio::test]
	async fn update_status_follows_the_permission_table_and_mirrors_order() {
		let h = harness(NotifierMode::Deliver).await;

		for status in TrackingStatus::all() {
			let (order_id, reference) = placed_and_tracked(&h).await;

			let record = h
				.tracking
				.update_status(TrackingKey::Reference(&reference), status)
				.await
				.unwrap();

			let expected = status.permissions();
			assert_eq!(record.status, status);
			assert_eq!(record.can_modify, expected.can_modify);
			assert_eq!(record.can_cancel, expected.can_cancel);

			// Mirror must match the tracking record after the call
			let order = h.order_store.find_by_id(order_id).await.unwrap();
			assert_eq!(order.status, status);
		}
	}

	#[tokio::test]
	async fn update_status_by_order_id_shares_the_same_path() {
		let h = harness(NotifierMode::Deliver).await;
		let (order_id, reference) = placed_and_tracked(&h).await;

		let record = h
			.tracking
			.update_status(TrackingKey::OrderId(order_id), TrackingStatus::Confirmed)
			.await
			.unwrap();
		assert_eq!(record.reference_number, reference);
		assert_eq!(record.status, TrackingStatus::Confirmed);
		assert!(!record.can_modify);

		let order = h.order_store.find_by_id(order_id).await.unwrap();
		assert_eq!(order.status, TrackingStatus::Confirmed);
	}

	#[tokio::test]
	async fn cancel_is_gated_on_the_permission_flag() {
		let h = harness(NotifierMode::Deliver).await;
		let (order_id, reference) = placed_and_tracked(&h).await;

		h.tracking
			.update_status(TrackingKey::Reference(&reference), TrackingStatus::Confirmed)
			.await
			.unwrap();

		// Confirmed orders are locked
		let result = h.tracking.cancel_order(&reference).await;
		assert!(matches!(result, Err(TrackingError::InvalidState(_))));

		let order = h.order_store.find_by_id(order_id).await.unwrap();
		assert_eq!(order.status, TrackingStatus::Confirmed);
	}

	#[tokio::test]
	async fn cancel_is_terminal() {
		let h = harness(NotifierMode::Deliver).await;
		let (order_id, reference) = placed_and_tracked(&h).await;

		let record = h.tracking.cancel_order(&reference).await.unwrap();
		assert_eq!(record.status, TrackingStatus::Cancelled);
		assert!(!record.can_modify);
		assert!(!record.can_cancel);

		let order = h.order_store.find_by_id(order_id).await.unwrap();
		assert_eq!(order.status, TrackingStatus::Cancelled);

		// A second cancellation must fail
		let result = h.tracking.cancel_order(&reference).await;
		assert!(matches!(result, Err(TrackingError::InvalidState(_))));
	}

	#[tokio::test]
	async fn modify_changes_quantity_but_never_status() {
		let h = harness(NotifierMode::Deliver).await;
		let (order_id, reference) = placed_and_tracked(&h).await;

		let order = h
			.tracking
			.modify_order(
				&reference,
				OrderChanges {
					num_routers: Some(5),
				},
			)
			.await
			.unwrap();
		assert_eq!(order.num_routers, 5);
		assert_eq!(order.status, TrackingStatus::Pending);

		let record = h.tracking.get_tracking(&reference).await.unwrap();
		assert_eq!(record.status, TrackingStatus::Pending);
		assert!(record.can_modify && record.can_cancel);

		let stored = h.order_store.find_by_id(order_id).await.unwrap();
		assert_eq!(stored.num_routers, 5);
	}

	#[tokio::test]
	async fn modify_is_gated_and_rejects_zero_quantity() {
		let h = harness(NotifierMode::Deliver).await;
		let (_, reference) = placed_and_tracked(&h).await;

		let result = h
			.tracking
			.modify_order(
				&reference,
				OrderChanges {
					num_routers: Some(0),
				},
			)
			.await;
		assert!(matches!(result, Err(TrackingError::Validation(_))));

		h.tracking
			.update_status(TrackingKey::Reference(&reference), TrackingStatus::InProduction)
			.await
			.unwrap();
		let result = h
			.tracking
			.modify_order(
				&reference,
				OrderChanges {
					num_routers: Some(2),
				},
			)
			.await;
		assert!(matches!(result, Err(TrackingError::InvalidState(_))));
	}

	#[tokio::test]
	async fn lifecycle_survives_a_failing_gateway() {
		// Every delivery attempt fails; persisted state must match the
		// healthy-gateway case exactly
		let h = harness(NotifierMode::Fail).await;
		let order = h.orders.place_order(order_request()).await.unwrap();

		let record = h.tracking.create_tracking(order.id).await.unwrap();
		assert_eq!(record.status, TrackingStatus::Pending);

		let record = h
			.tracking
			.update_status(
				TrackingKey::Reference(&record.reference_number),
				TrackingStatus::Pending,
			)
			.await
			.unwrap();

		let order = h
			.tracking
			.modify_order(
				&record.reference_number,
				OrderChanges {
					num_routers: Some(3),
				},
			)
			.await
			.unwrap();
		assert_eq!(order.num_routers, 3);

		let record = h.tracking.cancel_order(&record.reference_number).await.unwrap();
		assert_eq!(record.status, TrackingStatus::Cancelled);

		let stored = h.order_store.find_by_id(order.id).await.unwrap();
		assert_eq!(stored.status, TrackingStatus::Cancelled);
		assert_eq!(stored.num_routers, 3);
		assert!(h.delivered().is_empty());
	}

	#[tokio::test]
	async fn full_lifecycle_scenario() {
		let h = harness(NotifierMode::Deliver).await;

		// Place, track, confirm, then attempt to cancel
		let order = h.orders.place_order(order_request()).await.unwrap();
		let record = h.tracking.create_tracking(order.id).await.unwrap();
		assert_eq!(record.status, TrackingStatus::Pending);
		assert!(record.can_modify && record.can_cancel);

		let record = h
			.tracking
			.update_status(
				TrackingKey::Reference(&record.reference_number),
				TrackingStatus::Confirmed,
			)
			.await
			.unwrap();
		assert!(!record.can_modify && !record.can_cancel);
		let stored = h.order_store.find_by_id(order.id).await.unwrap();
		assert_eq!(stored.status, TrackingStatus::Confirmed);

		let result = h.tracking.cancel_order(&record.reference_number).await;
		assert!(matches!(result, Err(TrackingError::InvalidState(_))));
	}
}
