//! Typed store wrappers over the storage service.
//!
//! Both external keys for a tracking record (reference number, order id)
//! resolve through [`TrackingStore`], so every caller shares one lookup
//! path. The stores also build the guarded batch entries the lifecycle
//! manager combines into its transactional writes.

use std::sync::Arc;
use tracker_storage::{BatchWrite, StorageError, StorageService, WriteMode};
use tracker_types::{Order, ReferenceNumber, StorageKey, TrackingRecord, TrackingStatus};

/// Name of the order id sequence.
const ORDER_SEQUENCE: &str = "orders";

/// Keyed access to persisted orders.
pub struct OrderStore {
	storage: Arc<StorageService>,
}

impl OrderStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Allocates the next order id.
	pub async fn allocate_id(&self) -> Result<u64, StorageError> {
		self.storage.next_sequence(ORDER_SEQUENCE).await
	}

	/// Looks up an order by id.
	pub async fn find_by_id(&self, id: u64) -> Result<Order, StorageError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), &id.to_string())
			.await
	}

	/// Persists a new order. Fails if the id is already taken.
	pub async fn insert(&self, order: &Order) -> Result<(), StorageError> {
		self.storage
			.create(StorageKey::Orders.as_str(), &order.id.to_string(), order)
			.await
	}

	/// Persists changes to an existing order.
	pub async fn save(&self, order: &Order) -> Result<(), StorageError> {
		self.storage
			.update(StorageKey::Orders.as_str(), &order.id.to_string(), order)
			.await
	}

	/// Returns the orders whose primary contact is `email`, oldest first.
	pub async fn find_by_email(&self, email: &str) -> Result<Vec<Order>, StorageError> {
		let mut orders: Vec<Order> = self
			.storage
			.list(StorageKey::Orders.as_str())
			.await?
			.into_iter()
			.filter(|order: &Order| order.site.primary_email == email)
			.collect();
		orders.sort_by_key(|order| order.id);
		Ok(orders)
	}

	/// Returns the orders currently in `status`, oldest first.
	pub async fn find_by_status(&self, status: TrackingStatus) -> Result<Vec<Order>, StorageError> {
		let mut orders: Vec<Order> = self
			.storage
			.list(StorageKey::Orders.as_str())
			.await?
			.into_iter()
			.filter(|order: &Order| order.status == status)
			.collect();
		orders.sort_by_key(|order| order.id);
		Ok(orders)
	}

	/// Returns every stored order, oldest first.
	pub async fn find_all(&self) -> Result<Vec<Order>, StorageError> {
		let mut orders: Vec<Order> = self.storage.list(StorageKey::Orders.as_str()).await?;
		orders.sort_by_key(|order| order.id);
		Ok(orders)
	}

	/// Builds a guarded batch entry for this order.
	pub fn entry(&self, order: &Order, mode: WriteMode) -> Result<BatchWrite, StorageError> {
		self.storage
			.entry(StorageKey::Orders.as_str(), &order.id.to_string(), order, mode)
	}
}

/// Keyed access to persisted tracking records.
///
/// Records are stored under their reference number with a secondary
/// index from order id to reference. Inserts go through batch entries so
/// the index and the record land together and the order-id uniqueness
/// guard always runs.
pub struct TrackingStore {
	storage: Arc<StorageService>,
}

impl TrackingStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Exact, case-sensitive lookup by reference number.
	pub async fn find_by_reference(
		&self,
		reference: &ReferenceNumber,
	) -> Result<TrackingRecord, StorageError> {
		self.storage
			.retrieve(StorageKey::Tracking.as_str(), reference.as_str())
			.await
	}

	/// Lookup by the order the record shadows.
	pub async fn find_by_order_id(&self, order_id: u64) -> Result<TrackingRecord, StorageError> {
		let reference: ReferenceNumber = self
			.storage
			.retrieve(StorageKey::TrackingByOrder.as_str(), &order_id.to_string())
			.await?;
		self.find_by_reference(&reference).await
	}

	/// Persists changes to an existing tracking record.
	pub async fn save(&self, record: &TrackingRecord) -> Result<(), StorageError> {
		self.storage
			.update(
				StorageKey::Tracking.as_str(),
				record.reference_number.as_str(),
				record,
			)
			.await
	}

	/// Builds the guarded batch entry for the record itself.
	pub fn record_entry(
		&self,
		record: &TrackingRecord,
		mode: WriteMode,
	) -> Result<BatchWrite, StorageError> {
		self.storage.entry(
			StorageKey::Tracking.as_str(),
			record.reference_number.as_str(),
			record,
			mode,
		)
	}

	/// Builds the guarded batch entry for the order-id index.
	pub fn index_entry(
		&self,
		record: &TrackingRecord,
		mode: WriteMode,
	) -> Result<BatchWrite, StorageError> {
		self.storage.entry(
			StorageKey::TrackingByOrder.as_str(),
			&record.order_id.to_string(),
			&record.reference_number,
			mode,
		)
	}
}
