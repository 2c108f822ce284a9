//! Shared fixtures for the core service tests.

use crate::lifecycle::TrackingService;
use crate::orders::OrderService;
use crate::stores::{OrderStore, TrackingStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracker_notify::{NotifierInterface, NotifierService, NotifyError, OutboundMessage};
use tracker_storage::implementations::memory::MemoryStorage;
use tracker_storage::StorageService;
use tracker_types::{ConfigSchema, OrderRequest, Schema, ValidationError, VlanType};

/// How the test notifier behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotifierMode {
	/// Record every delivered message.
	Deliver,
	/// Fail every delivery attempt.
	Fail,
}

struct TestNotifier {
	mode: NotifierMode,
	delivered: Arc<Mutex<Vec<OutboundMessage>>>,
}

#[async_trait]
impl NotifierInterface for TestNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		struct Empty;
		impl ConfigSchema for Empty {
			fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
				Schema::new(vec![], vec![]).validate(config)
			}
		}
		Box::new(Empty)
	}

	async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
		match self.mode {
			NotifierMode::Deliver => {
				self.delivered.lock().unwrap().push(message.clone());
				Ok(())
			},
			NotifierMode::Fail => Err(NotifyError::Delivery("gateway down".to_string())),
		}
	}
}

/// A fully wired core over in-memory storage.
pub(crate) struct Harness {
	pub orders: Arc<OrderService>,
	pub tracking: Arc<TrackingService>,
	pub order_store: Arc<OrderStore>,
	delivered: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl Harness {
	/// Messages the test notifier has delivered so far.
	pub fn delivered(&self) -> Vec<OutboundMessage> {
		self.delivered.lock().unwrap().clone()
	}
}

pub(crate) async fn harness(mode: NotifierMode) -> Harness {
	let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
	let delivered = Arc::new(Mutex::new(Vec::new()));
	let notifier = Arc::new(NotifierService::new(
		Box::new(TestNotifier {
			mode,
			delivered: Arc::clone(&delivered),
		}),
		8,
	));

	let order_store = Arc::new(OrderStore::new(Arc::clone(&storage)));
	let tracking_store = Arc::new(TrackingStore::new(Arc::clone(&storage)));
	let tracking = Arc::new(TrackingService::new(
		Arc::clone(&storage),
		Arc::clone(&order_store),
		Arc::clone(&tracking_store),
		Arc::clone(&notifier),
	));
	let orders = Arc::new(OrderService::new(
		storage,
		Arc::clone(&order_store),
		tracking_store,
		Arc::clone(&tracking),
		notifier,
	));

	Harness {
		orders,
		tracking,
		order_store,
		delivered,
	}
}

/// A representative placement request.
pub(crate) fn order_request() -> OrderRequest {
	OrderRequest {
		customer_id: 1,
		router_id: 1,
		router_model: "Virtual Access - GW1042M".to_string(),
		router_preset_id: None,
		primary_outside_connections: Some("Mobile Radio - UK SIM".to_string()),
		secondary_outside_connections: None,
		inside_connections: Some("ETHERNET".to_string()),
		vlans: VlanType::Unspecified,
		dhcp: false,
		num_routers: Some(1),
		site_name: "Test Site".to_string(),
		site_address: "123 Test Street".to_string(),
		site_postcode: "T1 1TT".to_string(),
		site_primary_email: "test@example.com".to_string(),
		site_secondary_email: None,
		site_phone_number: "01234567890".to_string(),
		site_contact_name: "Test Contact".to_string(),
		priority_level: None,
		additional_information: None,
	}
}
