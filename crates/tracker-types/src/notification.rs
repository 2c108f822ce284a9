//! Notification payloads for the outbound gateway.
//!
//! The lifecycle manager emits one of four notifications per state
//! change. Delivery is best-effort: the gateway never blocks or fails a
//! transition, so these types carry everything needed to render a
//! message without further lookups.

use crate::order::Order;
use crate::reference::ReferenceNumber;
use crate::tracking::TrackingStatus;
use serde::{Deserialize, Serialize};

/// Human-readable snapshot of an order, embedded in confirmation and
/// modification notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
	pub router_model: String,
	pub quantity: u32,
	pub site_name: String,
	pub site_address: String,
	pub site_postcode: String,
}

impl From<&Order> for OrderSnapshot {
	fn from(order: &Order) -> Self {
		Self {
			router_model: order.router_model.clone(),
			quantity: order.num_routers,
			site_name: order.site.name.clone(),
			site_address: order.site.address.clone(),
			site_postcode: order.site.postcode.clone(),
		}
	}
}

/// Outbound message emitted by a lifecycle operation.
#[derive(Debug, Clone)]
pub enum Notification {
	/// Order placed and tracking created.
	OrderConfirmation {
		recipient: String,
		reference: ReferenceNumber,
		snapshot: OrderSnapshot,
	},
	/// Status moved to a new value.
	StatusUpdate {
		recipient: String,
		reference: ReferenceNumber,
		status: TrackingStatus,
	},
	/// Customer cancelled the order.
	Cancellation {
		recipient: String,
		reference: ReferenceNumber,
	},
	/// Customer modified the order.
	Modification {
		recipient: String,
		reference: ReferenceNumber,
		snapshot: OrderSnapshot,
	},
}

impl Notification {
	/// Email address the notification is addressed to.
	pub fn recipient(&self) -> &str {
		match self {
			Notification::OrderConfirmation { recipient, .. }
			| Notification::StatusUpdate { recipient, .. }
			| Notification::Cancellation { recipient, .. }
			| Notification::Modification { recipient, .. } => recipient,
		}
	}

	/// Reference number the notification concerns.
	pub fn reference(&self) -> &ReferenceNumber {
		match self {
			Notification::OrderConfirmation { reference, .. }
			| Notification::StatusUpdate { reference, .. }
			| Notification::Cancellation { reference, .. }
			| Notification::Modification { reference, .. } => reference,
		}
	}

	/// Short label used in logs.
	pub fn kind(&self) -> &'static str {
		match self {
			Notification::OrderConfirmation { .. } => "order_confirmation",
			Notification::StatusUpdate { .. } => "status_update",
			Notification::Cancellation { .. } => "cancellation",
			Notification::Modification { .. } => "modification",
		}
	}
}
