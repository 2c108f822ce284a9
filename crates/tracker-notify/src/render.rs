//! Rendering of lifecycle notifications into deliverable messages.

use crate::OutboundMessage;
use tracker_types::Notification;

/// Renders a notification into a subject and plain-text body.
pub fn render(notification: &Notification) -> OutboundMessage {
	match notification {
		Notification::OrderConfirmation {
			recipient,
			reference,
			snapshot,
		} => OutboundMessage {
			recipient: recipient.clone(),
			subject: format!("Router Order Confirmation - Ref: {}", reference),
			body: format!(
				"Thank you for your router order!\n\n\
				 Order Reference: {}\n\
				 Order Status: Pending\n\n\
				 Order Details:\n\
				 - Router Type: {}\n\
				 - Quantity: {}\n\
				 - Site Name: {}\n\
				 - Delivery Address: {}\n\
				 - Postcode: {}\n\n\
				 Order modifications and cancellations are allowed until the order is confirmed.\n\n\
				 If you need any assistance, please contact our support team.",
				reference,
				snapshot.router_model,
				snapshot.quantity,
				snapshot.site_name,
				snapshot.site_address,
				snapshot.site_postcode,
			),
		},
		Notification::StatusUpdate {
			recipient,
			reference,
			status,
		} => OutboundMessage {
			recipient: recipient.clone(),
			subject: format!("Router Order Status Update - Ref: {}", reference),
			body: format!(
				"The status of your order has been updated.\n\n\
				 Order Reference: {}\n\
				 New Status: {}\n\n\
				 If you have any questions, please contact our support team.",
				reference, status,
			),
		},
		Notification::Cancellation {
			recipient,
			reference,
		} => OutboundMessage {
			recipient: recipient.clone(),
			subject: format!("Router Order Cancelled - Ref: {}", reference),
			body: format!(
				"Your order has been cancelled.\n\n\
				 Order Reference: {}\n\n\
				 No routers will be dispatched for this order. If you did not request\n\
				 this cancellation, please contact our support team immediately.",
				reference,
			),
		},
		Notification::Modification {
			recipient,
			reference,
			snapshot,
		} => OutboundMessage {
			recipient: recipient.clone(),
			subject: format!("Router Order Modified - Ref: {}", reference),
			body: format!(
				"Your order has been successfully modified.\n\n\
				 Order Reference: {}\n\n\
				 Updated Order Details:\n\
				 - Router Type: {}\n\
				 - Quantity: {}\n\
				 - Site Name: {}\n\n\
				 If you did not make these changes, please contact our support team immediately.",
				reference, snapshot.router_model, snapshot.quantity, snapshot.site_name,
			),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_types::{OrderSnapshot, ReferenceNumber, TrackingStatus};

	fn snapshot() -> OrderSnapshot {
		OrderSnapshot {
			router_model: "Virtual Access - GW1042M".to_string(),
			quantity: 2,
			site_name: "Test Site".to_string(),
			site_address: "123 Test Street".to_string(),
			site_postcode: "T1 1TT".to_string(),
		}
	}

	#[test]
	fn confirmation_contains_reference_and_order_details() {
		let reference: ReferenceNumber = "BT-1A2B3C4D".parse().unwrap();
		let message = render(&Notification::OrderConfirmation {
			recipient: "test@example.com".to_string(),
			reference,
			snapshot: snapshot(),
		});

		assert_eq!(message.recipient, "test@example.com");
		assert_eq!(message.subject, "Router Order Confirmation - Ref: BT-1A2B3C4D");
		assert!(message.body.contains("Order Reference: BT-1A2B3C4D"));
		assert!(message.body.contains("Router Type: Virtual Access - GW1042M"));
		assert!(message.body.contains("Quantity: 2"));
		assert!(message.body.contains("Site Name: Test Site"));
		assert!(message.body.contains("Delivery Address: 123 Test Street"));
		assert!(message.body.contains("Postcode: T1 1TT"));
	}

	#[test]
	fn status_update_names_the_new_status() {
		let reference: ReferenceNumber = "BT-1A2B3C4D".parse().unwrap();
		let message = render(&Notification::StatusUpdate {
			recipient: "test@example.com".to_string(),
			reference,
			status: TrackingStatus::InTransit,
		});

		assert_eq!(message.subject, "Router Order Status Update - Ref: BT-1A2B3C4D");
		assert!(message.body.contains("New Status: IN_TRANSIT"));
	}

	#[test]
	fn modification_carries_the_updated_snapshot() {
		let reference: ReferenceNumber = "BT-1A2B3C4D".parse().unwrap();
		let mut updated = snapshot();
		updated.quantity = 3;
		let message = render(&Notification::Modification {
			recipient: "test@example.com".to_string(),
			reference,
			snapshot: updated,
		});

		assert_eq!(message.subject, "Router Order Modified - Ref: BT-1A2B3C4D");
		assert!(message.body.contains("Quantity: 3"));
	}
}
