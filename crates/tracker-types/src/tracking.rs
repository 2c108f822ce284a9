//! Tracking record types for the router order tracker.
//!
//! This module defines the tracking record that shadows every placed order,
//! the closed status enumeration and the status-to-permission mapping that
//! decides which customer actions are legal at each stage.

use crate::reference::ReferenceNumber;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a status string does not name a known status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// Status of an order as it moves through the fulfilment pipeline.
///
/// The set is closed: strings outside this enumeration are rejected at
/// parse time rather than silently accepted. Only `Pending` permits
/// customer-initiated changes; everything past confirmation is locked
/// because physical production or shipping is already underway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingStatus {
	/// Order has been placed but not yet approved.
	Pending,
	/// Order has been approved and queued for production.
	Confirmed,
	/// Routers are being assembled and configured.
	InProduction,
	/// Routers are undergoing pre-dispatch checks.
	QualityCheck,
	/// Order is packed and awaiting courier pickup.
	ReadyForShipping,
	/// Order is with the courier.
	InTransit,
	/// Order has arrived at the site. Terminal.
	Delivered,
	/// Order was cancelled by the customer. Terminal.
	Cancelled,
}

/// Customer action permissions derived from a tracking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
	pub can_modify: bool,
	pub can_cancel: bool,
}

impl TrackingStatus {
	/// Returns the permission flags for this status.
	///
	/// This is the only source of the status-to-permission mapping; the
	/// flags stored on a tracking record must always equal this value for
	/// the record's current status.
	pub fn permissions(&self) -> Permissions {
		match self {
			TrackingStatus::Pending => Permissions {
				can_modify: true,
				can_cancel: true,
			},
			TrackingStatus::Confirmed
			| TrackingStatus::InProduction
			| TrackingStatus::QualityCheck
			| TrackingStatus::ReadyForShipping
			| TrackingStatus::InTransit
			| TrackingStatus::Delivered
			| TrackingStatus::Cancelled => Permissions {
				can_modify: false,
				can_cancel: false,
			},
		}
	}

	/// Returns the wire representation of this status.
	pub fn as_str(&self) -> &'static str {
		match self {
			TrackingStatus::Pending => "PENDING",
			TrackingStatus::Confirmed => "CONFIRMED",
			TrackingStatus::InProduction => "IN_PRODUCTION",
			TrackingStatus::QualityCheck => "QUALITY_CHECK",
			TrackingStatus::ReadyForShipping => "READY_FOR_SHIPPING",
			TrackingStatus::InTransit => "IN_TRANSIT",
			TrackingStatus::Delivered => "DELIVERED",
			TrackingStatus::Cancelled => "CANCELLED",
		}
	}

	/// Returns an iterator over all status variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Confirmed,
			Self::InProduction,
			Self::QualityCheck,
			Self::ReadyForShipping,
			Self::InTransit,
			Self::Delivered,
			Self::Cancelled,
		]
		.into_iter()
	}
}

impl fmt::Display for TrackingStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TrackingStatus {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"PENDING" => Ok(Self::Pending),
			"CONFIRMED" => Ok(Self::Confirmed),
			"IN_PRODUCTION" => Ok(Self::InProduction),
			"QUALITY_CHECK" => Ok(Self::QualityCheck),
			"READY_FOR_SHIPPING" => Ok(Self::ReadyForShipping),
			"IN_TRANSIT" => Ok(Self::InTransit),
			"DELIVERED" => Ok(Self::Delivered),
			"CANCELLED" => Ok(Self::Cancelled),
			other => Err(UnknownStatus(other.to_string())),
		}
	}
}

/// Durable status shadow of a placed order.
///
/// Exactly one tracking record exists per order. It carries the public
/// reference number, the current status and the derived permission flags.
/// Records are never deleted; cancellation is a terminal status, not a
/// removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
	/// Identity of the order this record shadows. Unique per record.
	pub order_id: u64,
	/// Public reference number, copied from the order at creation.
	pub reference_number: ReferenceNumber,
	/// Current status of the order.
	pub status: TrackingStatus,
	/// Whether the customer may still modify the order.
	pub can_modify: bool,
	/// Whether the customer may still cancel the order.
	pub can_cancel: bool,
	/// Timestamp when this record was created.
	pub created_at: u64,
	/// Timestamp of the last write to this record.
	pub updated_at: u64,
}

impl TrackingRecord {
	/// Creates a fresh tracking record in `Pending` with both permissions
	/// granted.
	pub fn new(order_id: u64, reference_number: ReferenceNumber, now: u64) -> Self {
		let perms = TrackingStatus::Pending.permissions();
		Self {
			order_id,
			reference_number,
			status: TrackingStatus::Pending,
			can_modify: perms.can_modify,
			can_cancel: perms.can_cancel,
			created_at: now,
			updated_at: now,
		}
	}

	/// Moves the record to `status`, recomputing both permission flags
	/// from the mapping table and refreshing `updated_at`.
	pub fn apply_status(&mut self, status: TrackingStatus, now: u64) {
		let perms = status.permissions();
		self.status = status;
		self.can_modify = perms.can_modify;
		self.can_cancel = perms.can_cancel;
		self.updated_at = now;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_pending_grants_permissions() {
		for status in TrackingStatus::all() {
			let perms = status.permissions();
			let expected = status == TrackingStatus::Pending;
			assert_eq!(perms.can_modify, expected, "can_modify for {}", status);
			assert_eq!(perms.can_cancel, expected, "can_cancel for {}", status);
		}
	}

	#[test]
	fn status_round_trips_through_wire_form() {
		for status in TrackingStatus::all() {
			assert_eq!(status.as_str().parse::<TrackingStatus>(), Ok(status));
		}
	}

	#[test]
	fn unknown_status_is_rejected() {
		let err = "SHIPPED".parse::<TrackingStatus>().unwrap_err();
		assert_eq!(err, UnknownStatus("SHIPPED".to_string()));
		assert!("pending".parse::<TrackingStatus>().is_err());
	}

	#[test]
	fn apply_status_keeps_flags_consistent() {
		let reference = ReferenceNumber::generate();
		let mut record = TrackingRecord::new(7, reference, 100);
		assert!(record.can_modify && record.can_cancel);

		record.apply_status(TrackingStatus::Confirmed, 200);
		assert_eq!(record.status, TrackingStatus::Confirmed);
		assert!(!record.can_modify && !record.can_cancel);
		assert_eq!(record.updated_at, 200);
		assert_eq!(record.created_at, 100);
	}
}
