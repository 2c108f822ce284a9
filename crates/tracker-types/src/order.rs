//! Order domain types for the router order tracker.
//!
//! An order captures a customer's request for router equipment: the
//! hardware, the connection configuration and the delivery site. Orders
//! are created once and mutated only by status mirroring and explicit
//! modification requests.

use crate::reference::ReferenceNumber;
use crate::tracking::TrackingStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on the free-text additional information field.
pub const MAX_ADDITIONAL_INFO_LEN: usize = 500;

/// VLAN handling requested for the ordered routers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VlanType {
	Unspecified,
	VlanAware,
	VlanUnaware,
}

impl fmt::Display for VlanType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			VlanType::Unspecified => write!(f, "UNSPECIFIED"),
			VlanType::VlanAware => write!(f, "VLAN_AWARE"),
			VlanType::VlanUnaware => write!(f, "VLAN_UNAWARE"),
		}
	}
}

/// Contact and delivery details for the installation site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteContact {
	pub name: String,
	pub address: String,
	pub postcode: String,
	/// Primary contact email; all notifications go here. Also the
	/// ownership identity checked by reorder.
	pub primary_email: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub secondary_email: Option<String>,
	pub phone_number: String,
	pub contact_name: String,
}

/// Durable record of a placed router order.
///
/// The reference number is assigned exactly once, at creation, and never
/// changes. The status field is a denormalized mirror of the tracking
/// record's status, updated only by the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: u64,
	/// Public reference number. Immutable once assigned.
	pub reference: ReferenceNumber,
	/// Customer placing the order.
	pub customer_id: u64,
	/// Router catalogue entry being ordered.
	pub router_id: u64,
	/// Human-readable router model, captured at placement time so that
	/// notifications do not need the catalogue.
	pub router_model: String,
	/// Optional configuration preset applied to the routers.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub router_preset_id: Option<u64>,
	/// Primary outside connection descriptor.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub primary_outside_connections: Option<String>,
	/// Secondary outside connection descriptor.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub secondary_outside_connections: Option<String>,
	/// Inside connection descriptors as a comma-separated list.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inside_connections: Option<String>,
	/// VLAN handling for the ordered routers.
	pub vlans: VlanType,
	/// Whether DHCP should be enabled.
	pub dhcp: bool,
	/// Number of routers ordered. Always at least 1.
	pub num_routers: u32,
	/// Delivery site contact bundle.
	pub site: SiteContact,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority_level: Option<String>,
	/// Free-text notes, bounded by [`MAX_ADDITIONAL_INFO_LEN`].
	#[serde(skip_serializing_if = "Option::is_none")]
	pub additional_information: Option<String>,
	/// Timestamp when this order was created. Set once.
	pub created_at: u64,
	/// Mirror of the tracking record's status.
	pub status: TrackingStatus,
}

/// Incoming request to place a new order.
///
/// References to customers, routers and presets are resolved by the
/// request-handling layer; the lifecycle core only validates the order
/// attributes themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
	pub customer_id: u64,
	pub router_id: u64,
	pub router_model: String,
	pub router_preset_id: Option<u64>,
	pub primary_outside_connections: Option<String>,
	pub secondary_outside_connections: Option<String>,
	pub inside_connections: Option<String>,
	pub vlans: VlanType,
	#[serde(default)]
	pub dhcp: bool,
	/// Requested quantity; absent or zero defaults to 1.
	pub num_routers: Option<u32>,
	pub site_name: String,
	pub site_address: String,
	pub site_postcode: String,
	pub site_primary_email: String,
	pub site_secondary_email: Option<String>,
	pub site_phone_number: String,
	pub site_contact_name: String,
	pub priority_level: Option<String>,
	pub additional_information: Option<String>,
}

/// Field changes a customer may request on a modifiable order.
///
/// Only the quantity is customer-adjustable after placement; everything
/// else would require a reorder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChanges {
	pub num_routers: Option<u32>,
}
