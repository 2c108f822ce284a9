//! Core lifecycle logic for the router order tracker.
//!
//! This crate owns every mutation of tracking state. It exposes the
//! lifecycle manager ([`TrackingService`]), order placement and reorder
//! ([`OrderService`]), the typed store wrappers both are built on, and
//! the builder that assembles a running [`Tracker`] from configuration
//! and backend factories.

/// Builder for constructing a Tracker from config and factories.
pub mod builder;
/// The order lifecycle manager.
pub mod lifecycle;
/// Order placement, history queries and reorder.
pub mod orders;
/// Typed store wrappers over the storage service.
pub mod stores;

#[cfg(test)]
pub(crate) mod testutil;

pub use builder::{BuilderError, Tracker, TrackerBuilder, TrackerFactories};
pub use lifecycle::{TrackingError, TrackingKey, TrackingService};
pub use orders::{OrderError, OrderService};
pub use stores::{OrderStore, TrackingStore};
