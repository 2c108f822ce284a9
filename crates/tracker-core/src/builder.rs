//! Builder pattern for constructing the tracker.
//!
//! Provides a flexible way to compose a running [`Tracker`] from
//! configuration and factory functions, with pluggable storage and
//! notifier backends.

use crate::lifecycle::TrackingService;
use crate::orders::OrderService;
use crate::stores::{OrderStore, TrackingStore};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracker_config::Config;
use tracker_notify::{NotifierInterface, NotifierService, NotifyError};
use tracker_storage::{StorageError, StorageInterface, StorageService};

/// Errors that can occur during tracker construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for the factory functions needed to build a Tracker.
///
/// Each factory takes the implementation's TOML configuration section and
/// returns the corresponding backend.
pub struct TrackerFactories<SF, NF> {
	pub storage_factories: HashMap<String, SF>,
	pub notifier_factories: HashMap<String, NF>,
}

/// The assembled tracker: configuration plus the two core services.
pub struct Tracker {
	config: Config,
	orders: Arc<OrderService>,
	tracking: Arc<TrackingService>,
}

impl Tracker {
	/// The configuration the tracker was built from.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Order placement, history and reorder.
	pub fn orders(&self) -> &Arc<OrderService> {
		&self.orders
	}

	/// The order lifecycle manager.
	pub fn tracking(&self) -> &Arc<TrackingService> {
		&self.tracking
	}
}

/// Builder for constructing a Tracker with pluggable implementations.
pub struct TrackerBuilder {
	config: Config,
}

impl TrackerBuilder {
	/// Creates a new TrackerBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the Tracker using factories for each backend type.
	pub fn build<SF, NF>(self, factories: TrackerFactories<SF, NF>) -> Result<Tracker, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		NF: Fn(&toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError>,
	{
		// Create storage implementations
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			if let Some(factory) = factories.storage_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						let is_primary = &self.config.storage.primary == name;
						storage_impls.insert(name.clone(), implementation);
						tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Failed to create storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create storage implementation '{}': {}",
							name, e
						)));
					},
				}
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		// Create notifier implementations
		let mut notifier_impls = HashMap::new();
		for (name, config) in &self.config.notifier.implementations {
			if let Some(factory) = factories.notifier_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						let is_primary = &self.config.notifier.primary == name;
						notifier_impls.insert(name.clone(), implementation);
						tracing::info!(component = "notifier", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "notifier",
							implementation = %name,
							error = %e,
							"Failed to create notifier implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create notifier implementation '{}': {}",
							name, e
						)));
					},
				}
			}
		}

		let primary_notifier = &self.config.notifier.primary;
		let notifier_backend = notifier_impls.remove(primary_notifier).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary notifier '{}' failed to load or has invalid configuration",
				primary_notifier
			))
		})?;
		let notifier = Arc::new(NotifierService::new(
			notifier_backend,
			self.config.notifier.queue_capacity,
		));

		// Wire the stores and services
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
			order_store,
			tracking_store,
			Arc::clone(&tracking),
			notifier,
		));

		Ok(Tracker {
			config: self.config,
			orders,
			tracking,
		})
	}
}
