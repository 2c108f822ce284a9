//! Outbound notification module for the router order tracker.
//!
//! This module handles delivery of customer-facing notices (order
//! confirmation, status changes, cancellation, modification). Delivery is
//! strictly best-effort: a failed or dropped notification is logged and
//! forgotten, and must never fail or block the lifecycle operation that
//! produced it. There are no retries; every notification is attempted at
//! most once.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracker_types::{ConfigSchema, ImplementationRegistry, Notification};

/// Re-export implementations
pub mod implementations {
	pub mod log;
	pub mod webhook;
}

mod render;

pub use render::render;

/// Errors that can occur during notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error that occurs while handing the message to the channel.
	#[error("Delivery error: {0}")]
	Delivery(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
	/// Destination email address.
	pub recipient: String,
	pub subject: String,
	pub body: String,
}

/// Trait defining the interface for notification delivery backends.
///
/// Implementations deliver a single rendered message over whatever
/// channel they represent. They are not expected to retry.
#[async_trait]
pub trait NotifierInterface: Send + Sync {
	/// Returns the configuration schema for this notifier implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Delivers one message.
	async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError>;
}

/// Type alias for notifier factory functions.
pub type NotifierFactory = fn(&toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError>;

/// Registry trait for notifier implementations.
pub trait NotifierRegistry: ImplementationRegistry<Factory = NotifierFactory> {}

/// Get all registered notifier implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NotifierFactory)> {
	use implementations::{log, webhook};

	vec![
		(log::Registry::NAME, log::Registry::factory()),
		(webhook::Registry::NAME, webhook::Registry::factory()),
	]
}

/// Service that renders and delivers lifecycle notifications.
///
/// Two paths exist. [`NotifierService::send`] awaits delivery and
/// swallows failure, for callers that want the attempt finished before
/// returning. [`NotifierService::dispatch`] hands the notification to a
/// bounded queue drained by a single worker task, so bulk callers are
/// never serialized behind delivery latency; when the queue is full the
/// notification is dropped and logged. Neither path can surface an error
/// to the caller.
pub struct NotifierService {
	backend: Arc<dyn NotifierInterface>,
	queue: mpsc::Sender<Notification>,
}

impl NotifierService {
	/// Creates the service and spawns its queue worker.
	///
	/// Must be called from within a tokio runtime.
	pub fn new(backend: Box<dyn NotifierInterface>, queue_capacity: usize) -> Self {
		let backend: Arc<dyn NotifierInterface> = Arc::from(backend);
		let (queue, mut receiver) = mpsc::channel::<Notification>(queue_capacity);

		let worker_backend = Arc::clone(&backend);
		tokio::spawn(async move {
			while let Some(notification) = receiver.recv().await {
				deliver_logged(worker_backend.as_ref(), &notification).await;
			}
		});

		Self { backend, queue }
	}

	/// Delivers a notification, waiting for the attempt to finish.
	///
	/// Failure is logged and swallowed.
	pub async fn send(&self, notification: Notification) {
		deliver_logged(self.backend.as_ref(), &notification).await;
	}

	/// Enqueues a notification for background delivery and returns
	/// immediately.
	///
	/// A full or closed queue drops the notification with a warning.
	pub fn dispatch(&self, notification: Notification) {
		if let Err(e) = self.queue.try_send(notification) {
			let notification = match &e {
				mpsc::error::TrySendError::Full(n) | mpsc::error::TrySendError::Closed(n) => n,
			};
			tracing::warn!(
				kind = notification.kind(),
				reference = %notification.reference(),
				"Dropping notification: {}",
				e
			);
		}
	}
}

async fn deliver_logged(backend: &dyn NotifierInterface, notification: &Notification) {
	let message = render(notification);
	match backend.deliver(&message).await {
		Ok(()) => {
			tracing::debug!(
				kind = notification.kind(),
				reference = %notification.reference(),
				recipient = %message.recipient,
				"Delivered notification"
			);
		},
		Err(e) => {
			tracing::warn!(
				kind = notification.kind(),
				reference = %notification.reference(),
				"Failed to deliver notification: {}",
				e
			);
		},
	}
}
