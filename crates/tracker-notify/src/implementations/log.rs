//! Log-only notifier implementation.
//!
//! Writes every notification to the tracing output instead of delivering
//! it anywhere, which is what development and test configurations want.

use crate::{NotifierFactory, NotifierInterface, NotifierRegistry, NotifyError, OutboundMessage};
use async_trait::async_trait;
use tracker_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

/// Notifier that records messages in the log and delivers nothing.
pub struct LogNotifier;

#[async_trait]
impl NotifierInterface for LogNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LogNotifierSchema)
	}

	async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
		tracing::info!(
			recipient = %message.recipient,
			subject = %message.subject,
			"Notification (log sink): {}",
			message.body
		);
		Ok(())
	}
}

/// Configuration schema for LogNotifier.
pub struct LogNotifierSchema;

impl ConfigSchema for LogNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// The log notifier has no required configuration
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Registry entry for the log notifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "log";
	type Factory = NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifierRegistry for Registry {}

/// Factory function to create a log notifier from configuration.
pub fn create_notifier(_config: &toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	Ok(Box::new(LogNotifier))
}
