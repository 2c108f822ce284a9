//! Webhook notifier implementation.
//!
//! Posts each rendered message as JSON to a configured HTTP endpoint.
//! The receiving side (a mail relay, a chat bridge) is outside the
//! tracker's concern; this implementation only reports whether the
//! handoff succeeded.

use crate::{NotifierFactory, NotifierInterface, NotifierRegistry, NotifyError, OutboundMessage};
use async_trait::async_trait;
use std::time::Duration;
use tracker_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Notifier that POSTs messages to an HTTP endpoint.
pub struct WebhookNotifier {
	client: reqwest::Client,
	url: String,
}

impl WebhookNotifier {
	/// Creates a new WebhookNotifier for the given endpoint.
	pub fn new(url: String, timeout: Duration) -> Result<Self, NotifyError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| NotifyError::Configuration(e.to_string()))?;
		Ok(Self { client, url })
	}
}

#[async_trait]
impl NotifierInterface for WebhookNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WebhookNotifierSchema)
	}

	async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
		let response = self
			.client
			.post(&self.url)
			.json(message)
			.send()
			.await
			.map_err(|e| NotifyError::Delivery(e.to_string()))?;

		if !response.status().is_success() {
			return Err(NotifyError::Delivery(format!(
				"Endpoint returned {}",
				response.status()
			)));
		}
		Ok(())
	}
}

/// Configuration schema for WebhookNotifier.
pub struct WebhookNotifierSchema;

impl ConfigSchema for WebhookNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|value| {
				let url = value.as_str().unwrap_or_default();
				if url.starts_with("http://") || url.starts_with("https://") {
					Ok(())
				} else {
					Err("must start with http:// or https://".to_string())
				}
			})],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Registry entry for the webhook notifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "webhook";
	type Factory = NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifierRegistry for Registry {}

/// Factory function to create a webhook notifier from configuration.
///
/// Configuration parameters:
/// - `url`: Endpoint to POST messages to (required)
/// - `timeout_seconds`: Request timeout (default: 10)
pub fn create_notifier(config: &toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	WebhookNotifierSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| NotifyError::Configuration("url is required".to_string()))?
		.to_string();

	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	Ok(Box::new(WebhookNotifier::new(
		url,
		Duration::from_secs(timeout),
	)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_requires_http_url() {
		let schema = WebhookNotifierSchema;
		assert!(schema
			.validate(&"url = \"https://relay.internal/notify\"".parse().unwrap())
			.is_ok());
		assert!(schema.validate(&"timeout_seconds = 5".parse().unwrap()).is_err());
		assert!(schema
			.validate(&"url = \"relay.internal/notify\"".parse().unwrap())
			.is_err());
	}

	#[test]
	fn factory_rejects_missing_url() {
		let config: toml::Value = "timeout_seconds = 5".parse().unwrap();
		assert!(create_notifier(&config).is_err());
	}
}
