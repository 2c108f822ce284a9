//! Main entry point for the tracker service.
//!
//! This binary wires the order lifecycle core to its pluggable storage
//! and notifier backends and serves the HTTP API. It uses a modular
//! architecture where each backend is selected and configured through
//! the TOML configuration file.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracker_config::Config;
use tracker_core::{Tracker, TrackerBuilder, TrackerFactories};

mod apis;
mod server;

// Import implementations from individual crates
use tracker_notify::implementations::log::create_notifier as create_log_notifier;
use tracker_notify::implementations::webhook::create_notifier as create_webhook_notifier;
use tracker_storage::implementations::file::create_storage as create_file_storage;
use tracker_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the tracker service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the tracker service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the tracker with all backend implementations
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started tracker");

	// Load configuration
	let config = Config::from_file(args.config.to_str().unwrap()).await?;
	tracing::info!("Loaded configuration [{}]", config.tracker.id);

	// Build the tracker with backend implementations
	let tracker = Arc::new(build_tracker(config.clone())?);

	let api_enabled = config.api.as_ref().is_some_and(|api| api.enabled);
	if !api_enabled {
		tracing::warn!("API server disabled in configuration, nothing to serve");
		return Ok(());
	}

	let api_config = config.api.unwrap();
	server::start_server(api_config, tracker).await?;

	tracing::info!("Stopped tracker");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the tracker with all necessary backend implementations.
///
/// This function wires up the concrete implementations for:
/// - Storage backends (in-memory, file)
/// - Notifier backends (log sink, webhook)
fn build_tracker(config: Config) -> Result<Tracker, Box<dyn std::error::Error>> {
	let builder = TrackerBuilder::new(config);

	let storage_factories = create_factory_map!(
		tracker_storage::StorageInterface,
		tracker_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	let notifier_factories = create_factory_map!(
		tracker_notify::NotifierInterface,
		tracker_notify::NotifyError,
		"log" => create_log_notifier,
		"webhook" => create_webhook_notifier,
	);

	let factories = TrackerFactories {
		storage_factories,
		notifier_factories,
	};

	Ok(builder.build(factories)?)
}
