//! Storage module for the router order tracker.
//!
//! This module provides abstractions for persistent storage of orders and
//! tracking records, supporting different backend implementations such as
//! in-memory or file-based storage.
//!
//! The one transactional guarantee the tracker relies on lives here: a
//! [`StorageInterface::write_batch`] call applies all of its writes or
//! none of them, so a tracking record and the mirrored order status can
//! never be persisted apart.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracker_types::{ConfigSchema, ImplementationRegistry};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when an insert hits an existing key.
	#[error("Already exists")]
	AlreadyExists,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Guard applied to a single write within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
	/// The key must not exist yet. This is the store-level uniqueness
	/// constraint for tracking records.
	Insert,
	/// The key must already exist.
	Update,
	/// Write unconditionally.
	Upsert,
}

/// One write in an all-or-nothing batch.
#[derive(Debug, Clone)]
pub struct BatchWrite {
	pub key: String,
	pub value: Vec<u8>,
	pub mode: WriteMode,
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the tracker. It provides basic key-value operations
/// plus guarded batch writes and sequence allocation.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes unconditionally.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists the ids stored under a namespace.
	async fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError>;

	/// Applies a set of guarded writes as a unit.
	///
	/// Every guard is checked before any write is applied; a failed guard
	/// aborts the whole batch. Backends serialize batches against each
	/// other, so a batch is the tracker's transactional boundary.
	async fn write_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StorageError>;

	/// Returns the next value of a named monotonic sequence, starting at 1.
	async fn next_sequence(&self, name: &str) -> Result<u64, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations, used by the service binary to register backends.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

fn storage_key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with
/// automatic serialization/deserialization.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores a serializable value, creating or overwriting.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = storage_key(namespace, id);
		let bytes = encode(data)?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Stores a serializable value under a key that must not exist yet.
	///
	/// Fails with `AlreadyExists` otherwise; this is how the store level
	/// enforces one tracking record per order.
	pub async fn create<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.write_batch(vec![self.entry(namespace, id, data, WriteMode::Insert)?])
			.await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let key = storage_key(namespace, id);
		let bytes = self.backend.get_bytes(&key).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Updates an existing value in storage.
	///
	/// Returns `NotFound` if the key does not exist, making it
	/// semantically different from store() which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.write_batch(vec![self.entry(namespace, id, data, WriteMode::Update)?])
			.await
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		let key = storage_key(namespace, id);
		self.backend.delete(&key).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		let key = storage_key(namespace, id);
		self.backend.exists(&key).await
	}

	/// Retrieves every value stored under a namespace.
	///
	/// Entries that vanish between listing and retrieval are skipped.
	pub async fn list<T: DeserializeOwned>(&self, namespace: &str) -> Result<Vec<T>, StorageError> {
		let ids = self.backend.keys(namespace).await?;
		let mut items = Vec::with_capacity(ids.len());
		for id in ids {
			match self.retrieve(namespace, &id).await {
				Ok(item) => items.push(item),
				Err(StorageError::NotFound) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(items)
	}

	/// Builds one guarded entry for a batch write.
	pub fn entry<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
		mode: WriteMode,
	) -> Result<BatchWrite, StorageError> {
		Ok(BatchWrite {
			key: storage_key(namespace, id),
			value: encode(data)?,
			mode,
		})
	}

	/// Applies a set of guarded writes as a unit.
	pub async fn write_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StorageError> {
		self.backend.write_batch(writes).await
	}

	/// Returns the next value of a named monotonic sequence.
	pub async fn next_sequence(&self, name: &str) -> Result<u64, StorageError> {
		self.backend.next_sequence(name).await
	}
}

fn encode<T: Serialize>(data: &T) -> Result<Vec<u8>, StorageError> {
	serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
}
