//! In-memory storage backend implementation for the tracker.
//!
//! This module provides a memory-based implementation of the
//! StorageInterface trait, useful for testing and development scenarios
//! where persistence is not required.

use crate::{BatchWrite, StorageError, StorageFactory, StorageInterface, StorageRegistry, WriteMode};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracker_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

/// In-memory storage implementation.
///
/// Data lives in a HashMap behind a read-write lock. Batch writes hold
/// the write lock for guard checks and application together, which gives
/// them their all-or-nothing semantics.
pub struct MemoryStorage {
	store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
	sequences: Arc<RwLock<HashMap<String, u64>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
			sequences: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}

	async fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let prefix = format!("{}:", namespace);
		let store = self.store.read().await;
		Ok(store
			.keys()
			.filter_map(|key| key.strip_prefix(&prefix))
			.map(|id| id.to_string())
			.collect())
	}

	async fn write_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;

		// Check every guard before touching anything
		for write in &writes {
			match write.mode {
				WriteMode::Insert => {
					if store.contains_key(&write.key) {
						return Err(StorageError::AlreadyExists);
					}
				},
				WriteMode::Update => {
					if !store.contains_key(&write.key) {
						return Err(StorageError::NotFound);
					}
				},
				WriteMode::Upsert => {},
			}
		}

		for write in writes {
			store.insert(write.key, write.value);
		}
		Ok(())
	}

	async fn next_sequence(&self, name: &str) -> Result<u64, StorageError> {
		let mut sequences = self.sequences.write().await;
		let next = sequences.get(name).copied().unwrap_or(0) + 1;
		sequences.insert(name.to_string(), next);
		Ok(next)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the memory storage backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - None required for memory storage
pub fn create_storage(_config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		// Test set and get
		let key = "test_key";
		let value = b"test_value".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value);

		// Test exists
		assert!(storage.exists(key).await.unwrap());

		// Test delete
		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());

		// Test get after delete
		let result = storage.get_bytes(key).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_keys_lists_only_namespace() {
		let storage = MemoryStorage::new();
		storage.set_bytes("orders:1", b"a".to_vec()).await.unwrap();
		storage.set_bytes("orders:2", b"b".to_vec()).await.unwrap();
		storage.set_bytes("tracking:BT-AAAAAAAA", b"c".to_vec()).await.unwrap();

		let mut ids = storage.keys("orders").await.unwrap();
		ids.sort();
		assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);
	}

	#[tokio::test]
	async fn test_insert_guard_rejects_existing_key() {
		let storage = MemoryStorage::new();
		storage.set_bytes("tracking_by_order:7", b"BT-AAAAAAAA".to_vec())
			.await
			.unwrap();

		let result = storage
			.write_batch(vec![BatchWrite {
				key: "tracking_by_order:7".to_string(),
				value: b"BT-BBBBBBBB".to_vec(),
				mode: WriteMode::Insert,
			}])
			.await;
		assert!(matches!(result, Err(StorageError::AlreadyExists)));

		// Original value untouched
		let stored = storage.get_bytes("tracking_by_order:7").await.unwrap();
		assert_eq!(stored, b"BT-AAAAAAAA".to_vec());
	}

	#[tokio::test]
	async fn test_failed_guard_aborts_whole_batch() {
		let storage = MemoryStorage::new();

		let result = storage
			.write_batch(vec![
				BatchWrite {
					key: "orders:1".to_string(),
					value: b"order".to_vec(),
					mode: WriteMode::Insert,
				},
				BatchWrite {
					key: "tracking:BT-AAAAAAAA".to_string(),
					value: b"tracking".to_vec(),
					// Nothing exists yet, so this guard fails
					mode: WriteMode::Update,
				},
			])
			.await;
		assert!(matches!(result, Err(StorageError::NotFound)));

		// The first write must not have been applied
		assert!(!storage.exists("orders:1").await.unwrap());
	}

	#[tokio::test]
	async fn test_sequences_are_monotonic_and_independent() {
		let storage = MemoryStorage::new();
		assert_eq!(storage.next_sequence("orders").await.unwrap(), 1);
		assert_eq!(storage.next_sequence("orders").await.unwrap(), 2);
		assert_eq!(storage.next_sequence("other").await.unwrap(), 1);
	}
}
