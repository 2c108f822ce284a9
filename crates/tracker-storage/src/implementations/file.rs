//! File-based storage backend implementation for the tracker.
//!
//! This module stores each value as a JSON file under a per-namespace
//! directory, providing simple persistence without external services.
//! Writes go to a temp file first and are renamed into place, so a single
//! value is never observed half-written.

use crate::{BatchWrite, StorageError, StorageFactory, StorageInterface, StorageRegistry, WriteMode};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracker_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

/// File-based storage implementation.
///
/// Keys have the form `namespace:id`; the value for `orders:12` lives at
/// `<base>/orders/12.bin`. Batches are serialized by a mutex, and every
/// guard is checked before the first file is written. The tracker runs as
/// the sole writer of its data directory, which is what makes the guard
/// check meaningful.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Serializes batch application against other batches.
	batch_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			batch_lock: Mutex::new(()),
		}
	}

	/// Converts a storage key to a filesystem path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		match key.split_once(':') {
			Some((namespace, id)) => self
				.base_path
				.join(sanitize(namespace))
				.join(format!("{}.bin", sanitize(id))),
			None => self.base_path.join(format!("{}.bin", sanitize(key))),
		}
	}

	async fn write_file(&self, path: &PathBuf, value: &[u8]) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}
}

/// Replaces path-hostile characters so ids are filesystem-safe.
fn sanitize(part: &str) -> String {
	part.replace(['/', ':', '\\'], "_")
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		self.write_file(&path, &value).await
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		Ok(path.exists())
	}

	async fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let dir = self.base_path.join(sanitize(namespace));

		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut ids = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() == Some(std::ffi::OsStr::new("bin")) {
				if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
					ids.push(stem.to_string());
				}
			}
		}
		Ok(ids)
	}

	async fn write_batch(&self, writes: Vec<BatchWrite>) -> Result<(), StorageError> {
		let _guard = self.batch_lock.lock().await;

		// Check every guard before the first write lands on disk
		for write in &writes {
			let present = self.get_file_path(&write.key).exists();
			match write.mode {
				WriteMode::Insert if present => return Err(StorageError::AlreadyExists),
				WriteMode::Update if !present => return Err(StorageError::NotFound),
				_ => {},
			}
		}

		for write in &writes {
			let path = self.get_file_path(&write.key);
			self.write_file(&path, &write.value).await?;
		}
		Ok(())
	}

	async fn next_sequence(&self, name: &str) -> Result<u64, StorageError> {
		let _guard = self.batch_lock.lock().await;
		let path = self.base_path.join(format!("{}.seq", sanitize(name)));

		let current = match fs::read_to_string(&path).await {
			Ok(contents) => contents
				.trim()
				.parse::<u64>()
				.map_err(|e| StorageError::Backend(format!("Corrupt sequence file: {}", e)))?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let next = current + 1;
		self.write_file(&path, next.to_string().as_bytes()).await?;
		Ok(next)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![Field::new("storage_path", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Registry entry for the file storage backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/tracker")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/tracker")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[tokio::test]
	async fn test_round_trip_and_delete() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("orders:1", b"payload".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("orders:1").await.unwrap(), b"payload".to_vec());
		assert!(storage.exists("orders:1").await.unwrap());

		storage.delete("orders:1").await.unwrap();
		assert!(matches!(
			storage.get_bytes("orders:1").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_keys_per_namespace() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("orders:1", b"a".to_vec()).await.unwrap();
		storage.set_bytes("orders:2", b"b".to_vec()).await.unwrap();
		storage
			.set_bytes("tracking:BT-AAAAAAAA", b"c".to_vec())
			.await
			.unwrap();

		let mut ids = storage.keys("orders").await.unwrap();
		ids.sort();
		assert_eq!(ids, vec!["1".to_string(), "2".to_string()]);
		assert_eq!(storage.keys("tracking").await.unwrap().len(), 1);
		assert!(storage.keys("missing").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_insert_guard_rejects_existing_key() {
		let dir = tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_bytes("tracking_by_order:7", b"BT-AAAAAAAA".to_vec())
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
	}

	#[tokio::test]
	async fn test_sequence_survives_reopen() {
		let dir = tempdir().unwrap();

		{
			let storage = FileStorage::new(dir.path().to_path_buf());
			assert_eq!(storage.next_sequence("orders").await.unwrap(), 1);
			assert_eq!(storage.next_sequence("orders").await.unwrap(), 2);
		}

		let storage = FileStorage::new(dir.path().to_path_buf());
		assert_eq!(storage.next_sequence("orders").await.unwrap(), 3);
	}
}
