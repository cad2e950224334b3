//! File-based storage backend implementation.
//!
//! This module provides a file-backed implementation of the StorageInterface
//! trait, storing each record as a binary file with a small header carrying
//! TTL information for automatic expiration. This is the default backend for
//! a single-node deployment.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use card_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, StorageKey, ValidationError,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Fixed-size file header for TTL support.
///
/// Binary layout (16 bytes total):
/// - bytes 0..4: magic "CCRD"
/// - bytes 4..6: version (u16, little-endian)
/// - bytes 6..8: reserved, zero
/// - bytes 8..16: expiration timestamp (u64, little-endian, Unix seconds, 0 = never)
#[derive(Debug, Clone)]
struct FileHeader {
	version: u16,
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"CCRD";
	const VERSION: u16 = 1;
	const SIZE: usize = 16;

	/// Creates a new header with the given TTL. A zero TTL means the record
	/// never expires.
	fn new(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.unwrap_or_default()
				.as_secs()
				.saturating_add(ttl.as_secs())
		};

		Self {
			version: Self::VERSION,
			expires_at,
		}
	}

	/// Serializes the header to bytes.
	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[8..16].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	/// Deserializes a header from bytes.
	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}

		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file format".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut expires_bytes = [0u8; 8];
		expires_bytes.copy_from_slice(&bytes[8..16]);
		let expires_at = u64::from_le_bytes(expires_bytes);

		Ok(Self {
			version,
			expires_at,
		})
	}

	/// Checks if the data has expired.
	fn is_expired(&self) -> bool {
		if self.expires_at == 0 {
			return false;
		}

		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_secs();

		now >= self.expires_at
	}
}

/// TTL configuration for different storage namespaces.
#[derive(Debug, Clone)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	/// Creates TTL config from TOML configuration.
	///
	/// Each storage namespace can carry a `ttl_<namespace>` key with a value
	/// in seconds; namespaces without one never expire.
	fn from_config(config: &toml::Value) -> Self {
		let mut ttls = HashMap::new();

		if let Some(table) = config.as_table() {
			for storage_key in StorageKey::all() {
				let config_key = format!("ttl_{}", storage_key.as_str());
				if let Some(ttl_value) = table
					.get(&config_key)
					.and_then(|v| v.as_integer())
					.map(|v| v as u64)
				{
					ttls.insert(storage_key, Duration::from_secs(ttl_value));
				}
			}
		}

		Self { ttls }
	}

	/// Gets the TTL for a specific storage namespace.
	fn get_ttl(&self, storage_key: StorageKey) -> Duration {
		self.ttls
			.get(&storage_key)
			.copied()
			.unwrap_or(Duration::ZERO)
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// TTL configuration for different storage namespaces.
	ttl_config: TtlConfig,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path and
	/// TTL config.
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// Sanitizes the key by replacing problematic characters and appending a
	/// .bin extension.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}

	/// Gets the configured TTL for a given key based on its namespace.
	fn get_ttl_for_key(&self, key: &str) -> Duration {
		// Parse namespace from key (e.g., "sessions:abc" -> "sessions")
		let namespace = key.split(':').next().unwrap_or("");

		namespace
			.parse::<StorageKey>()
			.map(|sk| self.ttl_config.get_ttl(sk))
			.unwrap_or(Duration::ZERO)
	}

	/// Removes all expired files from storage.
	async fn cleanup_expired_files(&self) -> Result<usize, StorageError> {
		let mut removed = 0;
		let mut entries = fs::read_dir(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}

			match fs::read(&path).await {
				Ok(data) => {
					let Ok(header) = FileHeader::deserialize(&data) else {
						tracing::debug!("Skipping file {:?}: unrecognized header", path);
						continue;
					};

					if header.is_expired() {
						if let Err(e) = fs::remove_file(&path).await {
							tracing::warn!("Failed to remove expired file {:?}: {}", path, e);
						} else {
							removed += 1;
						}
					}
				},
				Err(e) => {
					tracing::debug!("Skipping file {:?}: could not be read: {}", path, e);
				},
			}
		}
		Ok(removed)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::deserialize(&data)?;

		// An expired record is indistinguishable from a missing one
		if header.is_expired() {
			return Err(StorageError::NotFound);
		}

		Ok(data[FileHeader::SIZE..].to_vec())
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Determine TTL: use provided TTL, or get from config based on key
		let ttl = ttl.unwrap_or_else(|| self.get_ttl_for_key(key));

		let header = FileHeader::new(ttl);

		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&header.serialize());
		file_data.extend_from_slice(&value);

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
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

		// An expired record must read as absent here too, or an update could
		// resurrect it before cleanup runs
		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::deserialize(&data)?;
		Ok(!header.is_expired())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.cleanup_expired_files().await
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Build TTL fields dynamically based on StorageKey variants
		let mut optional_fields = vec![Field::new("storage_path", FieldType::String)];

		for storage_key in StorageKey::all() {
			let field_name = format!("ttl_{}", storage_key.as_str());
			optional_fields.push(Field::new(
				field_name,
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			));
		}

		let schema = Schema::new(vec![], optional_fields);

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
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
/// - `ttl_<namespace>`: TTL in seconds per storage namespace (default: no expiry);
///   `ttl_sessions` is the one a deployment normally sets.
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	let ttl_config = TtlConfig::from_config(config);

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		ttl_config,
	)))
}
