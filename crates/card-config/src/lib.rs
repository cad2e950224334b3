//! Configuration module for the CardCraft backend.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files with
//! `${ENV_VAR}` resolution and provides validation to ensure all required
//! configuration values are properly set.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the CardCraft backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the card-generation backend client.
	pub generator: GeneratorConfig,
	/// Configuration for authentication and sessions.
	#[serde(default)]
	pub auth: AuthConfig,
	/// Configuration for the HTTP API server.
	pub api: ApiConfig,
}

/// Configuration specific to this service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this instance, used in logs.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Interval in seconds for cleaning up expired storage entries.
	#[serde(default = "default_cleanup_interval_seconds")]
	pub cleanup_interval_seconds: u64,
}

fn default_cleanup_interval_seconds() -> u64 {
	3600
}

/// Configuration for the card-generation backend client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of generator implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for authentication and sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// How long an issued session stays valid, in seconds.
	#[serde(default = "default_session_ttl_seconds")]
	pub session_ttl_seconds: u64,
	/// Minimum accepted credential length at signup.
	#[serde(default = "default_min_password_length")]
	pub min_password_length: usize,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			session_ttl_seconds: default_session_ttl_seconds(),
			min_password_length: default_min_password_length(),
		}
	}
}

fn default_session_ttl_seconds() -> u64 {
	86_400 // 24 hours
}

fn default_min_password_length() -> usize {
	6
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

impl Config {
	/// Loads configuration from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	/// Loads configuration from a TOML file without blocking the runtime.
	pub async fn from_file_async(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Validates the loaded configuration.
	///
	/// Checks that the configured primary implementations actually have a
	/// configuration section, so a typo fails at startup rather than when
	/// the implementation is first used.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("service.id must not be empty".into()));
		}

		if !self.storage.implementations.contains_key(&self.storage.primary) {
			return Err(ConfigError::Validation(format!(
				"storage.primary '{}' has no matching entry in storage.implementations",
				self.storage.primary
			)));
		}

		if !self
			.generator
			.implementations
			.contains_key(&self.generator.primary)
		{
			return Err(ConfigError::Validation(format!(
				"generator.primary '{}' has no matching entry in generator.implementations",
				self.generator.primary
			)));
		}

		if self.api.port == 0 {
			return Err(ConfigError::Validation("api.port must not be 0".into()));
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

/// Resolves `${VAR}` references in configuration content against the
/// process environment. An unset variable is an error rather than an empty
/// substitution.
pub fn resolve_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
		.map_err(|e| ConfigError::Parse(e.to_string()))?;

	let mut result = String::with_capacity(content.len());
	let mut last_end = 0;

	for caps in re.captures_iter(content) {
		let whole = caps.get(0).ok_or_else(|| {
			ConfigError::Parse("malformed environment variable reference".into())
		})?;
		let name = &caps[1];

		let value = std::env::var(name).map_err(|_| {
			ConfigError::Validation(format!("environment variable '{}' is not set", name))
		})?;

		result.push_str(&content[last_end..whole.start()]);
		result.push_str(&value);
		last_end = whole.end();
	}

	result.push_str(&content[last_end..]);
	Ok(result)
}
