//! Main entry point for the CardCraft backend service.
//!
//! This binary wires the configured storage and generation-backend
//! implementations into the core services and serves the HTTP API until
//! interrupted.

use card_config::{Config, GeneratorConfig, StorageConfig};
use card_core::{ContactService, OrderService, UserService};
use card_generator::GeneratorService;
use card_storage::StorageService;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod server;

use server::AppState;

/// Command-line arguments for the backend service.
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

	let config = Config::from_file_async(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let state = build_state(&config)?;

	// Periodically drop expired entries (sessions, mostly) from storage
	let cleanup_storage = Arc::clone(&state.storage);
	let cleanup_interval = Duration::from_secs(config.storage.cleanup_interval_seconds);
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(cleanup_interval);
		ticker.tick().await; // First tick fires immediately; skip it
		loop {
			ticker.tick().await;
			match cleanup_storage.cleanup_expired().await {
				Ok(0) => {},
				Ok(removed) => tracing::debug!("Removed {} expired storage entries", removed),
				Err(e) => tracing::warn!("Storage cleanup failed: {}", e),
			}
		}
	});

	tokio::select! {
		result = server::start_server(&config.api, state) => {
			tracing::info!("API server finished");
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	Ok(())
}

/// Builds the shared application state from configuration.
///
/// Resolves the configured primary storage and generator implementations
/// through their factory registries and constructs the core services on top.
fn build_state(config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
	let storage = build_storage(&config.storage)?;
	let generator = build_generator(&config.generator)?;

	let auth = Arc::new(card_auth::AuthService::new(
		Arc::clone(&storage),
		Duration::from_secs(config.auth.session_ttl_seconds),
	));
	let users = Arc::new(UserService::new(
		Arc::clone(&storage),
		config.auth.min_password_length,
	));
	let orders = Arc::new(OrderService::new(Arc::clone(&storage), generator));
	let contact = Arc::new(ContactService::new(Arc::clone(&storage)));

	Ok(AppState {
		storage,
		auth,
		users,
		orders,
		contact,
	})
}

/// Instantiates the configured primary storage backend.
fn build_storage(config: &StorageConfig) -> Result<Arc<StorageService>, Box<dyn std::error::Error>> {
	let factory = card_storage::get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == config.primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| format!("unknown storage implementation '{}'", config.primary))?;

	// Config validation guarantees the section exists
	let section = config
		.implementations
		.get(&config.primary)
		.ok_or_else(|| format!("missing configuration for storage '{}'", config.primary))?;

	let backend = factory(section)?;
	backend
		.config_schema()
		.validate(section)
		.map_err(|e| format!("invalid configuration for storage '{}': {}", config.primary, e))?;

	tracing::info!("Using '{}' storage backend", config.primary);
	Ok(Arc::new(StorageService::new(backend)))
}

/// Instantiates the configured primary generation-backend client.
fn build_generator(
	config: &GeneratorConfig,
) -> Result<Arc<GeneratorService>, Box<dyn std::error::Error>> {
	let factory = card_generator::get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == config.primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| format!("unknown generator implementation '{}'", config.primary))?;

	let section = config
		.implementations
		.get(&config.primary)
		.ok_or_else(|| format!("missing configuration for generator '{}'", config.primary))?;

	let client = factory(section)?;
	client
		.config_schema()
		.validate(section)
		.map_err(|e| format!("invalid configuration for generator '{}': {}", config.primary, e))?;

	tracing::info!("Using '{}' generation backend client", config.primary);
	Ok(Arc::new(GeneratorService::new(client)))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn test_config() -> Config {
		r#"
[service]
id = "cardcraft-test"

[storage]
primary = "memory"

[storage.implementations.memory]

[generator]
primary = "http"

[generator.implementations.http]
api_url = "http://localhost:9000"

[api]
port = 8080
"#
		.parse()
		.unwrap()
	}

	#[test]
	fn args_default_values() {
		let args = Args {
			config: PathBuf::from("config.toml"),
			log_level: "info".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn build_state_with_minimal_config() {
		let config = test_config();
		let result = build_state(&config);
		assert!(result.is_ok(), "Failed to build state: {:?}", result.err());
	}

	#[test]
	fn unknown_storage_primary_is_rejected() {
		let mut config = test_config();
		config.storage.primary = "redis".to_string();
		config
			.storage
			.implementations
			.insert("redis".to_string(), toml::Value::Table(toml::map::Map::new()));

		assert!(build_storage(&config.storage).is_err());
	}

	#[tokio::test]
	async fn config_file_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			r#"
[service]
id = "cardcraft-file"

[storage]
primary = "file"
cleanup_interval_seconds = 300

[storage.implementations.file]
storage_path = "./data/test"
ttl_sessions = 3600

[generator]
primary = "http"

[generator.implementations.http]
api_url = "https://cards.example"

[api]
host = "0.0.0.0"
port = 8088
"#,
		)
		.unwrap();

		let config = Config::from_file_async(&path).await.unwrap();
		assert_eq!(config.service.id, "cardcraft-file");
		assert_eq!(config.storage.cleanup_interval_seconds, 300);
		assert_eq!(config.api.port, 8088);
	}
}
