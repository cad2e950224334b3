//! Remote card-generation client for the CardCraft backend.
//!
//! This module provides the abstraction over the opaque generation service
//! that actually produces product cards. Only its request/response contract
//! matters here: submit a job and get a job id back, or query a job's
//! current status and optional card URL.

use async_trait::async_trait;
use card_types::{ConfigSchema, ImplementationRegistry, Marketplace, OrderStatus, Tariff};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur when talking to the generation backend.
///
/// Callers on the order path always absorb these: a failed submission leaves
/// the order pending, a failed status query returns the stored record.
#[derive(Debug, Error)]
pub enum GeneratorError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when the backend returns a malformed response.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// Error that occurs when the backend reports non-success.
	#[error("Backend rejected the request")]
	Rejected,
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Payload submitted to the generation backend for a new card job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardJobRequest {
	pub product_name: String,
	pub product_description: String,
	pub marketplace: Marketplace,
	pub price: u64,
	pub tariff: Tariff,
	pub images: Vec<String>,
}

/// The backend's current view of a card job.
#[derive(Debug, Clone, PartialEq)]
pub struct CardJobStatus {
	/// Lifecycle status reported by the backend.
	pub status: OrderStatus,
	/// URL of the generated card, once the backend has produced one.
	pub card_url: Option<String>,
}

/// Trait defining the interface for generation backend clients.
#[async_trait]
pub trait GeneratorInterface: Send + Sync {
	/// Returns the configuration schema for this client implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Submits a card job to the backend.
	///
	/// Returns the backend's job identifier on success. A transport error,
	/// a malformed body and a `success: false` envelope are all failures.
	async fn submit_order(&self, request: &CardJobRequest) -> Result<String, GeneratorError>;

	/// Fetches the current status of a previously submitted job.
	async fn fetch_status(&self, backend_order_id: &str) -> Result<CardJobStatus, GeneratorError>;
}

/// Type alias for generator factory functions.
pub type GeneratorFactory = fn(&toml::Value) -> Result<Box<dyn GeneratorInterface>, GeneratorError>;

/// Registry trait for generator implementations.
pub trait GeneratorRegistry: ImplementationRegistry<Factory = GeneratorFactory> {}

/// Get all registered generator implementations.
pub fn get_all_implementations() -> Vec<(&'static str, GeneratorFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}

/// Service that wraps a generation backend client.
///
/// Provides the narrow surface the order lifecycle needs and a single place
/// to hang shared behavior (tracing spans, future retry policy) without
/// touching the client implementations.
pub struct GeneratorService {
	/// The underlying client implementation.
	implementation: Box<dyn GeneratorInterface>,
}

impl GeneratorService {
	/// Creates a new GeneratorService with the specified implementation.
	pub fn new(implementation: Box<dyn GeneratorInterface>) -> Self {
		Self { implementation }
	}

	/// Submits a card job, returning the backend's job identifier.
	pub async fn submit_order(&self, request: &CardJobRequest) -> Result<String, GeneratorError> {
		self.implementation.submit_order(request).await
	}

	/// Fetches the backend's current view of a job.
	pub async fn fetch_status(
		&self,
		backend_order_id: &str,
	) -> Result<CardJobStatus, GeneratorError> {
		self.implementation.fetch_status(backend_order_id).await
	}
}
