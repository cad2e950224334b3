//! HTTP client implementation for the generation backend.
//!
//! Speaks the backend's JSON envelope: every response carries a `success`
//! flag and an optional `data` payload. Transport errors, malformed bodies
//! and `success: false` are all reported as errors to the caller, which
//! absorbs them on the order path.

use crate::{
	CardJobRequest, CardJobStatus, GeneratorError, GeneratorFactory, GeneratorInterface,
	GeneratorRegistry,
};
use async_trait::async_trait;
use card_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderStatus, Schema, ValidationError,
};
use serde::Deserialize;
use std::time::Duration;

/// Default request timeout in seconds. A stalled backend call must not block
/// the read path indefinitely; expiry counts as a failed query.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Response envelope for a job submission.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
	success: bool,
	data: Option<SubmitData>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
	order_id: String,
}

/// Response envelope for a status query.
#[derive(Debug, Deserialize)]
struct StatusResponse {
	success: bool,
	data: Option<StatusData>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
	status: String,
	card_url: Option<String>,
}

/// HTTP client for the generation backend.
pub struct HttpGenerator {
	/// Shared HTTP client with connection pooling and a bounded timeout.
	client: reqwest::Client,
	/// Base URL of the backend API, without a trailing slash.
	base_url: String,
}

impl HttpGenerator {
	/// Creates a new client for the backend at `base_url`.
	pub fn new(base_url: String, timeout: Duration) -> Result<Self, GeneratorError> {
		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.timeout(timeout)
			.build()
			.map_err(|e| GeneratorError::Configuration(e.to_string()))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}
}

#[async_trait]
impl GeneratorInterface for HttpGenerator {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpGeneratorSchema)
	}

	async fn submit_order(&self, request: &CardJobRequest) -> Result<String, GeneratorError> {
		let url = format!("{}/orders", self.base_url);

		let response = self
			.client
			.post(&url)
			.json(request)
			.send()
			.await
			.map_err(|e| GeneratorError::Network(e.to_string()))?;

		let body: SubmitResponse = response
			.json()
			.await
			.map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

		if !body.success {
			return Err(GeneratorError::Rejected);
		}

		body.data
			.map(|data| data.order_id)
			.ok_or_else(|| GeneratorError::InvalidResponse("missing order_id".to_string()))
	}

	async fn fetch_status(&self, backend_order_id: &str) -> Result<CardJobStatus, GeneratorError> {
		let url = format!("{}/orders/{}/status", self.base_url, backend_order_id);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| GeneratorError::Network(e.to_string()))?;

		let body: StatusResponse = response
			.json()
			.await
			.map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

		if !body.success {
			return Err(GeneratorError::Rejected);
		}

		let data = body
			.data
			.ok_or_else(|| GeneratorError::InvalidResponse("missing status data".to_string()))?;

		let status = data
			.status
			.parse::<OrderStatus>()
			.map_err(GeneratorError::InvalidResponse)?;

		Ok(CardJobStatus {
			status,
			card_url: data.card_url,
		})
	}
}

/// Configuration schema for the HTTP generator client.
pub struct HttpGeneratorSchema;

impl ConfigSchema for HttpGeneratorSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("api_url", FieldType::String).with_validator(|value| {
				let url = value.as_str().unwrap_or_default();
				if url.starts_with("http://") || url.starts_with("https://") {
					Ok(())
				} else {
					Err("api_url must start with http:// or https://".to_string())
				}
			})],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
		);

		schema.validate(config)
	}
}

/// Registry entry for the HTTP generator client.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = GeneratorFactory;

	fn factory() -> Self::Factory {
		create_generator
	}
}

impl GeneratorRegistry for Registry {}

/// Factory function to create an HTTP generator client from configuration.
///
/// Configuration parameters:
/// - `api_url`: Base URL of the generation backend (required)
/// - `timeout_seconds`: Request timeout in seconds (default: 30)
pub fn create_generator(
	config: &toml::Value,
) -> Result<Box<dyn GeneratorInterface>, GeneratorError> {
	let api_url = config
		.get("api_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| GeneratorError::Configuration("api_url is required".to_string()))?
		.to_string();

	let timeout_seconds = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECS);

	let client = HttpGenerator::new(api_url, Duration::from_secs(timeout_seconds))?;

	Ok(Box::new(client))
}
