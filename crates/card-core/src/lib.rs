//! Core services for the CardCraft backend.
//!
//! This crate owns the order lifecycle (creation, best-effort submission to
//! the generation backend, and status reconciliation on read) together with
//! the supporting account and contact-intake services. Everything here is
//! request/response: each operation takes the caller's identity explicitly
//! and touches at most one order.

use card_storage::StorageError;
use card_types::ApiError;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Contact intake service.
pub mod contact;
/// Order lifecycle manager.
pub mod orders;
/// Order state machine and persistence helpers.
pub mod state;
/// Account management service.
pub mod users;

pub use contact::ContactService;
pub use orders::OrderService;
pub use state::{OrderStateError, OrderStateMachine};
pub use users::UserService;

/// Errors surfaced by the core services.
#[derive(Debug, Error)]
pub enum CoreError {
	/// Missing or invalid required input.
	#[error("Validation failed: {0}")]
	Validation(String),
	/// Uniqueness violation.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// Entity absent or not owned by the caller. The two cases are never
	/// distinguished.
	#[error("Not found")]
	NotFound,
	/// Error from the storage backend.
	#[error("Storage error: {0}")]
	Storage(String),
	/// Anything else.
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<StorageError> for CoreError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::NotFound => CoreError::NotFound,
			other => CoreError::Storage(other.to_string()),
		}
	}
}

impl From<CoreError> for ApiError {
	fn from(err: CoreError) -> Self {
		match err {
			CoreError::Validation(message) => ApiError::Validation { message },
			CoreError::Conflict(message) => ApiError::Conflict { message },
			CoreError::NotFound => ApiError::NotFound {
				message: "Resource not found".to_string(),
			},
			CoreError::Storage(message) | CoreError::Internal(message) => {
				tracing::error!("Internal failure: {}", message);
				ApiError::Internal
			},
		}
	}
}

/// Returns the current Unix timestamp in seconds.
pub(crate) fn current_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}
