//! API types for the CardCraft HTTP API.
//!
//! This module defines the request and response types for the API endpoints
//! together with the structured error type and its HTTP status mapping.

use crate::order::{Marketplace, OrderStatus, Tariff};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for creating an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
	pub product_name: String,
	pub product_description: String,
	pub marketplace: Marketplace,
	/// Declared price of the underlying product. Distinct from the amount
	/// charged, which is derived from the tariff.
	pub price: u64,
	pub tariff: Tariff,
	/// Uploaded image references. Must contain at least one entry.
	#[serde(default)]
	pub product_images: Vec<String>,
}

/// Summary returned after an order has been created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
	/// Identifier of the newly created order.
	pub id: String,
	/// Status after the best-effort backend submission: `processing` when
	/// the backend acknowledged the job, `pending` otherwise.
	pub status: OrderStatus,
	/// Amount charged, derived from the tariff table.
	pub total_amount: u64,
}

/// Request body for account signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub phone: Option<String>,
	pub password: String,
}

/// Request body for updating a user profile.
///
/// Fields left out keep their stored value; fields supplied explicitly
/// overwrite it, including with an empty value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
}

/// Request body for login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

/// Response carrying a freshly issued session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
	/// Opaque bearer token for subsequent requests.
	pub token: String,
}

/// Request body for the contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
	pub name: String,
	pub email: String,
	pub subject: Option<String>,
	pub message: String,
}

/// Receipt returned after a contact message has been accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactReceipt {
	/// Identifier of the stored message.
	pub id: String,
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
	/// No valid session (401)
	Unauthenticated,
	/// Missing or invalid required input (400)
	Validation { message: String },
	/// Uniqueness violation (409)
	Conflict { message: String },
	/// Entity absent or not owned by the caller (404). Existence and
	/// ownership are never distinguished in the response.
	NotFound { message: String },
	/// Anything else, surfaced without leaking internals (500)
	Internal,
}

impl ApiError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::Unauthenticated => 401,
			ApiError::Validation { .. } => 400,
			ApiError::Conflict { .. } => 409,
			ApiError::NotFound { .. } => 404,
			ApiError::Internal => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			ApiError::Unauthenticated => ErrorResponse {
				error: "UNAUTHENTICATED".to_string(),
				message: "Authentication required".to_string(),
			},
			ApiError::Validation { message } => ErrorResponse {
				error: "VALIDATION_FAILED".to_string(),
				message: message.clone(),
			},
			ApiError::Conflict { message } => ErrorResponse {
				error: "CONFLICT".to_string(),
				message: message.clone(),
			},
			ApiError::NotFound { message } => ErrorResponse {
				error: "NOT_FOUND".to_string(),
				message: message.clone(),
			},
			ApiError::Internal => ErrorResponse {
				error: "INTERNAL_ERROR".to_string(),
				message: "Internal server error".to_string(),
			},
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiError::Unauthenticated => write!(f, "Unauthenticated"),
			ApiError::Validation { message } => write!(f, "Validation failed: {}", message),
			ApiError::Conflict { message } => write!(f, "Conflict: {}", message),
			ApiError::NotFound { message } => write!(f, "Not found: {}", message),
			ApiError::Internal => write!(f, "Internal server error"),
		}
	}
}

impl std::error::Error for ApiError {}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		(status, Json(self.to_error_response())).into_response()
	}
}
