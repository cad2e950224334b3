//! User account and identity types.

use serde::{Deserialize, Serialize};

/// Persisted user account.
///
/// The credential hash is part of the stored record only; every outward
/// response uses the [`UserProfile`] projection instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Unique identifier for this user.
	pub id: String,
	pub first_name: String,
	pub last_name: String,
	/// Email address, unique across all accounts.
	pub email: String,
	pub phone: Option<String>,
	/// One-way hash of the user's credential. Never serialized into API
	/// responses.
	pub password_hash: String,
	/// Unix timestamp when this account was created.
	pub created_at: u64,
	/// Unix timestamp when this account was last updated.
	pub updated_at: u64,
}

/// Outward-facing projection of a user account, without the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	pub id: String,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub phone: Option<String>,
	pub created_at: u64,
	pub updated_at: u64,
}

impl From<User> for UserProfile {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			first_name: user.first_name,
			last_name: user.last_name,
			email: user.email,
			phone: user.phone,
			created_at: user.created_at,
			updated_at: user.updated_at,
		}
	}
}

/// Request-scoped identity of an authenticated caller.
///
/// Resolved exactly once at the HTTP boundary from a session token and then
/// passed explicitly into every operation; no service performs an ambient
/// session lookup of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
	/// Identifier of the account the session belongs to.
	pub id: String,
	/// Email of the account at the time the session was issued.
	pub email: String,
}
