//! Authentication collaborator for the CardCraft backend.
//!
//! Owns the three auth concerns the rest of the system delegates: one-way
//! credential hashing, credential verification at login, and opaque session
//! tokens. Sessions are persisted through the storage service with a TTL so
//! they expire server-side; resolving a token yields the request-scoped
//! [`AuthenticatedUser`] identity that every operation takes explicitly.

use card_storage::{StorageError, StorageService};
use card_types::{AuthenticatedUser, StorageKey, User};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
	/// Unknown email or wrong password. The two cases are deliberately not
	/// distinguished.
	#[error("Invalid credentials")]
	InvalidCredentials,
	/// Missing, unknown or expired session token.
	#[error("Invalid session")]
	InvalidSession,
	/// Error that occurs during credential hashing or verification.
	#[error("Hashing error: {0}")]
	Hashing(String),
	/// Error from the storage backend.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<AuthError> for card_types::ApiError {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::InvalidCredentials | AuthError::InvalidSession => {
				card_types::ApiError::Unauthenticated
			},
			AuthError::Hashing(message) | AuthError::Storage(message) => {
				tracing::error!("Auth failure: {}", message);
				card_types::ApiError::Internal
			},
		}
	}
}

/// Hashes a credential for storage.
///
/// Uses bcrypt with the default cost factor (12). The produced hash embeds
/// its salt and cost, so verification needs no extra state.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
	bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verifies a credential against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
	bcrypt::verify(password, hash).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Service that validates credentials and manages sessions.
pub struct AuthService {
	/// Storage service for user lookups and session records.
	storage: Arc<StorageService>,
	/// How long an issued session stays valid.
	session_ttl: Duration,
}

impl AuthService {
	/// Creates a new AuthService with the given session lifetime.
	pub fn new(storage: Arc<StorageService>, session_ttl: Duration) -> Self {
		Self {
			storage,
			session_ttl,
		}
	}

	/// Validates credentials and issues a session token.
	///
	/// The email is normalized the same way signup normalizes it before the
	/// index entry is written, so casing at login never matters.
	pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
		let email = email.trim().to_lowercase();
		let user_id: String = match self
			.storage
			.retrieve(StorageKey::UsersByEmail.as_str(), &email)
			.await
		{
			Ok(id) => id,
			Err(StorageError::NotFound) => return Err(AuthError::InvalidCredentials),
			Err(e) => return Err(AuthError::Storage(e.to_string())),
		};

		let user: User = self
			.storage
			.retrieve(StorageKey::Users.as_str(), &user_id)
			.await
			.map_err(|e| AuthError::Storage(e.to_string()))?;

		if !verify_password(password, &user.password_hash)? {
			return Err(AuthError::InvalidCredentials);
		}

		self.issue_session(&AuthenticatedUser {
			id: user.id,
			email: user.email,
		})
		.await
	}

	/// Issues a session token for an already-verified identity.
	pub async fn issue_session(&self, user: &AuthenticatedUser) -> Result<String, AuthError> {
		let token = Uuid::new_v4().to_string();

		self.storage
			.store_with_ttl(
				StorageKey::Sessions.as_str(),
				&token,
				user,
				Some(self.session_ttl),
			)
			.await
			.map_err(|e| AuthError::Storage(e.to_string()))?;

		tracing::debug!(user_id = %user.id, "Issued session");
		Ok(token)
	}

	/// Resolves a session token to the identity it was issued for.
	///
	/// An unknown token and an expired one are indistinguishable.
	pub async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
		match self
			.storage
			.retrieve(StorageKey::Sessions.as_str(), token)
			.await
		{
			Ok(user) => Ok(user),
			Err(StorageError::NotFound) => Err(AuthError::InvalidSession),
			Err(e) => Err(AuthError::Storage(e.to_string())),
		}
	}

	/// Revokes a session token. Revoking an unknown token is not an error.
	pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
		self.storage
			.remove(StorageKey::Sessions.as_str(), token)
			.await
			.map_err(|e| AuthError::Storage(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use card_storage::implementations::memory::MemoryStorage;

	fn test_storage() -> Arc<StorageService> {
		Arc::new(StorageService::new(Box::new(MemoryStorage::new())))
	}

	async fn seed_user(storage: &StorageService, email: &str, password: &str) -> String {
		let user = User {
			id: "u1".to_string(),
			first_name: "Anna".to_string(),
			last_name: "Petrova".to_string(),
			email: email.to_string(),
			phone: None,
			password_hash: hash_password(password).unwrap(),
			created_at: 0,
			updated_at: 0,
		};
		storage
			.store(StorageKey::Users.as_str(), &user.id, &user)
			.await
			.unwrap();
		storage
			.store(StorageKey::UsersByEmail.as_str(), email, &user.id)
			.await
			.unwrap();
		user.id
	}

	#[test]
	fn hash_and_verify_round_trip() {
		let hash = hash_password("secret123").unwrap();
		assert_ne!(hash, "secret123");
		assert!(verify_password("secret123", &hash).unwrap());
		assert!(!verify_password("wrong", &hash).unwrap());
	}

	#[tokio::test]
	async fn login_issues_resolvable_session() {
		let storage = test_storage();
		let user_id = seed_user(&storage, "anna@example.com", "secret123").await;
		let auth = AuthService::new(Arc::clone(&storage), Duration::from_secs(3600));

		let token = auth.login("anna@example.com", "secret123").await.unwrap();
		let identity = auth.resolve(&token).await.unwrap();
		assert_eq!(identity.id, user_id);
		assert_eq!(identity.email, "anna@example.com");
	}

	#[tokio::test]
	async fn login_accepts_any_email_casing() {
		let storage = test_storage();
		let user_id = seed_user(&storage, "anna@example.com", "secret123").await;
		let auth = AuthService::new(Arc::clone(&storage), Duration::from_secs(3600));

		// The index entry is keyed by the normalized form; the raw string the
		// owner typed must still resolve to it
		let token = auth.login(" Anna@Example.com ", "secret123").await.unwrap();
		let identity = auth.resolve(&token).await.unwrap();
		assert_eq!(identity.id, user_id);
	}

	#[tokio::test]
	async fn wrong_password_and_unknown_email_are_indistinguishable() {
		let storage = test_storage();
		seed_user(&storage, "anna@example.com", "secret123").await;
		let auth = AuthService::new(storage, Duration::from_secs(3600));

		let wrong = auth.login("anna@example.com", "nope").await;
		let unknown = auth.login("ghost@example.com", "secret123").await;
		assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
		assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
	}

	#[tokio::test]
	async fn revoked_session_no_longer_resolves() {
		let storage = test_storage();
		seed_user(&storage, "anna@example.com", "secret123").await;
		let auth = AuthService::new(storage, Duration::from_secs(3600));

		let token = auth.login("anna@example.com", "secret123").await.unwrap();
		auth.revoke(&token).await.unwrap();

		assert!(matches!(
			auth.resolve(&token).await,
			Err(AuthError::InvalidSession)
		));
		// Revoking twice is fine
		auth.revoke(&token).await.unwrap();
	}
}
