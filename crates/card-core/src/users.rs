//! Account management service.
//!
//! Handles signup and profile updates. Email uniqueness is enforced through
//! the `users_by_email` index entry, which maps a lowercased email to the
//! owning account id and moves together with the account record.

use card_auth::hash_password;
use card_storage::{StorageError, StorageService};
use card_types::{SignupRequest, StorageKey, UpdateProfileRequest, User, UserProfile};
use std::sync::Arc;
use uuid::Uuid;

use crate::{current_timestamp, CoreError};

/// Service implementing account signup and profile updates.
pub struct UserService {
	storage: Arc<StorageService>,
	/// Minimum accepted credential length at signup.
	min_password_length: usize,
}

impl UserService {
	/// Creates a new UserService.
	pub fn new(storage: Arc<StorageService>, min_password_length: usize) -> Self {
		Self {
			storage,
			min_password_length,
		}
	}

	/// Creates a new account.
	///
	/// The email must not already be in use. The credential is hashed before
	/// the record is written; the plaintext is never stored.
	pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile, CoreError> {
		let email = request.email.trim().to_lowercase();

		if request.first_name.trim().is_empty()
			|| request.last_name.trim().is_empty()
			|| email.is_empty()
		{
			return Err(CoreError::Validation(
				"first name, last name and email are required".to_string(),
			));
		}

		if !email.contains('@') {
			return Err(CoreError::Validation("invalid email address".to_string()));
		}

		if request.password.len() < self.min_password_length {
			return Err(CoreError::Validation(format!(
				"password must be at least {} characters",
				self.min_password_length
			)));
		}

		if self.lookup_email(&email).await?.is_some() {
			return Err(CoreError::Conflict(
				"an account with this email already exists".to_string(),
			));
		}

		let password_hash =
			hash_password(&request.password).map_err(|e| CoreError::Internal(e.to_string()))?;

		let now = current_timestamp();
		let user = User {
			id: Uuid::new_v4().to_string(),
			first_name: request.first_name.trim().to_string(),
			last_name: request.last_name.trim().to_string(),
			email: email.clone(),
			phone: request.phone,
			password_hash,
			created_at: now,
			updated_at: now,
		};

		self.storage
			.store(StorageKey::Users.as_str(), &user.id, &user)
			.await?;
		self.storage
			.store(StorageKey::UsersByEmail.as_str(), &email, &user.id)
			.await?;

		tracing::info!(user_id = %user.id, "Account created");
		Ok(user.into())
	}

	/// Updates the calling user's profile.
	///
	/// Fields left out of the request keep their stored value. Changing the
	/// email re-checks uniqueness and moves the email index entry along with
	/// the account record.
	pub async fn update_profile(
		&self,
		user_id: &str,
		request: UpdateProfileRequest,
	) -> Result<UserProfile, CoreError> {
		let mut user: User = self
			.storage
			.retrieve(StorageKey::Users.as_str(), user_id)
			.await?;

		let new_email = match &request.email {
			Some(email) => {
				let email = email.trim().to_lowercase();
				if !email.contains('@') {
					return Err(CoreError::Validation("invalid email address".to_string()));
				}
				if email != user.email {
					match self.lookup_email(&email).await? {
						Some(owner) if owner != user.id => {
							return Err(CoreError::Conflict(
								"an account with this email already exists".to_string(),
							));
						},
						_ => Some(email),
					}
				} else {
					None
				}
			},
			None => None,
		};

		if let Some(first_name) = request.first_name {
			user.first_name = first_name;
		}
		if let Some(last_name) = request.last_name {
			user.last_name = last_name;
		}
		if let Some(phone) = request.phone {
			user.phone = Some(phone);
		}

		if let Some(email) = new_email {
			let old_email = std::mem::replace(&mut user.email, email.clone());
			self.storage
				.store(StorageKey::UsersByEmail.as_str(), &email, &user.id)
				.await?;
			self.storage
				.remove(StorageKey::UsersByEmail.as_str(), &old_email)
				.await?;
		}

		user.updated_at = current_timestamp();
		self.storage
			.update(StorageKey::Users.as_str(), &user.id, &user)
			.await?;

		Ok(user.into())
	}

	/// Looks up which account id, if any, owns an email address.
	async fn lookup_email(&self, email: &str) -> Result<Option<String>, CoreError> {
		match self
			.storage
			.retrieve::<String>(StorageKey::UsersByEmail.as_str(), email)
			.await
		{
			Ok(id) => Ok(Some(id)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}
}
