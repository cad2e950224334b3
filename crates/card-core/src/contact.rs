//! Contact intake service.
//!
//! Accepts support inquiries from anonymous visitors and persists them for
//! operators. Intake is write-once; nothing in the public surface reads
//! messages back.

use card_storage::StorageService;
use card_types::{ContactMessage, ContactReceipt, ContactRequest, ContactStatus, StorageKey};
use std::sync::Arc;
use uuid::Uuid;

use crate::{current_timestamp, CoreError};

/// Service accepting contact form submissions.
pub struct ContactService {
	storage: Arc<StorageService>,
}

impl ContactService {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Accepts a contact message and returns a receipt for it.
	pub async fn submit(&self, request: ContactRequest) -> Result<ContactReceipt, CoreError> {
		if request.name.trim().is_empty()
			|| request.email.trim().is_empty()
			|| request.message.trim().is_empty()
		{
			return Err(CoreError::Validation(
				"name, email and message are required".to_string(),
			));
		}

		let message = ContactMessage {
			id: Uuid::new_v4().to_string(),
			name: request.name,
			email: request.email,
			subject: request.subject,
			message: request.message,
			status: ContactStatus::New,
			created_at: current_timestamp(),
		};

		self.storage
			.store(StorageKey::ContactMessages.as_str(), &message.id, &message)
			.await?;

		tracing::info!(message_id = %message.id, "Contact message received");
		Ok(ContactReceipt { id: message.id })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use card_storage::implementations::memory::MemoryStorage;

	fn service() -> (ContactService, Arc<StorageService>) {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		(ContactService::new(Arc::clone(&storage)), storage)
	}

	#[tokio::test]
	async fn submit_persists_message_as_new() {
		let (service, storage) = service();

		let receipt = service
			.submit(ContactRequest {
				name: "Anna".to_string(),
				email: "anna@example.com".to_string(),
				subject: None,
				message: "How long does generation take?".to_string(),
			})
			.await
			.unwrap();

		let stored: ContactMessage = storage
			.retrieve(StorageKey::ContactMessages.as_str(), &receipt.id)
			.await
			.unwrap();
		assert_eq!(stored.status, ContactStatus::New);
		assert_eq!(stored.email, "anna@example.com");
	}

	#[tokio::test]
	async fn blank_message_fails_validation() {
		let (service, _storage) = service();

		let result = service
			.submit(ContactRequest {
				name: "Anna".to_string(),
				email: "anna@example.com".to_string(),
				subject: Some("Question".to_string()),
				message: "   ".to_string(),
			})
			.await;
		assert!(matches!(result, Err(CoreError::Validation(_))));
	}
}
