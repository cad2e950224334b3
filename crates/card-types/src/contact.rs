//! Contact intake types.

use serde::{Deserialize, Serialize};

/// A submitted support inquiry.
///
/// Write-once from the intake's perspective; only an operator ever moves a
/// message out of the `new` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
	/// Unique identifier for this message.
	pub id: String,
	pub name: String,
	pub email: String,
	pub subject: Option<String>,
	pub message: String,
	/// Processing status. Always `new` when created.
	pub status: ContactStatus,
	/// Unix timestamp when this message was submitted.
	pub created_at: u64,
}

/// Processing status of a contact message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
	/// Newly submitted, not yet looked at.
	#[default]
	New,
	/// Handled by an operator.
	Processed,
}
