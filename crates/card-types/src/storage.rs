//! Storage-related types for the order intake.

use std::str::FromStr;

/// Storage keys for different data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Key for storing order records
	Orders,
	/// Key for storing user accounts
	Users,
	/// Key for mapping email addresses to user IDs
	UsersByEmail,
	/// Key for mapping user IDs to their order IDs
	UserOrders,
	/// Key for storing active session tokens
	Sessions,
	/// Key for storing contact messages
	ContactMessages,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::Users => "users",
			StorageKey::UsersByEmail => "users_by_email",
			StorageKey::UserOrders => "user_orders",
			StorageKey::Sessions => "sessions",
			StorageKey::ContactMessages => "contact_messages",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::Users,
			Self::UsersByEmail,
			Self::UserOrders,
			Self::Sessions,
			Self::ContactMessages,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"users" => Ok(Self::Users),
			"users_by_email" => Ok(Self::UsersByEmail),
			"user_orders" => Ok(Self::UserOrders),
			"sessions" => Ok(Self::Sessions),
			"contact_messages" => Ok(Self::ContactMessages),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
