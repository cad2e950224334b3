//! Order state machine implementation.
//!
//! Manages order state transitions with validation, ensuring orders move
//! through valid lifecycle states: pending -> processing -> completed/failed.
//! Also provides the persistence helpers the lifecycle manager mutates
//! orders through, so every update stamps `updated_at` in one place.

use card_storage::{StorageError, StorageService};
use card_types::{Order, OrderStatus, StorageKey};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::{current_timestamp, CoreError};

/// Errors that can occur during order state management.
#[derive(Debug, Error)]
pub enum OrderStateError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Invalid state transition from {from:?} to {to:?}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Order not found: {0}")]
	OrderNotFound(String),
}

impl From<OrderStateError> for CoreError {
	fn from(err: OrderStateError) -> Self {
		match err {
			OrderStateError::OrderNotFound(_) => CoreError::NotFound,
			OrderStateError::Storage(message) => CoreError::Storage(message),
			invalid @ OrderStateError::InvalidTransition { .. } => {
				CoreError::Internal(invalid.to_string())
			},
		}
	}
}

// Static transition table - each state maps to allowed next states.
// Reconciliation may observe the backend jumping straight from pending to a
// terminal state, so pending allows everything processing does.
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Pending,
		HashSet::from([
			OrderStatus::Processing,
			OrderStatus::Completed,
			OrderStatus::Failed,
		]),
	);
	m.insert(
		OrderStatus::Processing,
		HashSet::from([OrderStatus::Completed, OrderStatus::Failed]),
	);
	m.insert(OrderStatus::Completed, HashSet::new()); // terminal
	m.insert(OrderStatus::Failed, HashSet::new()); // terminal
	m
});

/// Manages order state transitions and persistence.
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
}

impl OrderStateMachine {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Gets an order by ID.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderStateError> {
		match self
			.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
		{
			Ok(order) => Ok(order),
			Err(StorageError::NotFound) => Err(OrderStateError::OrderNotFound(order_id.to_string())),
			Err(e) => Err(OrderStateError::Storage(e.to_string())),
		}
	}

	/// Stores a new order.
	pub async fn store_order(&self, order: &Order) -> Result<(), OrderStateError> {
		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, order)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))
	}

	/// Updates an order with a closure and persists it.
	///
	/// Automatically stamps `updated_at`; all order mutations go through
	/// here so the timestamp can never be forgotten.
	pub async fn update_order_with<F>(
		&self,
		order_id: &str,
		updater: F,
	) -> Result<Order, OrderStateError>
	where
		F: FnOnce(&mut Order),
	{
		let mut order = self.get_order(order_id).await?;

		updater(&mut order);
		order.updated_at = current_timestamp();

		self.storage
			.update(StorageKey::Orders.as_str(), order_id, &order)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))?;

		Ok(order)
	}

	/// Records the backend's acknowledgment of a submission.
	///
	/// Moves the order to `processing` and stores the job id the backend
	/// assigned, after validating the transition.
	pub async fn mark_submitted(
		&self,
		order_id: &str,
		backend_order_id: String,
	) -> Result<Order, OrderStateError> {
		let order = self.get_order(order_id).await?;
		Self::check_transition(order.status, OrderStatus::Processing)?;

		self.update_order_with(order_id, |o| {
			o.status = OrderStatus::Processing;
			o.backend_order_id = Some(backend_order_id);
		})
		.await
	}

	/// Applies the backend's view of a job to the stored order.
	///
	/// Sets the status to the remote one (validated when it actually
	/// changes) and adopts the remote card URL when provided; a stored URL
	/// is never overwritten with nothing.
	pub async fn apply_remote_status(
		&self,
		order_id: &str,
		status: OrderStatus,
		card_url: Option<String>,
	) -> Result<Order, OrderStateError> {
		let order = self.get_order(order_id).await?;
		if order.status != status {
			Self::check_transition(order.status, status)?;
		}

		self.update_order_with(order_id, |o| {
			o.status = status;
			if let Some(url) = card_url {
				o.generated_card_url = Some(url);
			}
		})
		.await
	}

	/// Checks if a state transition is valid.
	fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderStateError> {
		let allowed = TRANSITIONS
			.get(&from)
			.is_some_and(|targets| targets.contains(&to));

		if allowed {
			Ok(())
		} else {
			Err(OrderStateError::InvalidTransition { from, to })
		}
	}
}
