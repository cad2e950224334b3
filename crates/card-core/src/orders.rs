//! Order lifecycle manager.
//!
//! Owns order creation, best-effort submission to the generation backend,
//! and status reconciliation on single-order reads. The intake path is
//! deliberately tolerant of backend failures: an order is always persisted
//! locally first, and a later read reconciles it once the backend is
//! reachable again.

use card_generator::{CardJobRequest, GeneratorService};
use card_storage::{StorageError, StorageService};
use card_types::{
	AuthenticatedUser, CreateOrderRequest, CreatedOrder, Order, OrderStatus, PaymentStatus,
	StorageKey,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{current_timestamp, CoreError, OrderStateError, OrderStateMachine};

/// Service implementing the order lifecycle.
pub struct OrderService {
	/// Storage service, shared with the state machine.
	storage: Arc<StorageService>,
	/// Client for the remote generation backend.
	generator: Arc<GeneratorService>,
	/// State machine all order mutations go through.
	state: OrderStateMachine,
}

impl OrderService {
	/// Creates a new OrderService over the given storage and backend client.
	pub fn new(storage: Arc<StorageService>, generator: Arc<GeneratorService>) -> Self {
		let state = OrderStateMachine::new(Arc::clone(&storage));
		Self {
			storage,
			generator,
			state,
		}
	}

	/// Creates an order for the calling user.
	///
	/// The order is persisted first with status `pending`, then submitted to
	/// the generation backend best-effort: an acknowledged submission moves
	/// it to `processing` with the backend's job id, while any submission
	/// failure is logged and swallowed. Intake never fails because the
	/// backend is unavailable; reconciliation on later reads is the
	/// recovery path.
	pub async fn create_order(
		&self,
		user: &AuthenticatedUser,
		request: CreateOrderRequest,
	) -> Result<CreatedOrder, CoreError> {
		if request.product_name.trim().is_empty()
			|| request.product_description.trim().is_empty()
			|| request.price == 0
		{
			return Err(CoreError::Validation(
				"product name, description and price are required".to_string(),
			));
		}

		if request.product_images.is_empty() {
			return Err(CoreError::Validation(
				"at least one product image is required".to_string(),
			));
		}

		let now = current_timestamp();
		let order = Order {
			id: Uuid::new_v4().to_string(),
			user_id: user.id.clone(),
			product_name: request.product_name,
			product_description: request.product_description,
			marketplace: request.marketplace,
			price: request.price,
			tariff: request.tariff,
			product_images: request.product_images,
			// The amount charged comes from the tariff table, never from
			// the declared product price
			total_amount: request.tariff.price(),
			status: OrderStatus::Pending,
			payment_status: PaymentStatus::Unpaid,
			backend_order_id: None,
			generated_card_url: None,
			created_at: now,
			updated_at: now,
		};

		self.state.store_order(&order).await?;
		self.append_to_owner_index(&user.id, &order.id).await?;

		let job = CardJobRequest {
			product_name: order.product_name.clone(),
			product_description: order.product_description.clone(),
			marketplace: order.marketplace,
			price: order.price,
			tariff: order.tariff,
			images: order.product_images.clone(),
		};

		match self.generator.submit_order(&job).await {
			Ok(backend_order_id) => {
				let updated = self.state.mark_submitted(&order.id, backend_order_id).await?;
				Ok(CreatedOrder {
					id: updated.id,
					status: updated.status,
					total_amount: updated.total_amount,
				})
			},
			Err(e) => {
				// The order stays pending; intake still succeeds
				tracing::warn!(order_id = %order.id, "Card generator submission failed: {}", e);
				Ok(CreatedOrder {
					id: order.id,
					status: order.status,
					total_amount: order.total_amount,
				})
			},
		}
	}

	/// Lists all orders owned by the calling user, most recent first.
	///
	/// No reconciliation happens here; it is read-path-specific to a single
	/// order to bound the volume of remote calls.
	pub async fn list_orders(&self, user: &AuthenticatedUser) -> Result<Vec<Order>, CoreError> {
		let ids = match self
			.storage
			.retrieve::<Vec<String>>(StorageKey::UserOrders.as_str(), &user.id)
			.await
		{
			Ok(ids) => ids,
			Err(StorageError::NotFound) => return Ok(Vec::new()),
			Err(e) => return Err(e.into()),
		};

		let mut orders = Vec::with_capacity(ids.len());
		for id in &ids {
			match self
				.storage
				.retrieve::<Order>(StorageKey::Orders.as_str(), id)
				.await
			{
				Ok(order) => orders.push(order),
				// A dangling index entry is skipped, not surfaced
				Err(StorageError::NotFound) => continue,
				Err(e) => return Err(e.into()),
			}
		}

		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(orders)
	}

	/// Gets one order by id, reconciling it against the generation backend.
	///
	/// An order belonging to a different owner is indistinguishable from a
	/// nonexistent one. Orders without a backend job id and orders in a
	/// terminal status are returned as stored, without a remote call. For
	/// the rest, the backend is queried: a failed query silently returns
	/// the stored record (staleness is preferred over unavailability),
	/// while a successful one is persisted only when it actually changes
	/// the status or newly provides a card URL.
	pub async fn get_order(
		&self,
		user: &AuthenticatedUser,
		order_id: &str,
	) -> Result<Order, CoreError> {
		let order = self.state.get_order(order_id).await.map_err(CoreError::from)?;
		if order.user_id != user.id {
			return Err(CoreError::NotFound);
		}

		let backend_order_id = match &order.backend_order_id {
			Some(id) if !order.status.is_terminal() => id.clone(),
			_ => return Ok(order),
		};

		let remote = match self.generator.fetch_status(&backend_order_id).await {
			Ok(remote) => remote,
			Err(e) => {
				tracing::warn!(order_id = %order.id, "Card generator status check failed: {}", e);
				return Ok(order);
			},
		};

		let url_newly_available =
			remote.card_url.is_some() && order.generated_card_url.is_none();

		if remote.status != order.status || url_newly_available {
			match self
				.state
				.apply_remote_status(&order.id, remote.status, remote.card_url)
				.await
			{
				Ok(updated) => Ok(updated),
				// A status the transition table rejects is an out-of-contract
				// response; absorb it like any other remote failure
				Err(OrderStateError::InvalidTransition { from, to }) => {
					tracing::warn!(
						order_id = %order.id,
						"Ignoring remote status regression from {:?} to {:?}",
						from,
						to
					);
					Ok(order)
				},
				Err(e) => Err(e.into()),
			}
		} else {
			// Nothing changed; avoid the redundant write
			Ok(order)
		}
	}

	/// Appends an order id to its owner's index entry.
	async fn append_to_owner_index(&self, user_id: &str, order_id: &str) -> Result<(), CoreError> {
		let mut index = match self
			.storage
			.retrieve::<Vec<String>>(StorageKey::UserOrders.as_str(), user_id)
			.await
		{
			Ok(ids) => ids,
			Err(StorageError::NotFound) => Vec::new(),
			Err(e) => return Err(e.into()),
		};

		index.push(order_id.to_string());
		self.storage
			.store(StorageKey::UserOrders.as_str(), user_id, &index)
			.await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use card_generator::{CardJobStatus, GeneratorError, GeneratorInterface};
	use card_storage::implementations::memory::MemoryStorage;
	use card_types::{ConfigSchema, Marketplace, Schema, Tariff, ValidationError};
	use std::sync::atomic::{AtomicUsize, Ordering};

	/// Generator stub with scripted responses and call counters.
	struct StubGenerator {
		submit_response: Option<String>,
		status_response: Option<CardJobStatus>,
		submit_calls: Arc<AtomicUsize>,
		status_calls: Arc<AtomicUsize>,
	}

	struct StubSchema;

	impl ConfigSchema for StubSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	#[async_trait]
	impl GeneratorInterface for StubGenerator {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(StubSchema)
		}

		async fn submit_order(&self, _request: &CardJobRequest) -> Result<String, GeneratorError> {
			self.submit_calls.fetch_add(1, Ordering::SeqCst);
			self.submit_response
				.clone()
				.ok_or_else(|| GeneratorError::Network("connection timed out".to_string()))
		}

		async fn fetch_status(
			&self,
			_backend_order_id: &str,
		) -> Result<CardJobStatus, GeneratorError> {
			self.status_calls.fetch_add(1, Ordering::SeqCst);
			self.status_response
				.clone()
				.ok_or_else(|| GeneratorError::Network("connection timed out".to_string()))
		}
	}

	struct Harness {
		service: OrderService,
		storage: Arc<StorageService>,
		submit_calls: Arc<AtomicUsize>,
		status_calls: Arc<AtomicUsize>,
	}

	fn harness(
		submit_response: Option<String>,
		status_response: Option<CardJobStatus>,
	) -> Harness {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let submit_calls = Arc::new(AtomicUsize::new(0));
		let status_calls = Arc::new(AtomicUsize::new(0));

		let stub = StubGenerator {
			submit_response,
			status_response,
			submit_calls: Arc::clone(&submit_calls),
			status_calls: Arc::clone(&status_calls),
		};
		let generator = Arc::new(GeneratorService::new(Box::new(stub)));

		Harness {
			service: OrderService::new(Arc::clone(&storage), generator),
			storage,
			submit_calls,
			status_calls,
		}
	}

	fn owner() -> AuthenticatedUser {
		AuthenticatedUser {
			id: "u1".to_string(),
			email: "anna@example.com".to_string(),
		}
	}

	fn request(tariff: Tariff, images: &[&str]) -> CreateOrderRequest {
		CreateOrderRequest {
			product_name: "Thermo mug".to_string(),
			product_description: "Steel, 450 ml".to_string(),
			marketplace: Marketplace::Wb,
			price: 1290,
			tariff,
			product_images: images.iter().map(|s| s.to_string()).collect(),
		}
	}

	async fn stored_order(storage: &StorageService, id: &str) -> Order {
		storage
			.retrieve(StorageKey::Orders.as_str(), id)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn accepted_submission_moves_order_to_processing() {
		let h = harness(Some("B1".to_string()), None);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();

		assert_eq!(created.status, OrderStatus::Processing);
		assert_eq!(created.total_amount, 299);

		let persisted = stored_order(&h.storage, &created.id).await;
		assert_eq!(persisted.status, OrderStatus::Processing);
		assert_eq!(persisted.backend_order_id.as_deref(), Some("B1"));
		assert_eq!(h.submit_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn failed_submission_still_creates_pending_order() {
		let h = harness(None, None);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Pro, &["img1", "img2"]))
			.await
			.unwrap();

		assert_eq!(created.status, OrderStatus::Pending);
		assert_eq!(created.total_amount, 599);

		let persisted = stored_order(&h.storage, &created.id).await;
		assert_eq!(persisted.status, OrderStatus::Pending);
		assert!(persisted.backend_order_id.is_none());
	}

	#[tokio::test]
	async fn total_amount_comes_from_tariff_not_declared_price() {
		let h = harness(Some("B1".to_string()), None);

		let mut req = request(Tariff::Start, &["img1"]);
		req.price = 999_999;
		let created = h.service.create_order(&owner(), req).await.unwrap();

		assert_eq!(created.total_amount, 299);
		assert_eq!(stored_order(&h.storage, &created.id).await.price, 999_999);
	}

	#[tokio::test]
	async fn zero_images_fails_validation_and_persists_nothing() {
		let h = harness(Some("B1".to_string()), None);

		let result = h
			.service
			.create_order(&owner(), request(Tariff::Start, &[]))
			.await;
		assert!(matches!(result, Err(CoreError::Validation(_))));

		assert!(h.service.list_orders(&owner()).await.unwrap().is_empty());
		assert_eq!(h.submit_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn missing_required_fields_fail_validation() {
		let h = harness(Some("B1".to_string()), None);

		let mut req = request(Tariff::Start, &["img1"]);
		req.product_name = "  ".to_string();
		let result = h.service.create_order(&owner(), req).await;
		assert!(matches!(result, Err(CoreError::Validation(_))));
	}

	#[tokio::test]
	async fn get_reconciles_completed_status_and_card_url() {
		let h = harness(
			Some("B1".to_string()),
			Some(CardJobStatus {
				status: OrderStatus::Completed,
				card_url: Some("https://cdn/card.png".to_string()),
			}),
		);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();

		let fetched = h.service.get_order(&owner(), &created.id).await.unwrap();
		assert_eq!(fetched.status, OrderStatus::Completed);
		assert_eq!(fetched.generated_card_url.as_deref(), Some("https://cdn/card.png"));

		// The reconciled state is persisted, not just returned
		let persisted = stored_order(&h.storage, &created.id).await;
		assert_eq!(persisted.status, OrderStatus::Completed);
		assert_eq!(
			persisted.generated_card_url.as_deref(),
			Some("https://cdn/card.png")
		);
	}

	#[tokio::test]
	async fn completed_order_is_never_queried_again() {
		let h = harness(
			Some("B1".to_string()),
			Some(CardJobStatus {
				status: OrderStatus::Completed,
				card_url: Some("https://cdn/card.png".to_string()),
			}),
		);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();

		h.service.get_order(&owner(), &created.id).await.unwrap();
		assert_eq!(h.status_calls.load(Ordering::SeqCst), 1);

		// Terminal: the second read must not reach the backend
		let again = h.service.get_order(&owner(), &created.id).await.unwrap();
		assert_eq!(again.status, OrderStatus::Completed);
		assert_eq!(h.status_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn unsubmitted_order_is_returned_without_remote_call() {
		let h = harness(None, None);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();

		let fetched = h.service.get_order(&owner(), &created.id).await.unwrap();
		assert_eq!(fetched.status, OrderStatus::Pending);
		assert_eq!(h.status_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn failed_status_query_returns_stored_record() {
		// Submission succeeds, later status queries fail
		let h = harness(Some("B1".to_string()), None);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();

		let fetched = h.service.get_order(&owner(), &created.id).await.unwrap();
		assert_eq!(fetched.status, OrderStatus::Processing);
		assert_eq!(h.status_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn remote_status_regression_returns_stored_record() {
		// The backend acknowledged the job, then reports pending again; the
		// transition table rejects the regression and the read degrades to
		// the stored record instead of failing
		let h = harness(
			Some("B1".to_string()),
			Some(CardJobStatus {
				status: OrderStatus::Pending,
				card_url: None,
			}),
		);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();
		assert_eq!(created.status, OrderStatus::Processing);

		let fetched = h.service.get_order(&owner(), &created.id).await.unwrap();
		assert_eq!(fetched.status, OrderStatus::Processing);

		let persisted = stored_order(&h.storage, &created.id).await;
		assert_eq!(persisted.status, OrderStatus::Processing);
	}

	#[tokio::test]
	async fn unchanged_remote_state_skips_the_write() {
		let h = harness(
			Some("B1".to_string()),
			Some(CardJobStatus {
				status: OrderStatus::Processing,
				card_url: None,
			}),
		);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();
		let before = stored_order(&h.storage, &created.id).await;

		let fetched = h.service.get_order(&owner(), &created.id).await.unwrap();
		assert_eq!(fetched.status, OrderStatus::Processing);

		let after = stored_order(&h.storage, &created.id).await;
		assert_eq!(after.updated_at, before.updated_at);
	}

	#[tokio::test]
	async fn foreign_order_is_indistinguishable_from_missing() {
		let h = harness(Some("B1".to_string()), None);

		let created = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();

		let stranger = AuthenticatedUser {
			id: "u2".to_string(),
			email: "boris@example.com".to_string(),
		};

		let foreign = h.service.get_order(&stranger, &created.id).await;
		let missing = h.service.get_order(&stranger, "no-such-order").await;
		assert!(matches!(foreign, Err(CoreError::NotFound)));
		assert!(matches!(missing, Err(CoreError::NotFound)));
	}

	#[tokio::test]
	async fn list_orders_is_most_recent_first_and_owner_scoped() {
		let h = harness(None, None);

		let first = h
			.service
			.create_order(&owner(), request(Tariff::Start, &["img1"]))
			.await
			.unwrap();
		let second = h
			.service
			.create_order(&owner(), request(Tariff::Pro, &["img2"]))
			.await
			.unwrap();

		// Force distinct creation times to make the ordering observable
		h.service
			.state
			.update_order_with(&second.id, |o| o.created_at += 10)
			.await
			.unwrap();

		let orders = h.service.list_orders(&owner()).await.unwrap();
		assert_eq!(orders.len(), 2);
		assert_eq!(orders[0].id, second.id);
		assert_eq!(orders[1].id, first.id);

		let stranger = AuthenticatedUser {
			id: "u2".to_string(),
			email: "boris@example.com".to_string(),
		};
		assert!(h.service.list_orders(&stranger).await.unwrap().is_empty());
		assert_eq!(h.status_calls.load(Ordering::SeqCst), 0);
	}
}
