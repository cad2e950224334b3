//! HTTP server for the CardCraft API.
//!
//! Exposes the public surface of the backend: account signup and login,
//! profile updates, the contact form, and the order endpoints. The caller's
//! identity is resolved exactly once per request by the [`CurrentUser`]
//! extractor; handlers stay thin and delegate to the core services.

use axum::{
	extract::{FromRequestParts, Path, State},
	http::{header, request::Parts, HeaderMap, StatusCode},
	response::Json,
	routing::{get, patch, post},
	Router,
};
use card_auth::AuthService;
use card_config::ApiConfig;
use card_core::{ContactService, OrderService, UserService};
use card_storage::StorageService;
use card_types::{
	ApiError, AuthenticatedUser, ContactReceipt, ContactRequest, CreateOrderRequest, CreatedOrder,
	LoginRequest, Order, SessionResponse, SignupRequest, UpdateProfileRequest, UserProfile,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Storage service, shared with the background cleanup task.
	pub storage: Arc<StorageService>,
	/// Session management.
	pub auth: Arc<AuthService>,
	/// Account management.
	pub users: Arc<UserService>,
	/// Order lifecycle.
	pub orders: Arc<OrderService>,
	/// Contact intake.
	pub contact: Arc<ContactService>,
}

/// Identity of the authenticated caller, resolved from the bearer token.
///
/// A missing, unknown or expired token rejects the request with 401 before
/// the handler runs.
pub struct CurrentUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for CurrentUser {
	type Rejection = ApiError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;
		let user = state.auth.resolve(token).await.map_err(ApiError::from)?;
		Ok(CurrentUser(user))
	}
}

/// Extracts the bearer token from the Authorization header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(header::AUTHORIZATION)?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/signup", post(handle_signup))
				.route("/login", post(handle_login))
				.route("/logout", post(handle_logout))
				.route("/user", patch(handle_update_profile))
				.route("/contact", post(handle_contact))
				.route("/orders", post(handle_create_order).get(handle_list_orders))
				.route("/orders/{id}", get(handle_get_order)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: &ApiConfig,
	state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("CardCraft API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/signup requests.
async fn handle_signup(
	State(state): State<AppState>,
	Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
	let profile = state.users.signup(request).await?;
	Ok((StatusCode::CREATED, Json(profile)))
}

/// Handles POST /api/login requests.
async fn handle_login(
	State(state): State<AppState>,
	Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
	let token = state.auth.login(&request.email, &request.password).await?;
	Ok(Json(SessionResponse { token }))
}

/// Handles POST /api/logout requests.
///
/// Revoking an already-dead session succeeds; only a request without any
/// token at all is rejected.
async fn handle_logout(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
	let token = bearer_token(&headers).ok_or(ApiError::Unauthenticated)?;
	state.auth.revoke(token).await?;
	Ok(StatusCode::NO_CONTENT)
}

/// Handles PATCH /api/user requests.
async fn handle_update_profile(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
	let profile = state.users.update_profile(&user.id, request).await?;
	Ok(Json(profile))
}

/// Handles POST /api/contact requests.
async fn handle_contact(
	State(state): State<AppState>,
	Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactReceipt>), ApiError> {
	let receipt = state.contact.submit(request).await?;
	Ok((StatusCode::CREATED, Json(receipt)))
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreatedOrder>), ApiError> {
	let created = state.orders.create_order(&user, request).await?;
	Ok((StatusCode::CREATED, Json(created)))
}

/// Handles GET /api/orders requests.
async fn handle_list_orders(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Order>>, ApiError> {
	let orders = state.orders.list_orders(&user).await?;
	Ok(Json(orders))
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
	let order = state.orders.get_order(&user, &id).await?;
	Ok(Json(order))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::Body;
	use axum::http::Request;
	use tower::ServiceExt;

	fn test_app() -> Router {
		let config: card_config::Config = r#"
[service]
id = "cardcraft-test"

[storage]
primary = "memory"

[storage.implementations.memory]

[generator]
primary = "http"

[generator.implementations.http]
api_url = "http://localhost:9"

[api]
port = 8080
"#
		.parse()
		.unwrap();

		router(crate::build_state(&config).unwrap())
	}

	fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
		Request::builder()
			.method(method)
			.uri(uri)
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	#[tokio::test]
	async fn order_endpoints_require_a_session() {
		let app = test_app();

		let response = app
			.oneshot(
				Request::builder()
					.method("GET")
					.uri("/api/orders")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn contact_form_is_open_to_anonymous_visitors() {
		let app = test_app();

		let response = app
			.oneshot(json_request(
				"POST",
				"/api/contact",
				serde_json::json!({
					"name": "Anna",
					"email": "anna@example.com",
					"message": "How long does generation take?"
				}),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::CREATED);
	}

	#[tokio::test]
	async fn login_with_unknown_account_is_unauthorized() {
		let app = test_app();

		let response = app
			.oneshot(json_request(
				"POST",
				"/api/login",
				serde_json::json!({
					"email": "ghost@example.com",
					"password": "secret123"
				}),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn signup_then_login_round_trip() {
		let app = test_app();

		let response = app
			.clone()
			.oneshot(json_request(
				"POST",
				"/api/signup",
				serde_json::json!({
					"firstName": "Anna",
					"lastName": "Petrova",
					"email": "Anna@Example.com",
					"password": "secret123"
				}),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::CREATED);

		// Logging in with the exact string typed at signup must work even
		// though the account is stored under the normalized email
		let response = app
			.oneshot(json_request(
				"POST",
				"/api/login",
				serde_json::json!({
					"email": "Anna@Example.com",
					"password": "secret123"
				}),
			))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
	}

	#[tokio::test]
	async fn unknown_marketplace_is_rejected_at_the_boundary() {
		let app = test_app();

		app.clone()
			.oneshot(json_request(
				"POST",
				"/api/signup",
				serde_json::json!({
					"firstName": "Anna",
					"lastName": "Petrova",
					"email": "anna@example.com",
					"password": "secret123"
				}),
			))
			.await
			.unwrap();

		let login = app
			.clone()
			.oneshot(json_request(
				"POST",
				"/api/login",
				serde_json::json!({
					"email": "anna@example.com",
					"password": "secret123"
				}),
			))
			.await
			.unwrap();
		let bytes = axum::body::to_bytes(login.into_body(), usize::MAX).await.unwrap();
		let session: SessionResponse = serde_json::from_slice(&bytes).unwrap();

		let response = app
			.oneshot(
				Request::builder()
					.method("POST")
					.uri("/api/orders")
					.header(header::CONTENT_TYPE, "application/json")
					.header(
						header::AUTHORIZATION,
						format!("Bearer {}", session.token),
					)
					.body(Body::from(
						serde_json::json!({
							"productName": "Mug",
							"productDescription": "Steel",
							"marketplace": "etsy",
							"price": 100,
							"tariff": "start",
							"productImages": ["img1"]
						})
						.to_string(),
					))
					.unwrap(),
			)
			.await
			.unwrap();
		assert!(response.status().is_client_error());
	}
}
