//! Request dispatch: token attachment, response classification, and the single 401 retry.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, expires_within},
	error::ApiError,
	gateway::Gateway,
	http::{self, ApiHttpClient, ApiRequest, ApiResponse, AuthMode, OutboundRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Per-call state threaded through dispatch; replaces any mutable flag on the request itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	/// Zero for the first send, one for the resend after a refresh.
	pub attempt: u8,
}
impl RequestContext {
	/// Highest attempt number that may still trigger a refresh-and-resend.
	pub const MAX_RETRIES: u8 = 1;

	/// Context for the first send.
	pub const fn initial() -> Self {
		Self { attempt: 0 }
	}

	/// Context for the next attempt.
	pub const fn next(self) -> Self {
		Self { attempt: self.attempt.saturating_add(1) }
	}

	/// Returns `true` while a 401 may still be answered with a refresh and resend.
	pub const fn may_retry(self) -> bool {
		self.attempt < Self::MAX_RETRIES
	}
}

impl<C> Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Renders `request` with a valid bearer token attached.
	///
	/// Anonymous requests and requests made without a stored token are rendered
	/// unauthenticated. A token expiring within the refresh window is refreshed first; if that
	/// fails the error is returned and nothing is sent.
	pub async fn attach_auth(&self, request: &ApiRequest) -> Result<OutboundRequest> {
		let token = self.current_token(request).await?;

		Ok(request.render(&self.config.base_url, token.as_ref())?)
	}

	/// Sends `request`, refreshing and resending once on 401.
	///
	/// HTTP 429 yields [`Error::RateLimited`] without any retry; other non-2xx statuses yield
	/// [`Error::Api`].
	pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "send");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.current_token(request).await?;
				let response = self.execute(request, token.as_ref()).await?;

				self.handle_response(RequestContext::initial(), request, token.as_ref(), response)
					.await
			})
			.await;

		obs::record_call_outcome(KIND, outcome_of(&result));

		result
	}

	/// Sends `request` and decodes a JSON body.
	pub async fn send_json<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		Ok(self.send(request).await?.json()?)
	}

	/// Classifies `response` to a request sent with `sent_token` in `context`.
	///
	/// A 401 on an authenticated first attempt refreshes (collapsing with concurrent refreshes
	/// of the same token) and resends the identical request once.
	pub async fn handle_response(
		&self,
		context: RequestContext,
		request: &ApiRequest,
		sent_token: Option<&TokenSecret>,
		response: ApiResponse,
	) -> Result<ApiResponse> {
		if response.status == 401 && context.may_retry() && request.auth == AuthMode::Bearer {
			const KIND: CallKind = CallKind::Retry;

			let token = self.refresh_after(sent_token).await?;
			let span = CallSpan::new(KIND, "handle_response");

			obs::record_call_outcome(KIND, CallOutcome::Attempt);

			let result = span
				.instrument(async {
					let retried = self.execute(request, Some(&token)).await?;

					classify(request, retried)
				})
				.await;

			obs::record_call_outcome(KIND, outcome_of(&result));

			return result;
		}

		classify(request, response)
	}

	pub(crate) async fn execute(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
	) -> Result<ApiResponse> {
		let outbound = request.render(&self.config.base_url, token)?;

		self.http_client
			.execute(outbound)
			.await
			.map_err(|err| Error::from(http::map_transport_error(err)))
	}

	async fn current_token(&self, request: &ApiRequest) -> Result<Option<TokenSecret>> {
		if request.auth == AuthMode::Anonymous {
			return Ok(None);
		}

		let Some(token) = self.store.load().await?.access_token else {
			return Ok(None);
		};

		if expires_within(token.expose(), self.config.refresh_window, OffsetDateTime::now_utc()) {
			return self.refresh_after(Some(&token)).await.map(Some);
		}

		Ok(Some(token))
	}
}

fn classify(request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse> {
	if response.is_success() {
		return Ok(response);
	}
	if response.status == 429 {
		let retry_after = response.metadata().retry_after;

		obs::warn_rate_limited(&request.path(), retry_after);

		return Err(Error::RateLimited { retry_after });
	}

	Err(ApiError::from_parts(response.status, &response.body).into())
}

fn outcome_of<T>(result: &Result<T>) -> CallOutcome {
	match result {
		Ok(_) => CallOutcome::Success,
		Err(err) if err.is_rate_limited() => CallOutcome::RateLimited,
		Err(_) => CallOutcome::Failure,
	}
}


#[cfg(all(test, feature = "reqwest"))]
mod http_tests {
	// crates.io
	use httpmock::prelude::*;
	use serde_json::json;
	// self
	use crate::{_preludet::*, auth::Session, error::ApiError, http::ApiRequest};

	fn view() -> ApiRequest {
		ApiRequest::get(["appointments", "view"])
	}

	#[tokio::test]
	async fn fresh_token_is_attached_without_refresh() {
		let server = MockServer::start_async().await;
		let access = jwt_expiring_in(Duration::hours(1));
		let (gateway, _, _) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&access, "r1"));
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(500);
			})
			.await;
		let list = server
			.mock_async(|when, then| {
				when.method(GET)
					.path("/api/appointments/view/")
					.header("authorization", format!("Bearer {access}"));
				then.status(200).json_body(json!([]));
			})
			.await;
		let response = gateway.send(&view()).await.expect("Authenticated call should succeed.");

		assert_eq!(response.status, 200);
		list.assert_calls_async(1).await;
		refresh.assert_calls_async(0).await;
	}

	#[tokio::test]
	async fn missing_token_sends_request_unauthenticated() {
		let server = MockServer::start_async().await;
		let (gateway, _, _) =
			build_reqwest_test_gateway(&server.url("/api/"), Session::default());
		let list = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/appointments/view/").header_missing("authorization");
				then.status(200).json_body(json!([]));
			})
			.await;
		let outbound = gateway.attach_auth(&view()).await.expect("Rendering should succeed.");

		assert!(!outbound.is_authenticated());
		gateway.send(&view()).await.expect("Unauthenticated call should be forwarded.");
		list.assert_calls_async(1).await;
	}

	#[tokio::test]
	async fn expiring_token_is_refreshed_before_sending() {
		let server = MockServer::start_async().await;
		let stale = jwt_expiring_in(Duration::seconds(10));
		let fresh = jwt_expiring_in(Duration::hours(1));
		let (gateway, store, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&stale, "r1"));
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/").json_body(json!({ "refresh": "r1" }));
				then.status(200).json_body(json!({ "access": fresh, "refresh": "r2" }));
			})
			.await;
		let list = server
			.mock_async(|when, then| {
				when.method(GET)
					.path("/api/appointments/view/")
					.header("authorization", format!("Bearer {fresh}"));
				then.status(200).json_body(json!([]));
			})
			.await;

		gateway.send(&view()).await.expect("Refreshed call should succeed.");

		refresh.assert_calls_async(1).await;
		list.assert_calls_async(1).await;
		assert_eq!(stored_access(&store).as_deref(), Some(fresh.as_str()));
		assert_eq!(stored_refresh(&store).as_deref(), Some("r2"));
		assert_eq!(observer.expirations(), 0);
	}

	#[tokio::test]
	async fn unauthorized_response_refreshes_and_retries_once() {
		let server = MockServer::start_async().await;
		let revoked = jwt_expiring_in(Duration::hours(1));
		let fresh = jwt_expiring_in(Duration::hours(2));
		let (gateway, store, _) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&revoked, "r1"));
		let rejected = server
			.mock_async(|when, then| {
				when.method(GET)
					.path("/api/appointments/view/")
					.header("authorization", format!("Bearer {revoked}"));
				then.status(401).json_body(json!({ "detail": "Token is invalid or expired" }));
			})
			.await;
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(200).json_body(json!({ "access": fresh, "refresh": "r2" }));
			})
			.await;
		let accepted = server
			.mock_async(|when, then| {
				when.method(GET)
					.path("/api/appointments/view/")
					.header("authorization", format!("Bearer {fresh}"));
				then.status(200).json_body(json!([]));
			})
			.await;
		let response = gateway.send(&view()).await.expect("Retried call should succeed.");

		assert_eq!(response.status, 200);
		rejected.assert_calls_async(1).await;
		refresh.assert_calls_async(1).await;
		accepted.assert_calls_async(1).await;
		assert_eq!(stored_refresh(&store).as_deref(), Some("r2"));
		assert_eq!(gateway.refresh_metrics.successes(), 1);
	}

	#[tokio::test]
	async fn second_unauthorized_response_is_surfaced() {
		let server = MockServer::start_async().await;
		let access = jwt_expiring_in(Duration::hours(1));
		let fresh = jwt_expiring_in(Duration::hours(2));
		let (gateway, _, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&access, "r1"));
		let list = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/appointments/view/");
				then.status(401).json_body(json!({ "detail": "Nope" }));
			})
			.await;
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(200).json_body(json!({ "access": fresh, "refresh": "r2" }));
			})
			.await;
		let err = gateway.send(&view()).await.expect_err("Second 401 must not be retried.");

		assert!(matches!(err, Error::Api(ApiError { status: 401, .. })));
		list.assert_calls_async(2).await;
		refresh.assert_calls_async(1).await;
		assert_eq!(observer.expirations(), 0);
	}

	#[tokio::test]
	async fn rate_limit_is_signalled_without_retry() {
		let server = MockServer::start_async().await;
		let access = jwt_expiring_in(Duration::hours(1));
		let (gateway, _, _) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&access, "r1"));
		let list = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/appointments/view/");
				then.status(429).header("retry-after", "7");
			})
			.await;
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(200);
			})
			.await;
		let err = gateway.send(&view()).await.expect_err("429 must be surfaced.");

		assert!(matches!(err, Error::RateLimited { retry_after: Some(d) } if d == Duration::seconds(7)));
		list.assert_calls_async(1).await;
		refresh.assert_calls_async(0).await;
	}

	#[tokio::test]
	async fn anonymous_unauthorized_is_not_retried() {
		let server = MockServer::start_async().await;
		let access = jwt_expiring_in(Duration::hours(1));
		let (gateway, store, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&access, "r1"));
		let login = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/login/").header_missing("authorization");
				then.status(401).json_body(json!({ "detail": "No active account" }));
			})
			.await;
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(200);
			})
			.await;
		let err = gateway
			.send(&ApiRequest::post(["login"]).anonymous())
			.await
			.expect_err("Rejected credentials must surface.");

		assert_eq!(err.status(), Some(401));
		login.assert_calls_async(1).await;
		refresh.assert_calls_async(0).await;
		assert_eq!(stored_refresh(&store).as_deref(), Some("r1"));
		assert_eq!(observer.expirations(), 0);
	}

	#[tokio::test]
	async fn other_failures_pass_through_with_body() {
		let server = MockServer::start_async().await;
		let access = jwt_expiring_in(Duration::hours(1));
		let (gateway, _, _) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&access, "r1"));

		server
			.mock_async(|when, then| {
				when.method(GET).path("/api/appointments/view/");
				then.status(400).json_body(json!({ "date": ["Invalid date."] }));
			})
			.await;

		let err = gateway.send(&view()).await.expect_err("400 must be surfaced.");
		let api = match err {
			Error::Api(api) => api,
			other => panic!("Expected an API error, got {other:?}."),
		};

		assert_eq!(api.status, 400);
		assert_eq!(api.body.to_string(), "Date: Invalid date.");
	}
}
