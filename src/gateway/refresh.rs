//! Refresh-token rotation behind a single in-flight guard.
//!
//! Concurrent callers that saw the same expiring token queue on one async mutex. The first one
//! performs `POST token/refresh/` and rotates the stored pair with a compare-and-swap; the others
//! re-read the store after acquiring the guard and reuse the rotated access token. A failed
//! refresh clears the session, notifies the observer once, and surfaces
//! [`Error::SessionExpired`].

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Session, TokenResponse, TokenSecret, expires_within},
	error::ApiError,
	gateway::Gateway,
	http::{ApiHttpClient, ApiRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CompareAndSwapOutcome,
};

#[derive(Serialize)]
struct RefreshBody<'a> {
	refresh: &'a str,
}

impl<C> Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Exchanges the stored refresh token for a new pair and returns the new access token.
	///
	/// Always contacts the backend. On failure the session is wiped, the observer is notified,
	/// and the cause is returned inside [`Error::SessionExpired`].
	pub async fn refresh(&self) -> Result<TokenSecret> {
		self.refresh_after(None).await
	}

	/// Refreshes on behalf of a caller that observed `stale`.
	///
	/// With `Some(stale)`, a fresh token rotated in by a concurrent caller is reused instead of
	/// calling the backend again, and a session already wiped by a concurrent failure yields
	/// [`Error::SessionExpired`] without a second observer signal.
	pub(crate) async fn refresh_after(&self, stale: Option<&TokenSecret>) -> Result<TokenSecret> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "refresh");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _singleflight = self.refresh_guard.lock().await;
				let session = self.store.load().await.inspect_err(|_| {
					self.refresh_metrics.record_failure();
				})?;

				if let Some(stale) = stale {
					match &session.access_token {
						Some(current)
							if current != stale
								&& !expires_within(
									current.expose(),
									self.config.refresh_window,
									OffsetDateTime::now_utc(),
								) =>
						{
							self.refresh_metrics.record_reuse();

							return Ok(current.clone());
						},
						None if session.refresh_token.is_none() => {
							self.refresh_metrics.record_failure();

							return Err(Error::session_expired(Error::Unauthenticated));
						},
						_ => {},
					}
				}

				match self.rotate_session(&session).await {
					Ok(token) => {
						self.refresh_metrics.record_success();

						Ok(token)
					},
					Err(err) => {
						self.refresh_metrics.record_failure();

						Err(self.terminate_session(err).await)
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn rotate_session(&self, session: &Session) -> Result<TokenSecret> {
		let refresh = session.refresh_token.as_ref().ok_or(Error::Unauthenticated)?;
		let request = ApiRequest::post(["token", "refresh"])
			.anonymous()
			.json(&RefreshBody { refresh: refresh.expose() })?;
		let response = self.execute(&request, None).await?;

		if !response.is_success() {
			return Err(ApiError::from_parts(response.status, &response.body).into());
		}

		let pair = response
			.json::<TokenResponse>()?
			.into_pair(Some(refresh))
			.ok_or(Error::Unauthenticated)?;
		let access = pair.access_token.clone();

		match self.store.rotate(refresh.expose(), pair).await? {
			CompareAndSwapOutcome::Updated => Ok(access),
			CompareAndSwapOutcome::RefreshMismatch =>
				self.store.load().await?.access_token.ok_or(Error::Unauthenticated),
			CompareAndSwapOutcome::Missing => Err(Error::Unauthenticated),
		}
	}

	async fn terminate_session(&self, cause: Error) -> Error {
		// A failing clear must not suppress the logout signal.
		let _ = self.store.clear().await;

		obs::warn_session_terminated(&self.config.login_entry, &cause);
		self.observer.session_expired(&self.config.login_entry);

		Error::session_expired(cause)
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	use serde_json::json;
	// self
	use crate::{_preludet::*, auth::Session, http::ApiRequest};

	#[tokio::test]
	async fn failed_refresh_wipes_session_and_signals_once() {
		let server = MockServer::start_async().await;
		let stale = jwt_expiring_in(Duration::seconds(5));
		let (gateway, store, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&stale, "r1"));
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(401).json_body(json!({ "detail": "Token is blacklisted" }));
			})
			.await;
		let list = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/appointments/view/");
				then.status(200).json_body(json!([]));
			})
			.await;
		let err = gateway
			.send(&ApiRequest::get(["appointments", "view"]))
			.await
			.expect_err("Stale token must not be sent after a failed refresh.");

		assert!(err.is_session_expired());
		assert_eq!(err.status(), Some(401));
		refresh.assert_calls_async(1).await;
		list.assert_calls_async(0).await;
		assert!(store.snapshot().is_empty());
		assert_eq!(observer.entries(), ["/login"]);
		assert_eq!(gateway.refresh_metrics.failures(), 1);
	}

	#[tokio::test]
	async fn unreachable_backend_ends_session() {
		let stale = jwt_expiring_in(Duration::seconds(5));
		let (gateway, store, observer) =
			build_reqwest_test_gateway("http://127.0.0.1:1/api/", session_with(&stale, "r1"));
		let err = gateway.refresh().await.expect_err("Refresh against a closed port must fail.");

		match err {
			Error::SessionExpired { source } => assert!(matches!(*source, Error::Transport(_))),
			other => panic!("Expected a session expiry, got {other:?}."),
		}
		assert!(store.snapshot().is_empty());
		assert_eq!(observer.expirations(), 1);
	}

	#[tokio::test]
	async fn refresh_without_stored_token_is_unauthenticated() {
		let server = MockServer::start_async().await;
		let (gateway, _, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), Session::default());
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(200);
			})
			.await;
		let err = gateway.refresh().await.expect_err("Refresh without a token must fail.");

		match err {
			Error::SessionExpired { source } => assert!(matches!(*source, Error::Unauthenticated)),
			other => panic!("Expected a session expiry, got {other:?}."),
		}
		refresh.assert_calls_async(0).await;
		assert_eq!(observer.expirations(), 1);
	}

	#[tokio::test]
	async fn omitted_refresh_token_keeps_previous_one() {
		let server = MockServer::start_async().await;
		let stale = jwt_expiring_in(Duration::seconds(5));
		let fresh = jwt_expiring_in(Duration::hours(1));
		let (gateway, store, _) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&stale, "r1"));

		server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(200).json_body(json!({ "access": fresh }));
			})
			.await;

		let token = gateway.refresh().await.expect("Refresh should succeed.");

		assert_eq!(token.expose(), fresh);
		assert_eq!(stored_refresh(&store).as_deref(), Some("r1"));
		assert_eq!(store.snapshot().username.as_deref(), Some("alice"));
	}

	#[tokio::test]
	async fn sequential_refreshes_send_the_rotated_token() {
		let server = MockServer::start_async().await;
		let stale = jwt_expiring_in(Duration::seconds(5));
		let second = jwt_expiring_in(Duration::hours(1));
		let third = jwt_expiring_in(Duration::hours(2));
		let (gateway, store, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&stale, "r1"));
		let first_rotation = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/").json_body(json!({ "refresh": "r1" }));
				then.status(200).json_body(json!({ "access": second, "refresh": "r2" }));
			})
			.await;
		let second_rotation = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/").json_body(json!({ "refresh": "r2" }));
				then.status(200).json_body(json!({ "access": third, "refresh": "r3" }));
			})
			.await;

		assert_eq!(gateway.refresh().await.expect("First refresh should succeed.").expose(), second);
		assert_eq!(gateway.refresh().await.expect("Second refresh should succeed.").expose(), third);

		first_rotation.assert_calls_async(1).await;
		second_rotation.assert_calls_async(1).await;
		assert_eq!(stored_access(&store).as_deref(), Some(third.as_str()));
		assert_eq!(stored_refresh(&store).as_deref(), Some("r3"));
		assert_eq!(observer.expirations(), 0);
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_refresh() {
		let server = MockServer::start_async().await;
		let stale = jwt_expiring_in(Duration::seconds(5));
		let fresh = jwt_expiring_in(Duration::hours(1));
		let (gateway, store, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&stale, "r1"));
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/").json_body(json!({ "refresh": "r1" }));
				then.status(200)
					.delay(std::time::Duration::from_millis(100))
					.json_body(json!({ "access": fresh, "refresh": "r2" }));
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
		let tasks: Vec<_> = (0..5)
			.map(|_| {
				let gateway = gateway.clone();

				tokio::spawn(async move {
					gateway.send(&ApiRequest::get(["appointments", "view"])).await.map(|r| r.status)
				})
			})
			.collect();

		for task in tasks {
			let status = task
				.await
				.expect("Task should not panic.")
				.expect("Every caller should get the rotated token.");

			assert_eq!(status, 200);
		}

		refresh.assert_calls_async(1).await;
		list.assert_calls_async(5).await;
		assert_eq!(stored_refresh(&store).as_deref(), Some("r2"));
		assert_eq!(observer.expirations(), 0);
		assert_eq!(gateway.refresh_metrics.reused() + 1, gateway.refresh_metrics.attempts());
		assert_eq!(gateway.refresh_metrics.failures(), 0);
	}

	#[tokio::test]
	async fn waiters_after_failed_refresh_do_not_signal_again() {
		let server = MockServer::start_async().await;
		let stale = jwt_expiring_in(Duration::seconds(5));
		let (gateway, store, observer) =
			build_reqwest_test_gateway(&server.url("/api/"), session_with(&stale, "r1"));
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/token/refresh/");
				then.status(401).delay(std::time::Duration::from_millis(100));
			})
			.await;
		let tasks: Vec<_> = (0..3)
			.map(|_| {
				let gateway = gateway.clone();

				tokio::spawn(async move {
					gateway.send(&ApiRequest::get(["appointments", "view"])).await
				})
			})
			.collect();

		for task in tasks {
			let err = task
				.await
				.expect("Task should not panic.")
				.expect_err("Every caller should see the session end.");

			assert!(err.is_session_expired());
		}

		refresh.assert_calls_async(1).await;
		assert!(store.snapshot().is_empty());
		assert_eq!(observer.expirations(), 1);
	}
}
