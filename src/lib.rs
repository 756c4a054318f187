//! Authenticated request gateway for the hospital appointment-booking API: bearer attachment,
//! rotating refresh tokens, a single 401 retry, rate-limit signalling, and a typed client for
//! the booking, profile, and payment endpoints.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		auth::{CredentialPair, Session, TokenSecret},
		config::GatewayConfig,
		gateway::{Gateway, SessionObserver},
		http::ReqwestHttpClient,
		store::{MemoryStore, SessionStore},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestHttpClient>;

	/// Observer that counts session terminations and remembers the last login entry point.
	#[derive(Debug, Default)]
	pub struct RecordingObserver {
		calls: Mutex<Vec<String>>,
	}
	impl RecordingObserver {
		/// Number of times the session was reported as expired.
		pub fn expirations(&self) -> usize {
			self.calls.lock().len()
		}

		/// Login entry points received so far.
		pub fn entries(&self) -> Vec<String> {
			self.calls.lock().clone()
		}
	}
	impl SessionObserver for RecordingObserver {
		fn session_expired(&self, login_entry: &str) {
			self.calls.lock().push(login_entry.to_owned());
		}
	}

	/// Encodes an unsigned JWT whose payload expires `expires_in` from now.
	pub fn jwt_expiring_in(expires_in: Duration) -> String {
		let exp = (OffsetDateTime::now_utc() + expires_in).unix_timestamp();

		jwt_with_payload(&format!("{{\"token_type\":\"access\",\"exp\":{exp},\"user_id\":7}}"))
	}

	/// Encodes an unsigned JWT around a raw JSON payload.
	pub fn jwt_with_payload(payload: &str) -> String {
		let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}");
		let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());

		format!("{header}.{body}.signature")
	}

	/// Builds a session holding the provided access/refresh pair.
	pub fn session_with(access: &str, refresh: &str) -> Session {
		Session::from_pair(CredentialPair::new(access, refresh), Some("alice".into()))
	}

	/// Constructs a [`Gateway`] pointed at `base_url`, backed by an in-memory store seeded with
	/// `session` and a [`RecordingObserver`].
	pub fn build_reqwest_test_gateway(
		base_url: &str,
		session: Session,
	) -> (ReqwestTestGateway, Arc<MemoryStore>, Arc<RecordingObserver>) {
		let store_backend = Arc::new(MemoryStore::with_session(session));
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let observer = Arc::new(RecordingObserver::default());
		let config = GatewayConfig::builder(
			Url::parse(base_url).expect("Mock server base URL should parse successfully."),
		)
		.build()
		.expect("Gateway configuration fixture should be valid.");
		let gateway = Gateway::with_http_client(config, store, ReqwestHttpClient::default())
			.with_session_observer(observer.clone());

		(gateway, store_backend, observer)
	}

	/// Reads the stored access token, if any.
	pub fn stored_access(store: &MemoryStore) -> Option<String> {
		store.snapshot().access_token.map(|secret: TokenSecret| secret.expose().to_owned())
	}

	/// Reads the stored refresh token, if any.
	pub fn stored_refresh(store: &MemoryStore) -> Option<String> {
		store.snapshot().refresh_token.map(|secret: TokenSecret| secret.expose().to_owned())
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
