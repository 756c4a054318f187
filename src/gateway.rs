//! The authenticated request gateway.
//!
//! [`Gateway`] owns the HTTP transport, the session store, and the refresh guard. Every call goes
//! through [`Gateway::send`]: the stored access token is attached (refreshed first when it is
//! about to expire), a 401 triggers one refresh and one resend, and a failed refresh wipes the
//! session and notifies the registered [`SessionObserver`].

pub mod dispatch;
pub mod refresh;

pub use dispatch::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::Session,
	config::GatewayConfig,
	http::ApiHttpClient,
	store::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Receives the signal that the session ended and the user must log in again.
///
/// Called at most once per failed refresh, after the store has been cleared.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Invoked with the configured login entry point.
	fn session_expired(&self, login_entry: &str);
}

/// Observer that ignores session terminations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionObserver;
impl SessionObserver for NoopSessionObserver {
	fn session_expired(&self, _: &str) {}
}

/// Authenticated entry point for every appointments API call.
pub struct Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// HTTP client used for every outbound request.
	pub http_client: Arc<C>,
	/// Session store holding the credential pair.
	pub store: Arc<dyn SessionStore>,
	/// Validated gateway settings.
	pub config: GatewayConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	observer: Arc<dyn SessionObserver>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C> Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_http_client(
		config: GatewayConfig,
		store: Arc<dyn SessionStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			config,
			refresh_metrics: Default::default(),
			observer: Arc::new(NoopSessionObserver),
			refresh_guard: Default::default(),
		}
	}

	/// Registers the observer told about session terminations.
	pub fn with_session_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
		self.observer = observer;

		self
	}

	/// Current session snapshot, for example to show the username.
	pub async fn session(&self) -> Result<Session> {
		Ok(self.store.load().await?)
	}

	/// Returns `true` when an access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.store.load().await?.access_token.is_some())
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Creates a gateway with its own reqwest client.
	pub fn new(config: GatewayConfig, store: Arc<dyn SessionStore>) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().build()?;

		Ok(Self::with_http_client(config, store, ReqwestHttpClient::with_client(client)))
	}
}
impl<C> Clone for Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			observer: self.observer.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_window", &self.config.refresh_window)
			.field("login_entry", &self.config.login_entry)
			.finish()
	}
}
