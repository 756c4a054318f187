//! Gateway configuration: base URL, proactive refresh window, and the login entry point the host
//! is sent to when a session ends.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable overriding the API base URL.
pub const ENV_BASE_URL: &str = "APPOINTMENT_API_BASE_URL";
/// Environment variable overriding the refresh window, in whole seconds.
pub const ENV_REFRESH_WINDOW_SECS: &str = "APPOINTMENT_REFRESH_WINDOW_SECS";
/// Environment variable overriding the login entry point.
pub const ENV_LOGIN_ENTRY: &str = "APPOINTMENT_LOGIN_ENTRY";

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";
/// Route the host UI should show after the session is wiped.
pub const DEFAULT_LOGIN_ENTRY: &str = "/login";

/// Validated gateway settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
	/// API root; always ends with `/`.
	pub base_url: Url,
	/// Tokens with less than this much lifetime left are refreshed before sending.
	pub refresh_window: Duration,
	/// Login route passed to the session observer when the session ends.
	pub login_entry: String,
}
impl GatewayConfig {
	/// Default proactive refresh window.
	pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::seconds(60);

	/// Returns a builder seeded with `base_url`.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Reads [`ENV_BASE_URL`], [`ENV_REFRESH_WINDOW_SECS`], and [`ENV_LOGIN_ENTRY`], falling back
	/// to the defaults for unset variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`GatewayConfig::from_env`] but reads variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw_base = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
		let base_url =
			Url::parse(raw_base.trim()).map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let mut builder = Self::builder(base_url);

		if let Some(raw) = lookup(ENV_REFRESH_WINDOW_SECS) {
			let secs = raw
				.trim()
				.parse::<i64>()
				.map_err(|_| ConfigError::InvalidEnv { name: ENV_REFRESH_WINDOW_SECS })?;

			builder = builder.refresh_window(Duration::seconds(secs));
		}
		if let Some(entry) = lookup(ENV_LOGIN_ENTRY) {
			builder = builder.login_entry(entry);
		}

		builder.build()
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// API root.
	pub base_url: Url,
	/// Proactive refresh window.
	pub refresh_window: Duration,
	/// Login route for the session observer.
	pub login_entry: String,
}
impl GatewayConfigBuilder {
	/// Creates a new builder for `base_url` with default settings.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_window: GatewayConfig::DEFAULT_REFRESH_WINDOW,
			login_entry: DEFAULT_LOGIN_ENTRY.to_owned(),
		}
	}

	/// Overrides the proactive refresh window.
	pub fn refresh_window(mut self, window: Duration) -> Self {
		self.refresh_window = window;

		self
	}

	/// Overrides the login entry point.
	pub fn login_entry(mut self, entry: impl Into<String>) -> Self {
		self.login_entry = entry.into();

		self
	}

	/// Validates the settings and produces a [`GatewayConfig`].
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let mut base_url = self.base_url;

		if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
			return Err(ConfigError::UnsupportedBaseUrl { url: base_url.to_string() });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		base_url.set_query(None);
		base_url.set_fragment(None);

		if self.refresh_window.is_negative() {
			return Err(ConfigError::NegativeRefreshWindow);
		}

		Ok(GatewayConfig {
			base_url,
			refresh_window: self.refresh_window,
			login_entry: self.login_entry,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	#[test]
	fn builder_normalizes_trailing_slash() {
		let config = GatewayConfig::builder(url("https://clinic.example/api?x=1"))
			.build()
			.expect("Config should build.");

		assert_eq!(config.base_url.as_str(), "https://clinic.example/api/");
		assert_eq!(config.refresh_window, Duration::seconds(60));
		assert_eq!(config.login_entry, "/login");
	}

	#[test]
	fn builder_rejects_bad_inputs() {
		assert!(matches!(
			GatewayConfig::builder(url("ftp://clinic.example/")).build(),
			Err(ConfigError::UnsupportedBaseUrl { .. })
		));
		assert!(matches!(
			GatewayConfig::builder(url("mailto:desk@clinic.example")).build(),
			Err(ConfigError::UnsupportedBaseUrl { .. })
		));
		assert!(matches!(
			GatewayConfig::builder(url("https://clinic.example/"))
				.refresh_window(Duration::seconds(-1))
				.build(),
			Err(ConfigError::NegativeRefreshWindow)
		));
	}

	#[test]
	fn lookup_applies_overrides_and_defaults() {
		let defaults = GatewayConfig::from_lookup(|_| None).expect("Defaults should be valid.");

		assert_eq!(defaults.base_url.as_str(), DEFAULT_BASE_URL);
		assert_eq!(defaults.refresh_window, GatewayConfig::DEFAULT_REFRESH_WINDOW);
		assert_eq!(defaults.login_entry, DEFAULT_LOGIN_ENTRY);

		let config = GatewayConfig::from_lookup(|name| match name {
			ENV_BASE_URL => Some("https://clinic.example/v2".into()),
			ENV_REFRESH_WINDOW_SECS => Some("120".into()),
			ENV_LOGIN_ENTRY => Some("/signin".into()),
			_ => None,
		})
		.expect("Overrides should be valid.");

		assert_eq!(config.base_url.as_str(), "https://clinic.example/v2/");
		assert_eq!(config.refresh_window, Duration::seconds(120));
		assert_eq!(config.login_entry, "/signin");
	}

	#[test]
	fn lookup_rejects_unparsable_window() {
		let err = GatewayConfig::from_lookup(|name| {
			(name == ENV_REFRESH_WINDOW_SECS).then(|| "soon".to_owned())
		})
		.expect_err("Non-numeric window must be rejected.");

		assert!(matches!(err, ConfigError::InvalidEnv { name: ENV_REFRESH_WINDOW_SECS }));
	}
}
