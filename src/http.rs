//! Transport primitives for calls to the appointments API.
//!
//! [`ApiRequest`] is a replayable description of a call (method, path segments, query, headers,
//! JSON body, and whether it needs a bearer token). The gateway renders it into an
//! [`OutboundRequest`] against the configured base URL and hands that to an [`ApiHttpClient`].
//! Keeping requests as plain values is what lets the 401 path resend the identical call,
//! idempotency key included.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, DecodeError, TransportError},
};

/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<ApiResponse, E>> + 'a + Send>>;

/// Header carrying the bearer token.
pub const AUTHORIZATION: &str = "authorization";
/// Header carrying the per-attempt idempotency key on order creation.
pub const IDEMPOTENCY_KEY: &str = "x-idempotency-key";

/// Abstraction over HTTP transports capable of executing API calls.
///
/// The trait is the gateway's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so they can be shared behind an `Arc`, and the futures they return must
/// be `Send` so gateway calls can hop executors.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves with the raw response, whatever its status.
	///
	/// Only failures that prevented a response from arriving (DNS, TCP, TLS, body read) are
	/// errors; HTTP error statuses are returned as ordinary [`ApiResponse`] values.
	fn execute(&self, request: OutboundRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// HTTP methods used by the appointments API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Whether a request carries the session's bearer token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
	/// Attach the (refreshed if needed) access token and retry once on 401.
	#[default]
	Bearer,
	/// Never attach a token and never retry; used for login and registration.
	Anonymous,
}

/// Replayable description of an API call, relative to the configured base URL.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path segments; rendered percent-encoded with a trailing slash.
	pub segments: Vec<String>,
	/// Query pairs in insertion order.
	pub query: Vec<(String, String)>,
	/// Extra headers (lower-case names).
	pub headers: BTreeMap<String, String>,
	/// Serialized JSON body.
	pub body: Option<Vec<u8>>,
	/// Token attachment policy.
	pub auth: AuthMode,
}
impl ApiRequest {
	/// Creates a request for `method` and the given path segments.
	pub fn new<I, S>(method: Method, segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			method,
			segments: segments.into_iter().map(Into::into).collect(),
			query: Vec::new(),
			headers: BTreeMap::new(),
			body: None,
			auth: AuthMode::Bearer,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Get, segments)
	}

	/// Shorthand for a `POST` request.
	pub fn post<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Post, segments)
	}

	/// Shorthand for a `PUT` request.
	pub fn put<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Put, segments)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(Method::Delete, segments)
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets an extra header; the name is stored lower-cased.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body)?);

		Ok(self)
	}

	/// Marks the request as not needing a bearer token.
	pub fn anonymous(mut self) -> Self {
		self.auth = AuthMode::Anonymous;

		self
	}

	/// Human-readable path used in spans and logs.
	pub fn path(&self) -> String {
		let mut path = self.segments.join("/");

		path.push('/');

		path
	}

	/// Renders the request against `base`, attaching `bearer` when provided.
	pub fn render(
		&self,
		base: &Url,
		bearer: Option<&TokenSecret>,
	) -> Result<OutboundRequest, ConfigError> {
		let mut url = base.clone();

		{
			let mut path = url
				.path_segments_mut()
				.map_err(|_| ConfigError::UnsupportedBaseUrl { url: base.to_string() })?;

			path.pop_if_empty();
			path.extend(self.segments.iter());
			path.push("");
		}

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		let mut headers = self.headers.clone();

		if let Some(token) = bearer {
			headers.insert(AUTHORIZATION.into(), token.bearer());
		}
		if self.body.is_some() {
			headers.entry("content-type".into()).or_insert_with(|| "application/json".into());
		}

		Ok(OutboundRequest { method: self.method, url, headers, body: self.body.clone() })
	}
}

/// Fully rendered request handed to an [`ApiHttpClient`].
#[derive(Clone)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL.
	pub url: Url,
	/// Headers, including `authorization` when authenticated.
	pub headers: BTreeMap<String, String>,
	/// Request body bytes.
	pub body: Option<Vec<u8>>,
}
impl OutboundRequest {
	/// Returns `true` when a bearer token is attached.
	pub fn is_authenticated(&self) -> bool {
		self.headers.contains_key(AUTHORIZATION)
	}
}
impl Debug for OutboundRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers: BTreeMap<_, _> = self
			.headers
			.iter()
			.map(|(name, value)| {
				let shown = if name == AUTHORIZATION { "<redacted>" } else { value.as_str() };

				(name.as_str(), shown)
			})
			.collect();

		f.debug_struct("OutboundRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Raw response as seen by the gateway.
#[derive(Clone, Debug, Default)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers with lower-cased names.
	pub headers: BTreeMap<String, String>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Looks up a header by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let deserializer = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(deserializer)
			.map_err(|source| DecodeError { source, status: Some(self.status) })
	}

	/// Status and retry hint extracted from the response.
	pub fn metadata(&self) -> ResponseMetadata {
		ResponseMetadata {
			status: Some(self.status),
			retry_after: self.header("retry-after").and_then(parse_retry_after),
		}
	}
}

/// Metadata captured from a response for error classification.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: OutboundRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
	let mut collected = BTreeMap::new();

	for (name, value) in headers {
		if let Ok(value) = value.to_str() {
			collected.insert(name.as_str().to_owned(), value.to_owned());
		}
	}

	collected
}

/// Maps any transport failure into the gateway's [`TransportError`].
pub(crate) fn map_transport_error<E>(err: E) -> TransportError
where
	E: 'static + Send + Sync + StdError,
{
	TransportError::network(err)
}

/// Parses a `Retry-After` value given either as delta-seconds or an RFC 2822 date.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://clinic.example/api/").expect("Base URL fixture should parse.")
	}

	#[test]
	fn render_joins_segments_with_trailing_slash() {
		let request =
			ApiRequest::get(["appointments", "view"]).query("page", "2").query("date", "2025-01-06");
		let rendered = request.render(&base(), None).expect("Request should render.");

		assert_eq!(
			rendered.url.as_str(),
			"https://clinic.example/api/appointments/view/?page=2&date=2025-01-06"
		);
		assert!(!rendered.is_authenticated());
	}

	#[test]
	fn render_percent_encodes_segments() {
		let request = ApiRequest::delete(["profiles", "Grand Mother"]);
		let rendered = request.render(&base(), None).expect("Request should render.");

		assert_eq!(rendered.url.as_str(), "https://clinic.example/api/profiles/Grand%20Mother/");
	}

	#[test]
	fn render_handles_base_without_trailing_slash() {
		let base =
			Url::parse("https://clinic.example/api").expect("Base URL fixture should parse.");
		let rendered =
			ApiRequest::post(["login"]).render(&base, None).expect("Request should render.");

		assert_eq!(rendered.url.as_str(), "https://clinic.example/api/login/");
	}

	#[test]
	fn render_attaches_bearer_and_content_type() {
		let request = ApiRequest::post(["create-order"])
			.header("X-Idempotency-Key", "order-1")
			.json(&serde_json::json!({ "amount": 500 }))
			.expect("Body should serialize.");
		let token = TokenSecret::new("a1");
		let rendered = request.render(&base(), Some(&token)).expect("Request should render.");

		assert_eq!(rendered.headers.get(AUTHORIZATION).map(String::as_str), Some("Bearer a1"));
		assert_eq!(rendered.headers.get(IDEMPOTENCY_KEY).map(String::as_str), Some("order-1"));
		assert_eq!(
			rendered.headers.get("content-type").map(String::as_str),
			Some("application/json")
		);
		assert!(format!("{rendered:?}").contains("<redacted>"));
		assert!(!format!("{rendered:?}").contains("a1\""));
	}

	#[test]
	fn json_decode_reports_path() {
		#[derive(Debug, Deserialize)]
		struct Payload {
			#[allow(dead_code)]
			inner: Inner,
		}
		#[derive(Debug, Deserialize)]
		struct Inner {
			#[allow(dead_code)]
			count: u32,
		}

		let response = ApiResponse {
			status: 200,
			body: br#"{"inner":{"count":"x"}}"#.to_vec(),
			..Default::default()
		};
		let err = response.json::<Payload>().expect_err("Mismatched body should fail to decode.");

		assert_eq!(err.source.path().to_string(), "inner.count");
		assert_eq!(err.status, Some(200));
	}

	#[test]
	fn retry_after_parses_seconds_and_dates() {
		assert_eq!(parse_retry_after(" 30 "), Some(Duration::seconds(30)));
		assert_eq!(parse_retry_after("soon"), None);
		assert_eq!(parse_retry_after("Mon, 01 Jan 2001 00:00:00 +0000"), None);

		let response = ApiResponse {
			status: 429,
			headers: BTreeMap::from([("retry-after".to_owned(), "12".to_owned())]),
			body: Vec::new(),
		};

		assert_eq!(
			response.metadata(),
			ResponseMetadata { status: Some(429), retry_after: Some(Duration::seconds(12)) }
		);
	}
}
