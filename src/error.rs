//! Gateway-level error types shared across the gateway, stores, transport, and typed API.

// self
use crate::{_prelude::*, booking::ValidationErrors};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Backend answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Client-side validation rejected the payload before it was sent.
	#[error("Request failed validation:\n{0}")]
	Validation(#[from] ValidationErrors),

	/// No credentials are available for the call.
	#[error("No stored credentials are available.")]
	Unauthenticated,
	/// Token refresh failed; stored credentials were wiped and the host was told to log in again.
	#[error("Session expired and must be re-established: {source}")]
	SessionExpired {
		/// Failure that ended the session.
		#[source]
		source: Box<Error>,
	},
	/// Backend rate limit hit (HTTP 429); never retried automatically.
	#[error("Request limit reached; try again later.")]
	RateLimited {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}
impl Error {
	/// Wraps a refresh failure into [`Error::SessionExpired`].
	pub fn session_expired(source: Error) -> Self {
		Self::SessionExpired { source: Box::new(source) }
	}

	/// Returns `true` for rate-limit failures.
	pub fn is_rate_limited(&self) -> bool {
		matches!(self, Self::RateLimited { .. })
	}

	/// Returns `true` when the session ended and the user must log in again.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired { .. })
	}

	/// HTTP status carried by the failure, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(api) => Some(api.status),
			Self::RateLimited { .. } => Some(429),
			Self::Decode(decode) => decode.status,
			Self::SessionExpired { source } => source.status(),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised while assembling the gateway or a request.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S) or cannot carry path segments.
	#[error("Base URL `{url}` must be an absolute http(s) URL.")]
	UnsupportedBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// The refresh window must not be negative.
	#[error("The refresh window must not be negative.")]
	NegativeRefreshWindow,
	/// An environment variable held an unparsable value.
	#[error("Environment variable `{name}` has an invalid value.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the appointments API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the appointments API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response body did not match the expected JSON shape.
#[derive(Debug, ThisError)]
#[error("Response body is malformed JSON.")]
pub struct DecodeError {
	/// Structured parsing failure naming the offending path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
	/// HTTP status code of the response.
	pub status: Option<u16>,
}

/// Non-success response from the backend, passed through for the caller to interpret.
#[derive(Clone, Debug, ThisError)]
#[error("Appointments API returned HTTP {status}: {body}")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Decoded error body.
	pub body: ApiErrorBody,
}
impl ApiError {
	/// Builds an error from a status and raw body bytes.
	pub fn from_parts(status: u16, body: &[u8]) -> Self {
		Self { status, body: ApiErrorBody::parse(body) }
	}

	/// Returns `true` for HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Returns `true` for HTTP 409 (the record changed since it was read).
	pub fn is_conflict(&self) -> bool {
		self.status == 409
	}

	/// Returns the field-level messages, if the backend reported any.
	pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
		match &self.body {
			ApiErrorBody::Fields(fields) => Some(fields),
			_ => None,
		}
	}
}

/// Error payload shapes the backend is known to return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiErrorBody {
	/// `{"error": "..."}` or `{"detail": "..."}`.
	Message(String),
	/// `{"field": ["msg", ...]}` or `{"field": "msg"}`.
	Fields(BTreeMap<String, Vec<String>>),
	/// Plain-text or unrecognized payload.
	Raw(String),
	/// Empty body.
	Empty,
}
impl ApiErrorBody {
	/// Classifies a raw response body.
	pub fn parse(body: &[u8]) -> Self {
		let text = String::from_utf8_lossy(body);
		let trimmed = text.trim();

		if trimmed.is_empty() {
			return Self::Empty;
		}

		match serde_json::from_str::<serde_json::Value>(trimmed) {
			Ok(serde_json::Value::Object(map)) => {
				for key in ["detail", "error"] {
					if let Some(serde_json::Value::String(message)) = map.get(key) {
						return Self::Message(message.clone());
					}
				}
				if let Some(serde_json::Value::String(message)) = map.get("message")
					&& map.len() == 1
				{
					return Self::Message(message.clone());
				}

				let mut fields = BTreeMap::new();

				for (key, value) in map {
					let messages = match value {
						serde_json::Value::String(message) => vec![message],
						serde_json::Value::Array(items) => items
							.into_iter()
							.map(|item| match item {
								serde_json::Value::String(message) => message,
								other => other.to_string(),
							})
							.collect(),
						other => vec![other.to_string()],
					};

					fields.insert(key, messages);
				}

				Self::Fields(fields)
			},
			Ok(serde_json::Value::String(message)) => Self::Message(message),
			_ => Self::Raw(trimmed.to_owned()),
		}
	}
}
impl Display for ApiErrorBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Message(message) | Self::Raw(message) => f.write_str(message),
			Self::Fields(fields) => {
				for (idx, (field, messages)) in fields.iter().enumerate() {
					if idx > 0 {
						f.write_str("\n")?;
					}

					let mut chars = field.chars();

					if let Some(first) = chars.next() {
						write!(f, "{}{}", first.to_uppercase(), chars.as_str())?;
					}

					write!(f, ": {}", messages.join(", "))?;
				}

				Ok(())
			},
			Self::Empty => f.write_str("<empty body>"),
		}
	}
}
