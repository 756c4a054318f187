//! Decoded view of access-token claims used for proactive refresh decisions.
//!
//! Only the JWT payload segment is decoded; signatures are the backend's concern. Any token
//! that cannot be decoded is treated as already expiring so callers fail safe toward a refresh.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Errors raised while decoding access-token claims.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// The token does not have the `header.payload.signature` layout.
	#[error("Token does not contain three dot-separated segments.")]
	Malformed,
	/// The payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// The payload is not the expected JSON object.
	#[error("Token payload is not a valid claims object.")]
	Json(#[from] serde_json::Error),
}

/// Claims carried by the backend's access tokens.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
	/// Expiry, in seconds since the Unix epoch.
	pub exp: i64,
	/// Token kind reported by the backend (`access`).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Unique token identifier.
	#[serde(default)]
	pub jti: Option<String>,
	/// Backend user identifier.
	#[serde(default)]
	pub user_id: Option<serde_json::Value>,
}
impl AccessClaims {
	/// Decodes the payload segment of `token`.
	pub fn decode(token: &str) -> Result<Self, ClaimsError> {
		let mut segments = token.split('.');
		let (Some(_header), Some(payload), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(ClaimsError::Malformed);
		};
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;

		Ok(serde_json::from_slice(&bytes)?)
	}

	/// Time left before expiry, measured from `now`. Negative once expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		Duration::seconds(self.exp.saturating_sub(now.unix_timestamp()))
	}
}

/// Returns `true` when `token` expires in less than `window` from `now`, or cannot be decoded.
pub fn expires_within(token: &str, window: Duration, now: OffsetDateTime) -> bool {
	match AccessClaims::decode(token) {
		Ok(claims) => claims.remaining_at(now) < window,
		Err(_) => true,
	}
}
