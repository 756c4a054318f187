//! The persisted client session: credential pair plus a display-only username.

// self
use crate::{
	_prelude::*,
	auth::token::{pair::CredentialPair, secret::TokenSecret},
};

/// Everything the client persists between runs, stored under the fixed keys `token`,
/// `refreshToken`, and `username`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	/// Current access token.
	#[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Current refresh token.
	#[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Display name of the logged-in user; never used for authorization.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
}
impl Session {
	/// Builds a session from a freshly issued pair.
	pub fn from_pair(pair: CredentialPair, username: Option<String>) -> Self {
		Self {
			access_token: Some(pair.access_token),
			refresh_token: Some(pair.refresh_token),
			username,
		}
	}

	/// Returns `true` when no key is populated.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none() && self.username.is_none()
	}

	/// Replaces the credential pair while keeping the username.
	pub fn apply_pair(&mut self, pair: CredentialPair) {
		self.access_token = Some(pair.access_token);
		self.refresh_token = Some(pair.refresh_token);
	}

	/// Returns `true` when the stored refresh token equals `expected`.
	pub fn refresh_matches(&self, expected: Option<&str>) -> bool {
		match (self.refresh_token.as_ref().map(TokenSecret::expose), expected) {
			(None, None) => true,
			(Some(current), Some(expected)) => current == expected,
			_ => false,
		}
	}
}
