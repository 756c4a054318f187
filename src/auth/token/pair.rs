//! The access/refresh credential pair issued by login and refresh calls.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access and refresh tokens issued together by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPair {
	/// Short-lived bearer credential.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for a new pair; rotated on every use.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Builds a pair from raw token strings.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access), refresh_token: TokenSecret::new(refresh) }
	}
}

/// Wire shape of `login/` and `token/refresh/` responses.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
	/// New access token.
	pub access: TokenSecret,
	/// Rotated refresh token; some deployments omit it on refresh.
	#[serde(default)]
	pub refresh: Option<TokenSecret>,
}
impl TokenResponse {
	/// Converts the response into a pair, falling back to `previous_refresh` when the backend did
	/// not rotate the refresh token.
	pub fn into_pair(self, previous_refresh: Option<&TokenSecret>) -> Option<CredentialPair> {
		let refresh_token = self.refresh.or_else(|| previous_refresh.cloned())?;

		Some(CredentialPair { access_token: self.access, refresh_token })
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access", &"<redacted>")
			.field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}
