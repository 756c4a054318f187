//! Login, registration, and logout.

// self
use crate::{
	_prelude::*,
	auth::{Session, TokenResponse, Username},
	gateway::Gateway,
	http::{ApiHttpClient, ApiRequest},
};

/// Username and password submitted to `login/` and `register/`.
#[derive(Clone, Serialize)]
pub struct Credentials {
	/// Account name.
	pub username: Username,
	password: String,
}
impl Credentials {
	/// Bundles a username with its password.
	pub fn new(username: Username, password: impl Into<String>) -> Self {
		Self { username, password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

impl<C> Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Logs in and persists the issued pair together with the username.
	///
	/// A 401 here means the credentials were rejected; it never triggers a refresh.
	pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
		let request = ApiRequest::post(["login"]).anonymous().json(credentials)?;
		let tokens: TokenResponse = self.send_json(&request).await?;
		let pair = tokens.into_pair(None).ok_or(Error::Unauthenticated)?;
		let session = Session::from_pair(pair, Some(credentials.username.to_string()));

		self.store.save(session.clone()).await?;

		Ok(session)
	}

	/// Creates an account; the caller logs in separately afterwards.
	pub async fn register(&self, credentials: &Credentials) -> Result<()> {
		let request = ApiRequest::post(["register"]).anonymous().json(credentials)?;

		self.send(&request).await?;

		Ok(())
	}

	/// Forgets the local session without contacting the backend or notifying the observer.
	pub async fn logout(&self) -> Result<()> {
		Ok(self.store.clear().await?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credentials_serialize_plainly_but_debug_redacts() {
		let credentials = Credentials::new(
			Username::new("alice").expect("Username fixture should be valid."),
			"hunter2",
		);
		let json = serde_json::to_value(&credentials).expect("Credentials should serialize.");

		assert_eq!(json, serde_json::json!({ "username": "alice", "password": "hunter2" }));
		assert!(!format!("{credentials:?}").contains("hunter2"));
	}
}
