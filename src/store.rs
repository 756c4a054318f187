//! Session storage contract and built-in backends.
//!
//! The gateway is the only writer: it saves the pair on login, rotates it on refresh, and clears
//! it when a refresh fails. Hosts read the store through the same trait (for example to show the
//! username) instead of touching ambient global state.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Session},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the single client session.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Loads the current session; an empty [`Session`] when nothing is stored.
	fn load(&self) -> StoreFuture<'_, Session>;

	/// Replaces the whole session.
	fn save(&self, session: Session) -> StoreFuture<'_, ()>;

	/// Atomically swaps in a rotated pair if the stored refresh token still equals
	/// `expected_refresh`. The username is preserved.
	fn rotate<'a>(
		&'a self,
		expected_refresh: &'a str,
		pair: CredentialPair,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Removes the access token, refresh token, and username.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh secret matched the expected value and the pair was replaced.
	Updated,
	/// A session exists but holds a different refresh secret.
	RefreshMismatch,
	/// No refresh secret is stored (logged out or wiped).
	Missing,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

pub(crate) fn rotate_in_place(
	session: &mut Session,
	expected_refresh: &str,
	pair: CredentialPair,
) -> CompareAndSwapOutcome {
	if session.refresh_token.is_none() {
		return CompareAndSwapOutcome::Missing;
	}
	if !session.refresh_matches(Some(expected_refresh)) {
		return CompareAndSwapOutcome::RefreshMismatch;
	}

	session.apply_pair(pair);

	CompareAndSwapOutcome::Updated
}
