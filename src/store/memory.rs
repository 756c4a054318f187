//! Thread-safe in-memory [`SessionStore`] implementation for short-lived processes and tests.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Session},
	store::{self, CompareAndSwapOutcome, SessionStore, StoreFuture},
};

/// Process-local session storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Session>>);
impl MemoryStore {
	/// Creates a store pre-seeded with `session`.
	pub fn with_session(session: Session) -> Self {
		Self(Arc::new(RwLock::new(session)))
	}

	/// Returns a copy of the current session without going through a future.
	pub fn snapshot(&self) -> Session {
		self.0.read().clone()
	}
}
impl SessionStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Session> {
		let session = self.snapshot();

		Box::pin(async move { Ok(session) })
	}

	fn save(&self, session: Session) -> StoreFuture<'_, ()> {
		let inner = self.0.clone();

		Box::pin(async move {
			*inner.write() = session;

			Ok(())
		})
	}

	fn rotate<'a>(
		&'a self,
		expected_refresh: &'a str,
		pair: CredentialPair,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		let inner = self.0.clone();

		Box::pin(async move {
			let mut guard = inner.write();

			Ok(store::rotate_in_place(&mut guard, expected_refresh, pair))
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let inner = self.0.clone();

		Box::pin(async move {
			*inner.write() = Session::default();

			Ok(())
		})
	}
}
