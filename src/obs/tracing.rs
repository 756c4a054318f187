// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapper used by gateway operations.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("appointment_gateway.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning that the session was wiped and the host should show `login_entry`.
pub fn warn_session_terminated(login_entry: &str, cause: &dyn StdError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(login_entry, error = %cause, "session terminated after failed refresh");

	#[cfg(not(feature = "tracing"))]
	let _ = (login_entry, cause);
}

/// Emits a warning that the backend rate-limited `path`.
pub fn warn_rate_limited(path: &str, retry_after: Option<Duration>) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		path,
		retry_after_secs = retry_after.map(|d| d.whole_seconds()),
		"request rate limited"
	);

	#[cfg(not(feature = "tracing"))]
	let _ = (path, retry_after);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn warnings_are_safe_without_subscriber() {
		let cause = crate::error::Error::Unauthenticated;

		warn_session_terminated("/login", &cause);
		warn_rate_limited("appointments/view/", Some(Duration::seconds(3)));
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
