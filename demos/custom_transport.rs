//! Demonstrates driving the gateway with a scripted, non-reqwest transport.
//!
//! 1. Implement [`ApiHttpClient`] with its own transport error type.
//! 2. Wrap the client in `Arc` and pass it to [`Gateway::with_http_client`] together with a
//!    [`MemoryStore`].
//! 3. Register a [`SessionObserver`] to learn when a failed refresh ends the session.
//! 4. Watch a 401 trigger one refresh and one resend, and a 429 surface as
//!    [`Error::RateLimited`].

// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use url::Url;
// self
use appointment_gateway::{
	api::Credentials,
	auth::Username,
	booking::{AppointmentDraft, Sex},
	config::GatewayConfig,
	error::Error,
	gateway::{Gateway, SessionObserver},
	http::{ApiHttpClient, ApiResponse, HttpFuture, OutboundRequest},
	store::{MemoryStore, SessionStore},
};

// Payloads expire in 2100.
const ACCESS: &str = "eyJhbGciOiJIUzI1NiJ9.eyJleHAiOjQxMDI0NDQ4MDB9.sig";
const ROTATED_ACCESS: &str = "eyJhbGciOiJIUzI1NiJ9.eyJleHAiOjQxMDI0NDQ4MDF9.sig";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = GatewayConfig::builder(Url::parse("https://clinic.example/api")?).build()?;
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let clinic = Arc::new(ScriptedClinic::with([
		Reply::Status(200, format!(r#"{{"access":"{ACCESS}","refresh":"r1"}}"#)),
		Reply::Status(401, r#"{"detail":"Given token not valid for any token type"}"#.into()),
		Reply::Status(200, format!(r#"{{"access":"{ROTATED_ACCESS}","refresh":"r2"}}"#)),
		Reply::Status(201, r#"{"id":41,"version":1}"#.into()),
		Reply::RateLimited { retry_after: "30" },
	]));
	let gateway: Gateway<ScriptedClinic> =
		Gateway::with_http_client(config.clone(), Arc::clone(&store), Arc::clone(&clinic))
			.with_session_observer(Arc::new(PrintingObserver));
	let session =
		gateway.login(&Credentials::new(Username::new("alice")?, "correct horse")).await?;

	println!("Logged in as {}.", session.username.as_deref().unwrap_or("<unknown>"));

	let confirmation = gateway.book_appointment(draft()).await?;

	println!("Booked appointment {} after one transparent refresh.", confirmation.id);
	println!("Refresh metrics: {} attempt(s).", gateway.refresh_metrics.attempts());

	match gateway.fetch_appointments(1, None).await {
		Err(Error::RateLimited { retry_after }) =>
			println!("Listing was throttled; retry after {retry_after:?}."),
		other => println!("Listing unexpectedly returned {other:?}."),
	}

	for request in clinic.requests() {
		println!("Sent {request:?}.");
	}

	let expiring = Arc::new(ScriptedClinic::with([
		Reply::Status(401, "{}".into()),
		Reply::Status(401, r#"{"detail":"Token is blacklisted","code":"token_not_valid"}"#.into()),
	]));
	let expiring_gateway: Gateway<ScriptedClinic> =
		Gateway::with_http_client(config, store, expiring)
			.with_session_observer(Arc::new(PrintingObserver));

	match expiring_gateway.book_appointment(draft()).await {
		Ok(_) => println!("Booking unexpectedly succeeded."),
		Err(e) => println!("Session ended: {e}."),
	}

	println!("Still authenticated: {}.", expiring_gateway.is_authenticated().await?);

	Ok(())
}

fn draft() -> AppointmentDraft {
	AppointmentDraft {
		name: "Jane Doe".into(),
		age: 34,
		sex: Sex::Female,
		date: "2025-01-06".into(),
		time: "10:30".into(),
		department: "Cardiology".into(),
		doctor: "Dr. Wilson".into(),
		version: 0,
	}
}

struct PrintingObserver;
impl SessionObserver for PrintingObserver {
	fn session_expired(&self, login_entry: &str) {
		println!("Observer: session expired, send the user to `{login_entry}`.");
	}
}

#[derive(Debug)]
enum ClinicTransportError {
	ScriptExhausted,
}
impl Display for ClinicTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::ScriptExhausted => write!(f, "No scripted reply left"),
		}
	}
}
impl StdError for ClinicTransportError {}

enum Reply {
	Status(u16, String),
	RateLimited { retry_after: &'static str },
}
impl Reply {
	fn into_response(self) -> ApiResponse {
		match self {
			Self::Status(status, body) => ApiResponse {
				status,
				headers: [("content-type".to_owned(), "application/json".to_owned())].into(),
				body: body.into_bytes(),
			},
			Self::RateLimited { retry_after } => ApiResponse {
				status: 429,
				headers: [("retry-after".to_owned(), retry_after.to_owned())].into(),
				body: Vec::new(),
			},
		}
	}
}

#[derive(Default)]
struct ScriptedClinic {
	replies: Mutex<VecDeque<Reply>>,
	requests: Mutex<Vec<OutboundRequest>>,
}
impl ScriptedClinic {
	fn with(replies: impl IntoIterator<Item = Reply>) -> Self {
		Self { replies: Mutex::new(replies.into_iter().collect()), ..Default::default() }
	}

	fn requests(&self) -> Vec<OutboundRequest> {
		self.requests.lock().clone()
	}
}
impl ApiHttpClient for ScriptedClinic {
	type TransportError = ClinicTransportError;

	fn execute(&self, request: OutboundRequest) -> HttpFuture<'_, Self::TransportError> {
		self.requests.lock().push(request);

		let next = self
			.replies
			.lock()
			.pop_front()
			.map(Reply::into_response)
			.ok_or(ClinicTransportError::ScriptExhausted);

		Box::pin(async move { next })
	}
}
