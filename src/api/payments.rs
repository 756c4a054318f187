//! Order creation and payment verification.

// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	booking::Appointment,
	gateway::Gateway,
	http::{ApiHttpClient, ApiRequest, IDEMPOTENCY_KEY},
};

/// Standard appointment fee.
pub const APPOINTMENT_FEE: u64 = 500;

/// Client-generated key letting the backend deduplicate order creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);
impl IdempotencyKey {
	/// Generates a fresh `order-<uuid>` key.
	pub fn generate() -> Self {
		Self(format!("order-{}", Uuid::new_v4()))
	}

	/// Key as sent on the wire.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for IdempotencyKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Body of `create-order/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
	/// Amount to charge.
	pub amount: u64,
	/// Appointment being paid for.
	pub appointment_id: u64,
}
impl OrderRequest {
	/// Order for the standard fee of `appointment_id`.
	pub fn for_appointment(appointment_id: u64) -> Self {
		Self { amount: APPOINTMENT_FEE, appointment_id }
	}
}

/// Payment order issued by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Order {
	/// Payment-provider order identifier.
	pub order_id: String,
	/// Amount in the provider's minor unit.
	pub amount: u64,
	/// ISO currency code.
	pub currency: String,
}

/// Provider callback fields forwarded to `verify-payment/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentVerification {
	/// Order identifier returned by the provider.
	pub order_id: String,
	/// Payment identifier returned by the provider.
	pub payment_id: String,
	/// Provider signature over the order and payment identifiers.
	pub signature: String,
}

/// Result of a successful verification.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VerifiedPayment {
	/// The now-paid appointment.
	pub appointment: Appointment,
	/// Provider transaction identifier.
	pub transaction_id: String,
}

impl<C> Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a payment order under a freshly generated idempotency key.
	pub async fn create_order(&self, order: &OrderRequest) -> Result<Order> {
		self.create_order_with_key(order, &IdempotencyKey::generate()).await
	}

	/// Creates a payment order under `key`; reuse the key to retry the same order safely.
	pub async fn create_order_with_key(
		&self,
		order: &OrderRequest,
		key: &IdempotencyKey,
	) -> Result<Order> {
		let request =
			ApiRequest::post(["create-order"]).header(IDEMPOTENCY_KEY, key.as_str()).json(order)?;

		self.send_json(&request).await
	}

	/// Confirms a completed payment with the backend.
	pub async fn verify_payment(&self, verification: &PaymentVerification) -> Result<VerifiedPayment> {
		self.send_json(&ApiRequest::post(["verify-payment"]).json(verification)?).await
	}
}
