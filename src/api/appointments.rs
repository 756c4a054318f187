//! Booking, rescheduling, listing, and cancelling appointments.

// self
use crate::{
	_prelude::*,
	booking::{
		AppointmentDraft, AppointmentPage, AppointmentUpdate, AppointmentUpdated,
		BookingConfirmation, ValidationErrors,
	},
	gateway::Gateway,
	http::{ApiHttpClient, ApiRequest},
};

impl<C> Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Validates `draft`, normalizes its time to `HH:MM:SS`, and books it.
	pub async fn book_appointment(&self, draft: AppointmentDraft) -> Result<BookingConfirmation> {
		draft.validate()?;

		let request = ApiRequest::post(["appointments", "create"]).json(&draft.normalized())?;

		self.send_json(&request).await
	}

	/// Moves an appointment to a new slot.
	///
	/// An empty time is sent as [`DEFAULT_UPDATE_TIME`](crate::booking::DEFAULT_UPDATE_TIME).
	/// HTTP 409 means the appointment changed since it was read; it surfaces as [`Error::Api`]
	/// with [`ApiError::is_conflict`](crate::error::ApiError::is_conflict) set.
	pub async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<AppointmentUpdated> {
		let update = update.clone().with_default_time();

		update.validate()?;

		let request = ApiRequest::put(["appointments", "update"]).json(&update)?;
		let response = self.send(&request).await?;

		if response.body.iter().all(u8::is_ascii_whitespace) {
			return Ok(AppointmentUpdated::default());
		}

		Ok(response.json()?)
	}

	/// Fetches one page of the user's appointments, optionally restricted to `date`.
	pub async fn fetch_appointments(&self, page: u32, date: Option<&str>) -> Result<AppointmentPage> {
		let mut request = ApiRequest::get(["appointments", "view"]).query("page", page.max(1).to_string());

		if let Some(date) = date.map(str::trim).filter(|date| !date.is_empty()) {
			request = request.query("date", date);
		}

		self.send_json(&request).await
	}

	/// Cancels the appointment with `id`.
	pub async fn cancel_appointment(&self, id: u64) -> Result<()> {
		if id == 0 {
			let mut errors = ValidationErrors::default();

			errors.add("id", "Appointment ID is required");

			return Err(errors.into());
		}

		self.send(&ApiRequest::delete(["appointments".to_owned(), "cancel".to_owned(), id.to_string()]))
			.await?;

		Ok(())
	}
}
