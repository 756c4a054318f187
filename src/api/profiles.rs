//! Saved patient profiles.

// self
use crate::{
	_prelude::*,
	auth::ProfileName,
	booking::{AppointmentProfile, Profile, ProfileDraft},
	gateway::Gateway,
	http::{ApiHttpClient, ApiRequest},
};

impl<C> Gateway<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Lists the account's profiles.
	pub async fn fetch_profiles(&self) -> Result<Vec<Profile>> {
		self.send_json(&ApiRequest::get(["profiles"])).await
	}

	/// Creates a profile after checking it against `existing` for name collisions.
	pub async fn create_profile(&self, draft: ProfileDraft, existing: &[Profile]) -> Result<Profile> {
		let draft = draft.trimmed();

		draft.validate(existing, None)?;

		self.send_json(&ApiRequest::post(["profiles"]).json(&draft)?).await
	}

	/// Replaces the profile called `name`.
	pub async fn update_profile(
		&self,
		name: &ProfileName,
		draft: ProfileDraft,
		existing: &[Profile],
	) -> Result<Profile> {
		let draft = draft.trimmed();

		draft.validate(existing, Some(name))?;

		self.send_json(&ApiRequest::put(["profiles", name.as_ref()]).json(&draft)?).await
	}

	/// Deletes the profile called `name`.
	pub async fn delete_profile(&self, name: &ProfileName) -> Result<()> {
		self.send(&ApiRequest::delete(["profiles", name.as_ref()])).await?;

		Ok(())
	}

	/// Booking pre-fill for the profile called `name`.
	pub async fn profile_for_appointment(&self, name: &ProfileName) -> Result<AppointmentProfile> {
		self.send_json(&ApiRequest::get(["profiles", "appointment", name.as_ref()])).await
	}
}
