//! Patient profiles saved per account for quick booking.

// self
use crate::{
	_prelude::*,
	auth::{PROFILE_NAME_MAX_LEN, ProfileName},
	booking::{Sex, ValidationErrors, is_valid_age},
};

/// Longest patient name stored on a profile.
pub const PATIENT_NAME_MAX_LEN: usize = 100;

/// Profile fields submitted on create and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
	/// Account-unique label, compared case-insensitively.
	pub profile_name: String,
	/// Patient name used to pre-fill bookings.
	pub patient_name: String,
	/// Patient age in years.
	pub age: u8,
	/// Patient sex.
	pub sex: Sex,
}
impl ProfileDraft {
	/// Checks the draft against the field rules and against `existing` profiles.
	///
	/// `editing` names the profile being updated so it does not collide with itself.
	pub fn validate(
		&self,
		existing: &[Profile],
		editing: Option<&ProfileName>,
	) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::default();
		let label = self.profile_name.trim();
		let folded = label.to_lowercase();

		if label.is_empty() {
			errors.add("profile_name", "Profile name is required");
		} else if label.chars().count() > PROFILE_NAME_MAX_LEN {
			errors.add("profile_name", "Profile name must be 30 characters or fewer");
		} else if existing.iter().any(|profile| {
			let stored = profile.profile_name.to_lowercase();

			stored == folded && editing.is_none_or(|name| name.to_lowercase() != stored)
		}) {
			errors.add("profile_name", "A profile with this name already exists");
		}

		if self.patient_name.trim().is_empty() {
			errors.add("patient_name", "Patient name is required");
		} else if self.patient_name.chars().count() > PATIENT_NAME_MAX_LEN {
			errors.add("patient_name", "Patient name must be 100 characters or fewer");
		}
		if !is_valid_age(self.age) {
			errors.add("age", "Please enter a valid age between 0 and 120");
		}

		errors.into_result()
	}

	/// Returns the draft with surrounding whitespace removed from both names.
	pub fn trimmed(mut self) -> Self {
		self.profile_name = self.profile_name.trim().to_owned();
		self.patient_name = self.patient_name.trim().to_owned();

		self
	}
}

/// Profile as returned by `profiles/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
	/// Account-unique label.
	pub profile_name: String,
	/// Patient name.
	pub patient_name: String,
	/// Patient age in years.
	pub age: u8,
	/// Patient sex.
	#[serde(default)]
	pub sex: Sex,
}
impl Profile {
	/// Typed label for use in request paths.
	pub fn name(&self) -> Result<ProfileName, crate::auth::IdentifierError> {
		ProfileName::new(&self.profile_name)
	}

	/// Draft pre-filled from this profile, for editing.
	pub fn to_draft(&self) -> ProfileDraft {
		ProfileDraft {
			profile_name: self.profile_name.clone(),
			patient_name: self.patient_name.clone(),
			age: self.age,
			sex: self.sex,
		}
	}
}

/// Booking pre-fill served by `profiles/appointment/{name}/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentProfile {
	/// Patient name.
	pub name: String,
	/// Patient age in years.
	pub age: u8,
	/// Patient sex.
	#[serde(default)]
	pub sex: Sex,
}
