//! Booking domain: appointment and profile models, client-side validation, and the
//! department/doctor/time-slot catalog.

pub mod appointment;
pub mod catalog;
pub mod profile;

pub use appointment::*;
pub use catalog::*;
pub use profile::*;

// self
use crate::_prelude::*;

/// Youngest accepted patient age.
pub const MIN_AGE: u8 = 0;
/// Oldest accepted patient age.
pub const MAX_AGE: u8 = 120;

/// Patient sex as recorded by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
	/// Male.
	#[serde(rename = "M")]
	Male,
	/// Female.
	#[serde(rename = "F")]
	Female,
	/// Other or undisclosed.
	#[default]
	#[serde(rename = "O")]
	Other,
}

/// Field-keyed validation failures, ordered by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);
impl ValidationErrors {
	/// Records a message for `field`, keeping the first one reported.
	pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
		self.0.entry(field).or_insert_with(|| message.into());
	}

	/// Message recorded for `field`, if any.
	pub fn get(&self, field: &str) -> Option<&str> {
		self.0.get(field).map(String::as_str)
	}

	/// Returns `true` when nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of failing fields.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates `(field, message)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		self.0.iter().map(|(field, message)| (*field, message.as_str()))
	}

	/// `Ok(())` when empty, otherwise `Err(self)`.
	pub fn into_result(self) -> Result<(), Self> {
		if self.is_empty() { Ok(()) } else { Err(self) }
	}
}
impl Display for ValidationErrors {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, message) in self.0.values().enumerate() {
			if idx > 0 {
				f.write_str("\n")?;
			}

			f.write_str(message)?;
		}

		Ok(())
	}
}
impl StdError for ValidationErrors {}

/// Accepts letters, whitespace, apostrophes, and hyphens; rejects empty input.
pub fn is_valid_person_name(name: &str) -> bool {
	!name.trim().is_empty()
		&& name.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '\'' || c == '-')
}

/// Returns `true` when `age` is within the accepted range.
pub fn is_valid_age(age: u8) -> bool {
	(MIN_AGE..=MAX_AGE).contains(&age)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn person_names_follow_letter_rules() {
		assert!(is_valid_person_name("Mary-Jane O'Neil"));
		assert!(!is_valid_person_name("R2D2"));
		assert!(!is_valid_person_name("   "));
		assert!(!is_valid_person_name("Zoë"));
	}

	#[test]
	fn sex_uses_single_letter_codes() {
		assert_eq!(serde_json::to_string(&Sex::Female).expect("Sex should serialize."), "\"F\"");
		assert_eq!(
			serde_json::from_str::<Sex>("\"O\"").expect("Sex should deserialize."),
			Sex::Other
		);
		assert!(serde_json::from_str::<Sex>("\"X\"").is_err());
	}

	#[test]
	fn validation_errors_keep_first_message_and_render_lines() {
		let mut errors = ValidationErrors::default();

		errors.add("time", "Lunch break.");
		errors.add("date", "Sunday.");
		errors.add("date", "Ignored.");

		assert_eq!(errors.len(), 2);
		assert_eq!(errors.get("date"), Some("Sunday."));
		assert_eq!(errors.to_string(), "Sunday.\nLunch break.");
		assert!(errors.into_result().is_err());
		assert!(ValidationErrors::default().into_result().is_ok());
	}
}
