//! Strongly typed names used in request paths and login payloads.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				$validate($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$validate($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Longest username the backend accepts.
pub const USERNAME_MAX_LEN: usize = 150;
/// Longest profile name the backend accepts.
pub const PROFILE_NAME_MAX_LEN: usize = 30;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} cannot be empty.")]
	Empty {
		/// Kind of identifier (username, profile name).
		kind: &'static str,
	},
	/// The identifier contains disallowed whitespace.
	#[error("{kind} contains disallowed whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (username, profile name).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (username, profile name).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { Username, "Account name used to log in.", "Username", validate_username }
def_id! {
	ProfileName,
	"Per-account unique label of a patient profile; appears in request paths.",
	"Profile name",
	validate_profile_name
}

fn validate_username(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.chars().count() > USERNAME_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: USERNAME_MAX_LEN });
	}

	Ok(())
}

// Inner spaces are fine ("Grand Mother"); surrounding whitespace is not.
fn validate_profile_name(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.trim().is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.trim() != view {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.chars().count() > PROFILE_NAME_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: PROFILE_NAME_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	#[test]
	fn usernames_reject_whitespace() {
		assert!(Username::new(" alice").is_err(), "Leading whitespace must be rejected.");
		assert!(Username::new("al ice").is_err(), "Inner whitespace must be rejected.");
		assert!(Username::new("").is_err());

		let user = Username::new("alice").expect("Username fixture should be valid.");

		assert_eq!(user.as_ref(), "alice");
	}

	#[test]
	fn profile_names_allow_inner_spaces_only() {
		ProfileName::new("Grand Mother").expect("Inner spaces should be accepted.");

		assert_eq!(
			ProfileName::new("Mom ").expect_err("Trailing space must be rejected."),
			IdentifierError::ContainsWhitespace { kind: "Profile name" }
		);
		assert_eq!(
			ProfileName::new("   ").expect_err("Blank names must be rejected."),
			IdentifierError::Empty { kind: "Profile name" }
		);
	}

	#[test]
	fn profile_name_length_limit() {
		ProfileName::new("a".repeat(PROFILE_NAME_MAX_LEN)).expect("Exact length should succeed.");

		assert!(ProfileName::new("a".repeat(PROFILE_NAME_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let name: ProfileName =
			serde_json::from_str("\"Dad\"").expect("Profile name should deserialize successfully.");

		assert_eq!(name.as_ref(), "Dad");
		assert!(serde_json::from_str::<ProfileName>("\"\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<ProfileName, u8> = HashMap::from_iter([(
			ProfileName::new("Dad").expect("Profile name used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("Dad"), Some(&7));
	}
}
