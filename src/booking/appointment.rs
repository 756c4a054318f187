//! Appointment models, slot rules, and list filtering.

// crates.io
use time::{Date, Time, Weekday, macros::format_description};
// self
use crate::{
	_prelude::*,
	booking::{Sex, ValidationErrors, catalog::LUNCH_HOUR, is_valid_age, is_valid_person_name},
};

/// Appointments returned per page by `appointments/view/`.
pub const PAGE_SIZE: u64 = 10;
/// Time used for an update that does not name one.
pub const DEFAULT_UPDATE_TIME: &str = "09:00";

/// Booking request as submitted to `appointments/create/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDraft {
	/// Patient name.
	pub name: String,
	/// Patient age in years.
	pub age: u8,
	/// Patient sex.
	pub sex: Sex,
	/// Calendar date, `YYYY-MM-DD`.
	pub date: String,
	/// Time of day, `HH:MM` or `HH:MM:SS`.
	pub time: String,
	/// Department name.
	pub department: String,
	/// Doctor name.
	pub doctor: String,
	/// Optimistic-concurrency version echoed back by the backend.
	#[serde(default)]
	pub version: u32,
}
impl AppointmentDraft {
	/// Checks every field and reports all failures at once.
	pub fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::default();

		if !is_valid_person_name(&self.name) {
			errors.add(
				"name",
				"Name contains invalid characters. Only letters, spaces, apostrophes, and hyphens are allowed.",
			);
		}
		if !is_valid_age(self.age) {
			errors.add("age", "Please enter a valid age between 0 and 120");
		}

		validate_slot(&self.date, &self.time, &mut errors);

		if self.department.trim().is_empty() {
			errors.add("department", "Please select a department");
		}
		if self.doctor.trim().is_empty() {
			errors.add("doctor", "Please select a doctor");
		}

		errors.into_result()
	}

	/// Returns the draft with `time` normalized to `HH:MM:SS`.
	pub fn normalized(mut self) -> Self {
		self.time = normalize_time(&self.time);

		self
	}
}

/// Appointment as stored by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
	/// Backend identifier.
	pub id: u64,
	/// Patient name.
	pub name: String,
	/// Patient age in years.
	pub age: u8,
	/// Patient sex.
	#[serde(default)]
	pub sex: Sex,
	/// Calendar date, `YYYY-MM-DD`.
	pub date: String,
	/// Time of day.
	pub time: String,
	/// Department name.
	pub department: String,
	/// Doctor name.
	pub doctor: String,
	/// Optimistic-concurrency version.
	#[serde(default)]
	pub version: u32,
	/// Creation timestamp as rendered by the backend.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
	/// Payment state label, when the backend tracks one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payment_status: Option<String>,
}
impl Appointment {
	/// Parsed calendar date, if well formed.
	pub fn calendar_date(&self) -> Option<Date> {
		parse_date(&self.date).ok()
	}
}

/// Response of `appointments/create/`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BookingConfirmation {
	/// Identifier of the created appointment, needed for payment.
	pub id: u64,
	/// Version assigned by the backend.
	#[serde(default)]
	pub version: Option<u32>,
}

/// One page of `appointments/view/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentPage {
	/// Total appointments across all pages.
	pub count: u64,
	/// Link to the next page.
	pub next: Option<String>,
	/// Link to the previous page.
	pub previous: Option<String>,
	/// Appointments on this page.
	pub results: Vec<Appointment>,
}
impl AppointmentPage {
	/// Number of pages implied by [`AppointmentPage::count`].
	pub fn total_pages(&self) -> u64 {
		self.count.div_ceil(PAGE_SIZE)
	}

	/// Appointments on this page matching `filter`, judged against `today`.
	pub fn filter<'a>(
		&'a self,
		filter: &'a AppointmentFilter,
		today: Date,
	) -> impl Iterator<Item = &'a Appointment> + 'a {
		self.results.iter().filter(move |appointment| filter.matches(appointment, today))
	}
}
impl<'de> Deserialize<'de> for AppointmentPage {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		#[derive(Deserialize)]
		struct Paginated {
			count: u64,
			#[serde(default)]
			next: Option<String>,
			#[serde(default)]
			previous: Option<String>,
			results: Vec<Appointment>,
		}

		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Wire {
			Paginated(Paginated),
			Plain(Vec<Appointment>),
		}

		Ok(match Wire::deserialize(deserializer)? {
			Wire::Paginated(page) => Self {
				count: page.count,
				next: page.next,
				previous: page.previous,
				results: page.results,
			},
			Wire::Plain(results) =>
				Self { count: results.len() as u64, next: None, previous: None, results },
		})
	}
}

/// Which part of the timeline to keep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimelineFilter {
	/// Keep everything.
	#[default]
	All,
	/// Today and later.
	Upcoming,
	/// Strictly before today.
	Completed,
}

/// Local filter applied to an already fetched page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
	/// Case-insensitive substring matched against name, doctor, and department.
	pub search: Option<String>,
	/// Timeline restriction.
	pub timeline: TimelineFilter,
	/// Exact department match.
	pub department: Option<String>,
}
impl AppointmentFilter {
	/// Returns `true` when `appointment` passes every configured criterion.
	pub fn matches(&self, appointment: &Appointment, today: Date) -> bool {
		if let Some(term) = self.search.as_deref().map(str::to_lowercase).filter(|t| !t.is_empty())
			&& ![&appointment.name, &appointment.doctor, &appointment.department]
				.iter()
				.any(|field| field.to_lowercase().contains(&term))
		{
			return false;
		}
		if let Some(department) = &self.department
			&& appointment.department != *department
		{
			return false;
		}

		match (self.timeline, appointment.calendar_date()) {
			(TimelineFilter::All, _) => true,
			(TimelineFilter::Upcoming, Some(date)) => date >= today,
			(TimelineFilter::Completed, Some(date)) => date < today,
			(_, None) => false,
		}
	}
}

/// Reschedule request sent to `appointments/update/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppointmentUpdate {
	/// Appointment being moved; must be non-zero.
	pub id: u64,
	/// New date, `YYYY-MM-DD`.
	pub date: String,
	/// New time; [`DEFAULT_UPDATE_TIME`] when left empty.
	pub time: String,
}
impl AppointmentUpdate {
	/// Builds an update, defaulting an empty time to [`DEFAULT_UPDATE_TIME`].
	pub fn new(id: u64, date: impl Into<String>, time: impl Into<String>) -> Self {
		Self { id, date: date.into(), time: time.into() }.with_default_time()
	}

	/// Returns the update with an empty time replaced by [`DEFAULT_UPDATE_TIME`].
	pub fn with_default_time(mut self) -> Self {
		if self.time.trim().is_empty() {
			self.time = DEFAULT_UPDATE_TIME.to_owned();
		}

		self
	}

	/// Checks the identifier and the new slot against the booking rules.
	pub fn validate(&self) -> Result<(), ValidationErrors> {
		let mut errors = ValidationErrors::default();

		if self.id == 0 {
			errors.add("id", "Appointment ID is required for updates");
		}

		validate_slot(&self.date, &self.time, &mut errors);

		errors.into_result()
	}

	/// Returns `true` when the update would not move `current`.
	pub fn is_noop_for(&self, current: &Appointment) -> bool {
		current.date == self.date && normalize_time(&current.time) == normalize_time(&self.time)
	}
}

/// Response of `appointments/update/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AppointmentUpdated {
	/// Updated appointment, when echoed back.
	#[serde(default)]
	pub appointment: Option<Appointment>,
	/// Human-readable confirmation.
	#[serde(default)]
	pub message: Option<String>,
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
	Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
}

/// Parses `HH:MM:SS` or `HH:MM`.
pub fn parse_time(raw: &str) -> Result<Time, time::error::Parse> {
	let raw = raw.trim();

	Time::parse(raw, format_description!("[hour]:[minute]:[second]"))
		.or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]")))
}

/// Appends `:00` to `HH:MM` values; anything else is returned unchanged.
pub fn normalize_time(raw: &str) -> String {
	let raw = raw.trim();

	if raw.split(':').count() == 2 { format!("{raw}:00") } else { raw.to_owned() }
}

fn validate_slot(date: &str, time: &str, errors: &mut ValidationErrors) {
	if date.trim().is_empty() {
		errors.add("date", "Please select an appointment date");
	} else {
		match parse_date(date) {
			Ok(day) if day.weekday() == Weekday::Sunday =>
				errors.add("date", "Appointments are not available on Sundays"),
			Ok(_) => {},
			Err(_) => errors.add("date", "Please select a valid date"),
		}
	}

	if time.trim().is_empty() {
		errors.add("time", "Please select an appointment time");
	} else {
		match parse_time(time) {
			Ok(at) if at.hour() == LUNCH_HOUR => errors.add(
				"time",
				"Appointments are not available during lunch break (1 PM to 2 PM)",
			),
			Ok(_) => {},
			Err(_) => errors.add("time", "Please select a valid time"),
		}
	}
}
