//! Static department, doctor, and time-slot catalog offered to the booking form.
//!
//! The backend remains authoritative; the catalog only drives pickers and pre-checks.

/// Departments accepting appointments, in display order.
pub const DEPARTMENTS: [&str; 14] = [
	"General Medicine",
	"Pediatrics",
	"Gynecology/Obstetrics (OB/GYN)",
	"Cardiology",
	"Orthopedics",
	"Dermatology",
	"ENT",
	"Neurology",
	"Psychiatry/Mental Health",
	"Ophthalmology",
	"Gastroenterology",
	"Pulmonology",
	"Oncology",
	"Urology",
];

const DOCTORS: [(&str, &[&str]); 14] = [
	("General Medicine", &["Dr. Smith", "Dr. Johnson", "Dr. Brown"]),
	("Pediatrics", &["Dr. Anderson", "Dr. Martinez"]),
	("Gynecology/Obstetrics (OB/GYN)", &["Dr. Lee", "Dr. Taylor"]),
	("Cardiology", &["Dr. Wilson", "Dr. Davis", "Dr. Brown"]),
	("Orthopedics", &["Dr. Thomas", "Dr. Moore"]),
	("Dermatology", &["Dr. Martin", "Dr. White"]),
	("ENT", &["Dr. Clark", "Dr. Wright"]),
	("Neurology", &["Dr. Harris", "Dr. Garcia"]),
	("Psychiatry/Mental Health", &["Dr. Martinez", "Dr. Robinson"]),
	("Ophthalmology", &["Dr. Rodriguez", "Dr. Lewis"]),
	("Gastroenterology", &["Dr. Walker", "Dr. Hall"]),
	("Pulmonology", &["Dr. Allen", "Dr. Young"]),
	("Oncology", &["Dr. Hernandez", "Dr. King"]),
	("Urology", &["Dr. Scott", "Dr. Green"]),
];

/// Half-hour slots offered for booking; 13:00-14:00 is the lunch break.
pub const TIME_SLOTS: [&str; 16] = [
	"09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30", "14:00", "14:30",
	"15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
];

/// Hour of day during which no appointments are taken.
pub const LUNCH_HOUR: u8 = 13;

/// Doctors practicing in `department`; empty for unknown departments.
pub fn doctors_for(department: &str) -> &'static [&'static str] {
	DOCTORS.iter().find(|(name, _)| *name == department).map(|(_, doctors)| *doctors).unwrap_or(&[])
}

/// Returns `true` when `department` is listed in [`DEPARTMENTS`].
pub fn is_known_department(department: &str) -> bool {
	DEPARTMENTS.contains(&department)
}
