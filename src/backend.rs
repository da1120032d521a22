use crate::types::{AppointmentOption, Booking, User};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("no database connection available: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("store unavailable: {0}")]
    Unavailable(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Uuid),
    /// A booking with the same email, date and treatment already exists.
    Duplicate,
}

pub trait BookingBackend: Clone + Send + Sync + 'static {
    fn appointment_options(&self) -> Result<Vec<AppointmentOption>, BackendError>;

    /// Options with the slots booked on `date` removed, computed by the store itself.
    fn available_options(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AppointmentOption>, BackendError>;

    /// Returns false if an option with the same name already exists.
    fn add_appointment_option(&self, option: AppointmentOption) -> Result<bool, BackendError>;

    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BackendError>;
    fn bookings_for(&self, email: &str) -> Result<Vec<Booking>, BackendError>;

    /// Inserts atomically with respect to the (email, date, treatment) uniqueness.
    fn insert_booking(&self, booking: Booking) -> Result<InsertOutcome, BackendError>;

    fn find_user(&self, email: &str) -> Result<Option<User>, BackendError>;
    fn insert_user(&self, user: User) -> Result<(), BackendError>;
}

pub fn example_appointment_options() -> Vec<AppointmentOption> {
    const SLOTS: [&str; 6] = [
        "08.00 AM - 08.30 AM",
        "08.30 AM - 09.00 AM",
        "09.00 AM - 09.30 AM",
        "10.00 AM - 10.30 AM",
        "02.00 PM - 02.30 PM",
        "03.00 PM - 03.30 PM",
    ];

    [
        "Neurological Consultation",
        "Electroencephalography",
        "Nerve Conduction Study",
        "Headache Clinic",
        "Sleep Disorder Assessment",
        "Memory Assessment",
    ]
    .into_iter()
    .map(|name| AppointmentOption::new(name, &SLOTS))
    .collect()
}

/// Seeds the example options, skipping names that already exist.
pub fn insert_example_appointment_options<B: BookingBackend>(
    backend: &B,
) -> Result<usize, BackendError> {
    let mut inserted = 0;
    for option in example_appointment_options() {
        if backend.add_appointment_option(option)? {
            inserted += 1;
        }
    }
    info!(inserted, "Seeded example appointment options");
    Ok(inserted)
}
