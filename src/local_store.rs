use crate::{
    availability::remaining_slots,
    backend::{BackendError, BookingBackend, InsertOutcome},
    types::{AppointmentOption, Booking, User},
};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Non-persistent store used when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    collections: Arc<Mutex<Collections>>,
}

#[derive(Debug, Default)]
struct Collections {
    appointment_options: Vec<AppointmentOption>,
    bookings: Vec<Booking>,
    users: Vec<User>,
}

impl LocalStore {
    fn collections(&self) -> Result<MutexGuard<'_, Collections>, BackendError> {
        self.collections
            .lock()
            .map_err(|_| BackendError::Unavailable("local store lock poisoned"))
    }
}

impl BookingBackend for LocalStore {
    fn appointment_options(&self) -> Result<Vec<AppointmentOption>, BackendError> {
        Ok(self.collections()?.appointment_options.clone())
    }

    fn available_options(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AppointmentOption>, BackendError> {
        let collections = self.collections()?;
        Ok(remaining_slots(
            collections.appointment_options.clone(),
            &collections.bookings,
            date,
        ))
    }

    fn add_appointment_option(&self, option: AppointmentOption) -> Result<bool, BackendError> {
        let mut collections = self.collections()?;
        if collections
            .appointment_options
            .iter()
            .any(|existing| existing.name == option.name)
        {
            return Ok(false);
        }
        collections.appointment_options.push(option);
        Ok(true)
    }

    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BackendError> {
        Ok(self
            .collections()?
            .bookings
            .iter()
            .filter(|booking| booking.appointment_date == date)
            .cloned()
            .collect())
    }

    fn bookings_for(&self, email: &str) -> Result<Vec<Booking>, BackendError> {
        Ok(self
            .collections()?
            .bookings
            .iter()
            .filter(|booking| booking.email == email)
            .cloned()
            .collect())
    }

    fn insert_booking(&self, booking: Booking) -> Result<InsertOutcome, BackendError> {
        let mut collections = self.collections()?;
        let duplicate = collections.bookings.iter().any(|existing| {
            existing.email == booking.email
                && existing.appointment_date == booking.appointment_date
                && existing.treatment == booking.treatment
        });
        if duplicate {
            debug!(email = %booking.email, "Booking already exists");
            return Ok(InsertOutcome::Duplicate);
        }

        let id = booking.id;
        collections.bookings.push(booking);
        Ok(InsertOutcome::Inserted(id))
    }

    fn find_user(&self, email: &str) -> Result<Option<User>, BackendError> {
        Ok(self
            .collections()?
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    fn insert_user(&self, user: User) -> Result<(), BackendError> {
        self.collections()?.users.push(user);
        Ok(())
    }
}
