use crate::types::{AppointmentOption, Booking};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Removes from every option the slots booked for its treatment on `date`.
///
/// Options keep their order, slots keep their order and duplicates collapse to the
/// first occurrence. Without a date no booking matches and only the deduplication
/// applies.
pub fn remaining_slots(
    options: Vec<AppointmentOption>,
    bookings: &[Booking],
    date: Option<NaiveDate>,
) -> Vec<AppointmentOption> {
    options
        .into_iter()
        .map(|mut option| {
            let booked: HashSet<&str> = bookings
                .iter()
                .filter(|booking| {
                    booking.treatment == option.name && Some(booking.appointment_date) == date
                })
                .map(|booking| booking.slot.as_str())
                .collect();

            let mut seen = HashSet::new();
            option
                .slots
                .retain(|slot| !booked.contains(slot.as_str()) && seen.insert(slot.clone()));
            option
        })
        .collect()
}
