use crate::backend::{BackendError, BookingBackend, InsertOutcome};
use crate::schema::{appointment_options, bookings, users};
use crate::types::{AppointmentOption, Booking, User};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Date, Nullable};
use std::time::Duration;
use tracing::debug;

const BOOKING_UNIQUE_CONSTRAINT: &str = "bookings_email_date_treatment_key";
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(1);

/// Slots are matched against bookings of the same treatment on exactly `$1`.
/// Grouping by slot drops duplicates while keeping the first position.
const AVAILABLE_OPTIONS_QUERY: &str = "\
    SELECT o.id, o.name, ARRAY(\
        SELECT s.slot FROM unnest(o.slots) WITH ORDINALITY AS s(slot, ordinal) \
        WHERE NOT EXISTS (\
            SELECT 1 FROM bookings b \
            WHERE b.treatment = o.name AND b.appointment_date = $1 AND b.slot = s.slot\
        ) \
        GROUP BY s.slot ORDER BY min(s.ordinal)\
    ) AS slots \
    FROM appointment_options o \
    ORDER BY o.position";

type PgPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct DatabaseInterface {
    pool: PgPool,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, BackendError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)?;
        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, BackendError> {
        Ok(self.pool.get()?)
    }

    #[cfg(test)]
    fn remove_all(&self) -> Result<(), BackendError> {
        let mut connection = self.connection()?;
        diesel::delete(bookings::table).execute(&mut connection)?;
        diesel::delete(users::table).execute(&mut connection)?;
        diesel::delete(appointment_options::table).execute(&mut connection)?;
        Ok(())
    }
}

impl BookingBackend for DatabaseInterface {
    fn appointment_options(&self) -> Result<Vec<AppointmentOption>, BackendError> {
        let mut connection = self.connection()?;
        Ok(appointment_options::table
            .order(appointment_options::position)
            .select(AppointmentOption::as_select())
            .load(&mut connection)?)
    }

    fn available_options(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AppointmentOption>, BackendError> {
        let mut connection = self.connection()?;
        Ok(diesel::sql_query(AVAILABLE_OPTIONS_QUERY)
            .bind::<Nullable<Date>, _>(date)
            .load::<AppointmentOption>(&mut connection)?)
    }

    fn add_appointment_option(&self, option: AppointmentOption) -> Result<bool, BackendError> {
        let mut connection = self.connection()?;
        let inserted = diesel::insert_into(appointment_options::table)
            .values(&option)
            .on_conflict(appointment_options::name)
            .do_nothing()
            .execute(&mut connection)?;
        Ok(inserted == 1)
    }

    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BackendError> {
        let mut connection = self.connection()?;
        Ok(bookings::table
            .filter(bookings::appointment_date.eq(date))
            .order(bookings::created_at)
            .select(Booking::as_select())
            .load(&mut connection)?)
    }

    fn bookings_for(&self, email: &str) -> Result<Vec<Booking>, BackendError> {
        let mut connection = self.connection()?;
        Ok(bookings::table
            .filter(bookings::email.eq(email))
            .order(bookings::created_at)
            .select(Booking::as_select())
            .load(&mut connection)?)
    }

    fn insert_booking(&self, booking: Booking) -> Result<InsertOutcome, BackendError> {
        let mut connection = self.connection()?;
        let result = diesel::insert_into(bookings::table)
            .values(&booking)
            .execute(&mut connection);

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(booking.id)),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
                if info.constraint_name() == Some(BOOKING_UNIQUE_CONSTRAINT) =>
            {
                debug!(email = %booking.email, "Booking already exists");
                Ok(InsertOutcome::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_user(&self, email: &str) -> Result<Option<User>, BackendError> {
        let mut connection = self.connection()?;
        Ok(users::table
            .filter(users::email.eq(email))
            .order(users::created_at)
            .select(User::as_select())
            .first(&mut connection)
            .optional()?)
    }

    fn insert_user(&self, user: User) -> Result<(), BackendError> {
        let mut connection = self.connection()?;
        diesel::insert_into(users::table)
            .values(&user)
            .execute(&mut connection)?;
        Ok(())
    }
}
