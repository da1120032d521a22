use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use chrono::NaiveDate;
use tokio::{net::TcpListener, task::JoinHandle};

use crate::{
    backend::{BackendError, BookingBackend, InsertOutcome},
    configuration::Configuration,
    http::create_app,
    local_store::LocalStore,
    types::{AppointmentOption, Booking, User},
};

pub const TEST_SECRET: &str = "test-secret";

#[derive(Clone)]
pub struct TestConfiguration;

impl Configuration for TestConfiguration {
    fn port(&self) -> u16 {
        0
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn access_token(&self) -> String {
        TEST_SECRET.into()
    }

    fn token_validity_days(&self) -> i64 {
        30
    }

    fn seed_examples(&self) -> bool {
        false
    }
}

/// Serves the app on an ephemeral port and returns its base url.
pub async fn serve<B: BookingBackend>(backend: B) -> (JoinHandle<()>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let app = create_app(backend, TestConfiguration);
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (server, address)
}

pub struct MockBookingBackendInner {
    pub success: AtomicBool,
    pub calls_to_appointment_options: AtomicU64,
    pub calls_to_available_options: AtomicU64,
    pub calls_to_add_appointment_option: AtomicU64,
    pub calls_to_bookings_on: AtomicU64,
    pub calls_to_bookings_for: AtomicU64,
    pub calls_to_insert_booking: AtomicU64,
    pub calls_to_find_user: AtomicU64,
    pub calls_to_insert_user: AtomicU64,
    pub store: LocalStore,
}

/// Counts every backend call and fails all of them while `success` is false.
#[derive(Clone)]
pub struct MockBookingBackend(pub Arc<MockBookingBackendInner>);

impl MockBookingBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            calls_to_appointment_options: AtomicU64::default(),
            calls_to_available_options: AtomicU64::default(),
            calls_to_add_appointment_option: AtomicU64::default(),
            calls_to_bookings_on: AtomicU64::default(),
            calls_to_bookings_for: AtomicU64::default(),
            calls_to_insert_booking: AtomicU64::default(),
            calls_to_find_user: AtomicU64::default(),
            calls_to_insert_user: AtomicU64::default(),
            store: LocalStore::default(),
        }
    }
}

impl MockBookingBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBookingBackendInner::new()))
    }

    pub fn total_calls(&self) -> u64 {
        [
            &self.0.calls_to_appointment_options,
            &self.0.calls_to_available_options,
            &self.0.calls_to_add_appointment_option,
            &self.0.calls_to_bookings_on,
            &self.0.calls_to_bookings_for,
            &self.0.calls_to_insert_booking,
            &self.0.calls_to_find_user,
            &self.0.calls_to_insert_user,
        ]
        .iter()
        .map(|calls| calls.load(Ordering::SeqCst))
        .sum()
    }

    fn result(&self, calls: &AtomicU64) -> Result<(), BackendError> {
        calls.fetch_add(1, Ordering::SeqCst);
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(BackendError::Unavailable("supposed to fail")),
        }
    }
}

impl BookingBackend for MockBookingBackend {
    fn appointment_options(&self) -> Result<Vec<AppointmentOption>, BackendError> {
        self.result(&self.0.calls_to_appointment_options)?;
        self.0.store.appointment_options()
    }

    fn available_options(
        &self,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AppointmentOption>, BackendError> {
        self.result(&self.0.calls_to_available_options)?;
        self.0.store.available_options(date)
    }

    fn add_appointment_option(&self, option: AppointmentOption) -> Result<bool, BackendError> {
        self.result(&self.0.calls_to_add_appointment_option)?;
        self.0.store.add_appointment_option(option)
    }

    fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BackendError> {
        self.result(&self.0.calls_to_bookings_on)?;
        self.0.store.bookings_on(date)
    }

    fn bookings_for(&self, email: &str) -> Result<Vec<Booking>, BackendError> {
        self.result(&self.0.calls_to_bookings_for)?;
        self.0.store.bookings_for(email)
    }

    fn insert_booking(&self, booking: Booking) -> Result<InsertOutcome, BackendError> {
        self.result(&self.0.calls_to_insert_booking)?;
        self.0.store.insert_booking(booking)
    }

    fn find_user(&self, email: &str) -> Result<Option<User>, BackendError> {
        self.result(&self.0.calls_to_find_user)?;
        self.0.store.find_user(email)
    }

    fn insert_user(&self, user: User) -> Result<(), BackendError> {
        self.result(&self.0.calls_to_insert_user)?;
        self.0.store.insert_user(user)
    }
}
