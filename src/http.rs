use crate::auth::{verify_jwt, Claims, TokenIssuer};
use crate::availability::remaining_slots;
use crate::backend::{BackendError, BookingBackend, InsertOutcome};
use crate::configuration::Configuration;
use crate::error::AppError;
use crate::types::{
    normalize_email, Acknowledgement, AppointmentOption, Booking, NewBooking, NewUser,
};
use crate::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::middleware;
use axum::{http::StatusCode, Extension, Json};
use axum::{
    routing::{get, post},
    Router,
};
use axum_valid::{Valid, ValidRejection};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AvailabilityQuery {
    date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct EmailQuery {
    #[validate(email)]
    email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessToken {
    access_token: String,
}

const DEFAULT_TOKEN_VALIDITY_DAYS: i64 = 30;

pub fn create_app<B: BookingBackend, C: Configuration>(backend: B, configuration: C) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let days = configuration.token_validity_days();
    let validity = Duration::try_days(days).unwrap_or_else(|| {
        warn!(days, fallback = DEFAULT_TOKEN_VALIDITY_DAYS, "Token validity out of range");
        Duration::days(DEFAULT_TOKEN_VALIDITY_DAYS)
    });
    let tokens = TokenIssuer::new(&configuration.access_token(), validity);
    let state = AppState {
        backend,
        tokens: tokens.clone(),
    };

    // The gate only wraps GET, posting a booking needs no token.
    let bookings = get(get_bookings::<B>)
        .route_layer(middleware::from_fn_with_state(tokens, verify_jwt))
        .post(create_booking::<B>);

    Router::new()
        .route("/", get(get_status))
        .route("/appointmentOptions", get(get_appointment_options::<B>))
        .route("/v2/appointmentOptions", get(get_available_options::<B>))
        .route("/bookings", bookings)
        .route("/jwt", get(issue_jwt::<B>))
        .route("/users", post(create_user::<B>))
        .with_state(state)
        .layer(cors)
}

/// Runs a backend call on the blocking thread pool.
async fn run_backend<B, T, F>(backend: &B, operation: F) -> Result<T, AppError>
where
    B: BookingBackend,
    T: Send + 'static,
    F: FnOnce(B) -> Result<T, BackendError> + Send + 'static,
{
    let backend = backend.clone();
    let result = tokio::task::spawn_blocking(move || operation(backend))
        .await
        .map_err(|err| AppError::Internal(format!("backend task failed: {err}")))?;
    Ok(result?)
}

async fn get_status() -> &'static str {
    "Neuro Care Server Running"
}

async fn get_appointment_options<B: BookingBackend>(
    State(state): State<AppState<B>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<Vec<AppointmentOption>>, AppError> {
    let Query(query) = query?;
    let date = query.date;
    let (options, booked) = run_backend(&state.backend, move |backend| {
        let options = backend.appointment_options()?;
        let booked = match date {
            Some(date) => backend.bookings_on(date)?,
            None => vec![],
        };
        Ok((options, booked))
    })
    .await?;

    Ok(Json(remaining_slots(options, &booked, date)))
}

async fn get_available_options<B: BookingBackend>(
    State(state): State<AppState<B>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<Vec<AppointmentOption>>, AppError> {
    let Query(query) = query?;
    let options = run_backend(&state.backend, move |backend| {
        backend.available_options(query.date)
    })
    .await?;
    Ok(Json(options))
}

async fn get_bookings<B: BookingBackend>(
    State(state): State<AppState<B>>,
    Extension(claims): Extension<Claims>,
    query: Result<Valid<Query<EmailQuery>>, ValidRejection<QueryRejection>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let Valid(Query(query)) = query?;
    let email = normalize_email(&query.email);
    if normalize_email(&claims.email) != email {
        warn!(
            subject = %claims.email,
            requested = %email,
            "Token does not belong to the requested email"
        );
        return Err(AppError::Forbidden);
    }

    let bookings = run_backend(&state.backend, move |backend| {
        backend.bookings_for(&email)
    })
    .await?;
    Ok(Json(bookings))
}

async fn create_booking<B: BookingBackend>(
    State(state): State<AppState<B>>,
    booking: Result<Valid<Json<NewBooking>>, ValidRejection<JsonRejection>>,
) -> Result<Json<Acknowledgement>, AppError> {
    let Valid(Json(booking)) = booking?;
    let booking = booking.into_booking();
    let appointment_date = booking.appointment_date;
    let treatment = booking.treatment.clone();

    let outcome = run_backend(&state.backend, move |backend| {
        backend.insert_booking(booking)
    })
    .await?;

    match outcome {
        InsertOutcome::Inserted(id) => {
            info!(%id, %appointment_date, %treatment, "Booking created");
            Ok(Json(Acknowledgement::inserted(id)))
        }
        InsertOutcome::Duplicate => {
            info!(%appointment_date, %treatment, "Duplicate booking refused");
            Ok(Json(Acknowledgement::rejected(format!(
                "You already have a booking on {appointment_date}"
            ))))
        }
    }
}

async fn issue_jwt<B: BookingBackend>(
    State(state): State<AppState<B>>,
    query: Result<Valid<Query<EmailQuery>>, ValidRejection<QueryRejection>>,
) -> Result<(StatusCode, Json<AccessToken>), AppError> {
    let Valid(Query(query)) = query?;
    let email = normalize_email(&query.email);
    let lookup = email.clone();
    let user = run_backend(&state.backend, move |backend| backend.find_user(&lookup)).await?;

    if user.is_none() {
        warn!(%email, "Token requested for unknown user");
        return Ok((
            StatusCode::FORBIDDEN,
            Json(AccessToken {
                access_token: String::new(),
            }),
        ));
    }

    let access_token = state
        .tokens
        .issue(&email)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    info!(%email, "Access token issued");
    Ok((StatusCode::OK, Json(AccessToken { access_token })))
}

async fn create_user<B: BookingBackend>(
    State(state): State<AppState<B>>,
    user: Result<Valid<Json<NewUser>>, ValidRejection<JsonRejection>>,
) -> Result<Json<Acknowledgement>, AppError> {
    let Valid(Json(user)) = user?;
    let user = user.into_user();
    let id = user.id;
    run_backend(&state.backend, move |backend| backend.insert_user(user)).await?;

    info!(%id, "User registered");
    Ok(Json(Acknowledgement::inserted(id)))
}
