use std::time::Duration;

use crate::{
    auth::TokenIssuer,
    backend::{insert_example_appointment_options, BookingBackend},
    configuration::Configuration,
    configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface,
    http::create_app,
    local_store::LocalStore,
};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod auth;
mod availability;
mod backend;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_store;
mod schema;
#[cfg(test)]
mod testutils;
mod types;

#[derive(Clone)]
struct AppState<B: BookingBackend> {
    backend: B,
    tokens: TokenIssuer,
}

fn seed<B: BookingBackend>(backend: &B) {
    if let Err(err) = insert_example_appointment_options(backend) {
        error!(?err, "Failed to seed example appointment options");
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let configuration = ConfigurationHandler::parse_arguments();

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "Neuro Care Server Running");

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            let url = database_url.clone();
            match tokio::task::spawn_blocking(move || DatabaseInterface::new(&url)).await {
                Ok(Ok(backend)) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Ok(Err(err)) => {
                    error!(?err, "Failed to establish database connection. Retry in 1 sec.");
                    sleep(Duration::from_secs(1)).await;
                }
                Err(err) => {
                    error!(?err, "Database connection task failed. Retry in 1 sec.");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        if configuration.seed_examples() {
            seed(&backend);
        }
        create_app(backend, configuration)
    } else {
        warn!("No database configured, bookings are kept in memory only");
        let backend = LocalStore::default();
        seed(&backend);
        create_app(backend, configuration)
    };

    axum::serve(listener, app).await
}
