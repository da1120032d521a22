use crate::configuration::Configuration;
use clap::Parser;
use tracing::{debug, info};

/// Command line flags, each of which can also be set through the environment or `.env`.
#[derive(Debug, Clone, Parser)]
#[command(name = "neuro_care", about = "Booking backend for the Neuro Care appointment site")]
pub struct ConfigurationHandler {
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// PostgreSQL connection URL. Without it bookings are kept in memory only.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Lifetime of issued access tokens, at most ten years.
    #[arg(long, env = "TOKEN_VALIDITY_DAYS", default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..=3650))]
    token_validity_days: i64,

    /// Insert example appointment options into the database on startup.
    #[arg(long, env = "SEED_EXAMPLES")]
    seed_examples: bool,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => info!(path = %path.display(), "Loaded environment file"),
            Err(err) => debug!(?err, "No environment file loaded"),
        }
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone()
    }

    fn access_token(&self) -> String {
        self.access_token.clone()
    }

    fn token_validity_days(&self) -> i64 {
        self.token_validity_days
    }

    fn seed_examples(&self) -> bool {
        self.seed_examples
    }
}
