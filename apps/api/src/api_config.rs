use std::env;

use audex_core::AppError;

/// Runtime configuration for the API binary, collected from the process
/// environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Apply migrations and exit without serving.
    pub migrate_only: bool,
    /// Postgres connection string.
    pub database_url: String,
    /// Bind host.
    pub api_host: String,
    /// Bind port.
    pub api_port: u16,
}

impl ApiConfig {
    /// Loads configuration, failing on missing required variables.
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        Ok(Self {
            migrate_only,
            database_url,
            api_host,
            api_port,
        })
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} must be set")))
}
