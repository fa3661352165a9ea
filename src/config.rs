use url::Url;

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5002";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration, environment-driven.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Base URL of the benchmark server.
    pub base_url: String,
    /// Per-request timeout for REST calls. The streaming feed is not
    /// subject to it.
    pub timeout_secs: u64,
}

impl BenchConfig {
    /// Load configuration from the environment (`BENCHWATCH_BASE_URL`,
    /// `BENCHWATCH_TIMEOUT_SECS`). A `.env` file is honored when present.
    pub fn from_env() -> Result<BenchConfig, AppError> {
        let _ = dotenvy::dotenv(); // a missing .env file is not an error

        let base_url = std::env::var("BENCHWATCH_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match std::env::var("BENCHWATCH_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                AppError::Validation(format!(
                    "BENCHWATCH_TIMEOUT_SECS must be an integer, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        BenchConfig::validated(base_url, timeout_secs)
    }

    /// Validate and construct a configuration.
    pub fn validated(base_url: String, timeout_secs: u64) -> Result<BenchConfig, AppError> {
        Url::parse(&base_url).map_err(|e| {
            AppError::Validation(format!("invalid base URL '{base_url}': {e}"))
        })?;
        if timeout_secs == 0 {
            return Err(AppError::Validation(
                "request timeout must be at least 1 second".into(),
            ));
        }
        Ok(BenchConfig { base_url, timeout_secs })
    }
}
