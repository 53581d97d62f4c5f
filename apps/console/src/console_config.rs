use std::env;
use std::str::FromStr;
use std::time::Duration;

use linc_core::AppError;
use linc_domain::UserId;
use linc_infrastructure::LincApiClientConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_token: String,
    pub http_timeout_ms: u64,
    pub http_max_attempts: u8,
    pub http_retry_backoff_ms: u64,
    pub review_user_id: UserId,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("LINC_API_BASE_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let api_token = required_non_empty(&lookup, "LINC_API_TOKEN")?;

        let http_timeout_ms = parse_or(&lookup, "LINC_HTTP_TIMEOUT_MS", 15_000_u64)?;
        if http_timeout_ms == 0 {
            return Err(AppError::Validation(
                "LINC_HTTP_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        let http_max_attempts = parse_or(&lookup, "LINC_HTTP_MAX_ATTEMPTS", 3_u8)?;
        if http_max_attempts == 0 {
            return Err(AppError::Validation(
                "LINC_HTTP_MAX_ATTEMPTS must be greater than zero".to_owned(),
            ));
        }

        let http_retry_backoff_ms = parse_or(&lookup, "LINC_HTTP_RETRY_BACKOFF_MS", 250_u64)?;
        let review_user_id = required_non_empty(&lookup, "LINC_REVIEW_USER_ID")?;
        let review_user_id = UserId::from_str(review_user_id.trim()).map_err(|error| {
            AppError::Validation(format!("invalid LINC_REVIEW_USER_ID: {error}"))
        })?;

        Ok(Self {
            api_base_url,
            api_token,
            http_timeout_ms,
            http_max_attempts,
            http_retry_backoff_ms,
            review_user_id,
        })
    }

    pub fn api_client(&self) -> Result<LincApiClientConfig, AppError> {
        LincApiClientConfig::new(
            self.api_base_url.as_str(),
            self.api_token.as_str(),
            Duration::from_millis(self.http_timeout_ms),
            self.http_max_attempts,
            self.http_retry_backoff_ms,
        )
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
