use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub funding_api_url: String,
    pub poll_interval: Duration,
    pub countdown_tick: Duration,
    pub params_refresh_interval: Duration,
    pub params_max_age: Duration,
    pub http_timeout: Duration,
    pub monitor_retention: Duration,
    pub monitor_prune_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let funding_api_url = env_map
            .get("FUNDING_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("FUNDING_API_URL".to_string()))?;
        if !funding_api_url.starts_with("http://") && !funding_api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "FUNDING_API_URL".to_string(),
                format!("must be an http(s) URL, got {}", funding_api_url),
            ));
        }

        let poll_interval = Duration::from_secs(positive_u64(&env_map, "POLL_INTERVAL_SECS", 10)?);
        let countdown_tick = Duration::from_millis(positive_u64(&env_map, "COUNTDOWN_TICK_MS", 1000)?);
        let params_refresh_interval =
            Duration::from_secs(positive_u64(&env_map, "PARAMS_REFRESH_SECS", 60)?);
        let params_max_age = Duration::from_secs(positive_u64(&env_map, "PARAMS_MAX_AGE_SECS", 300)?);
        let http_timeout = Duration::from_secs(positive_u64(&env_map, "HTTP_TIMEOUT_SECS", 15)?);
        let monitor_retention =
            Duration::from_secs(positive_u64(&env_map, "MONITOR_RETENTION_SECS", 600)?);
        let monitor_prune_interval =
            Duration::from_secs(positive_u64(&env_map, "MONITOR_PRUNE_SECS", 60)?);

        Ok(Config {
            port,
            database_path,
            funding_api_url,
            poll_interval,
            countdown_tick,
            params_refresh_interval,
            params_max_age,
            http_timeout,
            monitor_retention,
            monitor_prune_interval,
        })
    }
}

/// Reads a strictly positive integer, falling back to `default` when unset.
fn positive_u64(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(v) => Ok(v),
        Err(_) => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be a valid u64".to_string(),
        )),
    }
}
