use crate::error::{AppError, Result};
use crate::notification::{FeedCache, NotificationRepository, NotificationService};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use validator::Validate;

const DEVELOPMENT_CABLE_URL: &str = "ws://localhost:3000/cable";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credential_tx: Arc<watch::Sender<Option<String>>>,
    pub feed_cache: FeedCache,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let (credential_tx, credential_rx) = watch::channel(config.auth_token.clone());

        let feed_cache = FeedCache::new();
        let repository = NotificationRepository::new(&config.api_base_url, credential_rx)?;
        let notification_service = NotificationService::new(repository, feed_cache.clone());

        Ok(Self {
            config,
            credential_tx: Arc::new(credential_tx),
            feed_cache,
            notification_service,
        })
    }

    pub fn credentials(&self) -> watch::Receiver<Option<String>> {
        self.credential_tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(AppError::Config(format!("unknown APP_ENV '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct Config {
    #[validate(url)]
    pub api_base_url: String,
    pub environment: Environment,
    /// Host serving `/cable` in production. Falls back to the API host.
    pub cable_host: Option<String>,
    pub auth_token: Option<String>,
    #[validate(range(min = 1))]
    pub reconnect_delay_secs: u64,
    pub refetch_schedule: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            api_base_url: non_empty("API_BASE_URL")
                .ok_or_else(|| AppError::Config("API_BASE_URL must be set".to_string()))?,
            environment: non_empty("APP_ENV")
                .unwrap_or_else(|| "development".to_string())
                .parse()?,
            cable_host: non_empty("CABLE_HOST"),
            auth_token: non_empty("AUTH_TOKEN"),
            reconnect_delay_secs: non_empty("RECONNECT_DELAY_SECS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Config("RECONNECT_DELAY_SECS must be a number".to_string())
                })?,
            refetch_schedule: non_empty("REFETCH_SCHEDULE")
                .unwrap_or_else(|| "*/30 * * * * *".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Builds the cable endpoint for `token`, e.g. `wss://host/cable?token=...`.
    pub fn cable_url(&self, token: &str) -> Result<Url> {
        let base = match self.environment {
            Environment::Development => DEVELOPMENT_CABLE_URL.to_string(),
            Environment::Production => format!("wss://{}/cable", self.production_cable_host()?),
        };

        let mut url = Url::parse(&base)
            .map_err(|e| AppError::Config(format!("invalid cable url '{}': {}", base, e)))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }

    fn production_cable_host(&self) -> Result<String> {
        if let Some(host) = &self.cable_host {
            return Ok(host.clone());
        }

        let api = Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Config(format!("invalid API_BASE_URL: {}", e)))?;
        let host = api
            .host_str()
            .ok_or_else(|| AppError::Config("API_BASE_URL has no host".to_string()))?;

        Ok(match api.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("API_BASE_URL", "http://localhost:3000")]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.refetch_schedule, "*/30 * * * * *");
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_missing_api_base_url_is_rejected() {
        assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("API_BASE_URL", "not a url")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            config_from(&[("API_BASE_URL", "http://api.test"), ("RECONNECT_DELAY_SECS", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            config_from(&[("API_BASE_URL", "http://api.test"), ("APP_ENV", "staging")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_development_cable_url() {
        let config = config_from(&[("API_BASE_URL", "http://localhost:3000")]).unwrap();
        let url = config.cable_url("abc 123").unwrap();

        assert_eq!(url.as_str(), "ws://localhost:3000/cable?token=abc+123");
    }

    #[test]
    fn test_production_cable_url_uses_api_host() {
        let config = config_from(&[
            ("API_BASE_URL", "https://goals.example.com/"),
            ("APP_ENV", "production"),
        ])
        .unwrap();

        assert_eq!(
            config.cable_url("tok").unwrap().as_str(),
            "wss://goals.example.com/cable?token=tok"
        );
    }

    #[test]
    fn test_production_cable_url_prefers_cable_host() {
        let config = config_from(&[
            ("API_BASE_URL", "https://api.example.com"),
            ("APP_ENV", "production"),
            ("CABLE_HOST", "cable.example.com:8443"),
        ])
        .unwrap();

        assert_eq!(
            config.cable_url("tok").unwrap().as_str(),
            "wss://cable.example.com:8443/cable?token=tok"
        );
    }
}
