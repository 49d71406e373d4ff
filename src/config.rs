use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "CUSTOM_KEY";
pub const DEFAULT_DOMAIN: &str = "https://my-organization.codeocean.com";
pub const MIN_POLLING_INTERVAL: u64 = 5;

#[derive(Clone, Debug)]
pub struct Config {
    pub domain: Url,
    pub token: String,
    pub polling_interval: Duration,
    /// `None` waits for readiness indefinitely.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(domain: &str, token: Option<String>) -> Result<Self, ConfigError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken(TOKEN_ENV))?;

        let invalid = |reason: String| ConfigError::InvalidDomain {
            domain: domain.to_string(),
            reason,
        };
        let domain = Url::parse(domain).map_err(|e| invalid(e.to_string()))?;
        if !matches!(domain.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", domain.scheme())));
        }
        if domain.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        Ok(Self {
            domain,
            token,
            polling_interval: Duration::from_secs(MIN_POLLING_INTERVAL),
            timeout: None,
        })
    }

    pub fn with_polling_interval(mut self, seconds: u64) -> Result<Self, ConfigError> {
        if seconds < MIN_POLLING_INTERVAL {
            return Err(ConfigError::PollingInterval {
                min: MIN_POLLING_INTERVAL,
                got: seconds,
            });
        }
        self.polling_interval = Duration::from_secs(seconds);
        Ok(self)
    }

    pub fn with_timeout(mut self, seconds: Option<u64>) -> Self {
        self.timeout = seconds.map(Duration::from_secs);
        self
    }
}
