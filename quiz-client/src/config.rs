//! Client configuration

use std::time::Duration;

use reqwest::Url;

use crate::{ClientError, ClientResult};

/// Reconnect schedule: exponential backoff with a ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Give up after this many consecutive failures (`None` = never)
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Whether another retry is allowed after `attempt` failures
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            max_attempts: Some(10),
        }
    }
}

/// Client configuration for connecting to the quiz server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:3001")
    pub base_url: String,

    /// Stable subscriber id, reused across reconnects
    pub client_id: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Reconnect schedule for the live channel
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            timeout: 30,
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Load from `QUIZ_SERVER_URL` / `QUIZ_CLIENT_ID`
    ///
    /// Without `QUIZ_CLIENT_ID` a random id is generated; it stays fixed for
    /// the lifetime of this config.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("QUIZ_SERVER_URL").unwrap_or_else(|_| "http://localhost:3001".into());
        let client_id = std::env::var("QUIZ_CLIENT_ID")
            .ok()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_client_id);
        Self::new(base_url, client_id)
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the reconnect schedule
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Live channel URL: `ws(s)://host/ws?clientId=<id>`
    pub fn ws_url(&self) -> ClientResult<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(ClientError::InvalidUrl(format!("unsupported scheme {}", other))),
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?;
        url.set_path("/ws");
        url.query_pairs_mut()
            .clear()
            .append_pair("clientId", &self.client_id);

        Ok(url.to_string())
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> ClientResult<super::HttpClient> {
        super::HttpClient::new(self)
    }
}

/// Random client id for first-time subscribers
pub fn generate_client_id() -> String {
    format!("client-{}", uuid::Uuid::new_v4())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3001", generate_client_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(5000));
        assert_eq!(policy.delay_for(100), Duration::from_millis(5000));

        assert!(policy.allows(10));
        assert!(!policy.allows(11));
    }

    #[test]
    fn test_ws_url() {
        let config = ClientConfig::new("http://localhost:3001", "client 1");
        assert_eq!(config.ws_url().unwrap(), "ws://localhost:3001/ws?clientId=client+1");

        let config = ClientConfig::new("https://quiz.example.com/", "c1");
        assert_eq!(config.ws_url().unwrap(), "wss://quiz.example.com/ws?clientId=c1");

        let config = ClientConfig::new("ftp://nope", "c1");
        assert!(matches!(config.ws_url(), Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_client_id(), generate_client_id());
    }
}
