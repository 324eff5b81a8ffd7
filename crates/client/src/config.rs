use std::time::Duration;

/// REST client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_url: String,
    /// Bearer token sent on every request, if any.
    pub api_token: Option<String>,
    /// Per-request timeout in seconds (default: `15`).
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                     |
    /// |----------------------------------|-----------------------------|
    /// | `SPORTSYNC_API_URL`              | `http://localhost:8000/api` |
    /// | `SPORTSYNC_API_TOKEN`            | unset                       |
    /// | `SPORTSYNC_REQUEST_TIMEOUT_SECS` | `15`                        |
    pub fn from_env() -> Self {
        let api_url = std::env::var("SPORTSYNC_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".into());

        let api_token = std::env::var("SPORTSYNC_API_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let request_timeout_secs: u64 = std::env::var("SPORTSYNC_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("SPORTSYNC_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self::new(api_url, api_token, request_timeout_secs)
    }

    pub fn new(api_url: String, api_token: Option<String>, request_timeout_secs: u64) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
            request_timeout_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
