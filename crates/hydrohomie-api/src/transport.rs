// Shared transport configuration for building reqwest::Client instances.
//
// Every device is reached through the same client so connection pooling
// is shared across the fleet; only the per-request timeout is tunable.

use std::time::Duration;

const USER_AGENT: &str = concat!("hydrohomie/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound for a whole request, connect through body.
    pub timeout: Duration,
    /// Upper bound for establishing the TCP connection alone.
    pub connect_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            connect_timeout: None,
        }
    }
}

impl TransportConfig {
    /// Build a config with the given whole-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if let Some(connect) = self.connect_timeout {
            builder = builder.connect_timeout(connect);
        }

        builder.build().map_err(crate::error::Error::Transport)
    }
}
