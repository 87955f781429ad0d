// Device HTTP client
//
// Wraps `reqwest::Client` with device URL construction, status checking
// and JSON decoding. Endpoint methods live in `device.rs` as inherent
// methods to keep this module focused on transport mechanics.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest slice of a response body kept in error messages.
const BODY_PREVIEW: usize = 200;

/// Raw HTTP client for HydroHomie devices.
///
/// One instance serves the whole fleet: the target device is chosen per
/// call by its address (`host` or `host:port`). Cheap to clone.
#[derive(Debug, Clone)]
pub struct HomieClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl HomieClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            timeout: transport.timeout,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// `timeout` is only used to label [`Error::Timeout`]; the bound
    /// itself is whatever `http` was built with.
    pub fn with_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// The per-request timeout this client reports on failure.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `http://{address}/{path}`.
    pub fn device_url(&self, address: &str, path: &str) -> Result<Url, Error> {
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("http://{address}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout.as_secs()))?;

        let body = self.checked_body(resp).await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Send a POST request, optionally with a JSON body. The response
    /// body is read (so the connection can be reused) and discarded.
    pub(crate) async fn post(
        &self,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<(), Error> {
        debug!("POST {}", url);

        let mut builder = self.http.post(url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout.as_secs()))?;

        let body = self.checked_body(resp).await?;
        trace!(len = body.len(), "POST response body discarded");
        Ok(())
    }

    /// Turn a non-2xx response into [`Error::Rejected`], otherwise
    /// return the body text.
    async fn checked_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Rejected {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        resp.text()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout.as_secs()))
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
