// hydrohomie-api: Async Rust client for the HydroHomie device HTTP API
//
// Every device serves the same small surface over plain HTTP:
// `GET /status`, `GET /config`, `GET /history`, `POST /config`,
// `POST /water` and `POST /stop`. One call is one attempt: this crate
// never retries and never caches.

pub mod client;
pub mod device;
pub mod error;
pub mod models;
pub mod transport;

pub use client::HomieClient;
pub use error::Error;
pub use models::{ConfigPayload, ConfigUpdate, HistoryEntry, StatusPayload};
pub use transport::TransportConfig;
