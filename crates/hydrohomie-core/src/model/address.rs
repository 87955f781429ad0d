// ── Device identity ──
//
// A device is identified by the authority part of its URL: `host` or
// `host:port`. The address is the join key for every per-device datum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::CoreError;

/// Address of one device, validated as a bare `host[:port]` authority.
///
/// Never mutated after construction; the directory replaces addresses
/// only by adding and removing them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Validate and wrap an operator-entered address.
    ///
    /// Surrounding whitespace is trimmed. Schemes, paths, queries,
    /// credentials and embedded whitespace are rejected.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid(raw, "address is empty"));
        }
        if trimmed.contains("://") {
            return Err(invalid(raw, "enter host[:port] without a scheme"));
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
        {
            return Err(invalid(raw, &format!("unexpected character {c:?}")));
        }

        let url = Url::parse(&format!("http://{trimmed}/"))
            .map_err(|e| invalid(raw, &e.to_string()))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid(raw, "missing host"));
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid(raw: &str, reason: &str) -> CoreError {
    CoreError::ValidationFailed {
        message: format!("invalid device address '{raw}': {reason}"),
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeviceAddress> for String {
    fn from(address: DeviceAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for DeviceAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
