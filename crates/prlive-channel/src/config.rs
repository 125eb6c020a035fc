use std::fmt;
use std::path::Path;
use std::time::Duration;

use prlive_frame::{FrameConfig, DEFAULT_MAX_FRAME_SIZE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, Result};
use crate::policy::ReconnectPolicy;

/// Default number of automatic reconnect attempts.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

/// Channel configuration.
///
/// Deserializes from JSON with camelCase keys; `reconnectInterval` is in
/// milliseconds:
///
/// ```json
/// { "url": "ws://localhost:8000/ws", "reconnectAttempts": 5, "reconnectInterval": 3000 }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    /// WebSocket address (`ws://` or `wss://`).
    pub url: String,
    /// Automatic reconnect attempts after an unplanned close.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    /// Fixed delay before each reconnect attempt.
    #[serde(default = "default_reconnect_interval", with = "millis")]
    pub reconnect_interval: Duration,
    /// Session token sent as the `token` query parameter.
    /// Treated as opaque credential material and redacted in debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Largest inbound frame accepted, in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

fn default_reconnect_attempts() -> u32 {
    DEFAULT_RECONNECT_ATTEMPTS
}

fn default_reconnect_interval() -> Duration {
    DEFAULT_RECONNECT_INTERVAL
}

fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

impl ChannelConfig {
    /// Configuration for `url` with default reconnect settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            auth_token: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check the configuration for values the channel cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let parsed = self.parsed_url()?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ConfigError::InvalidUrl {
                    url: self.url.trim().to_string(),
                    reason: format!("scheme must be ws or wss, got {other}"),
                })
            }
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidUrl {
                url: self.url.trim().to_string(),
                reason: "missing host".to_string(),
            });
        }

        if self.max_frame_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "maxFrameSize",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// The address actually dialed: the normalized `url` plus the auth
    /// token, if any, as the `token` query parameter.
    ///
    /// Falls back to the raw `url` when it does not parse; `validate` rejects
    /// such configurations before a channel is started.
    pub fn endpoint(&self) -> String {
        let Ok(mut url) = self.parsed_url() else {
            return self.url.trim().to_string();
        };
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("token", token);
        }
        url.into()
    }

    fn parsed_url(&self) -> Result<Url> {
        let raw = self.url.trim();
        Url::parse(raw).map_err(|err| ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })
    }

    /// The reconnect policy described by this configuration.
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(self.reconnect_attempts, self.reconnect_interval)
    }

    /// The codec configuration described by this configuration.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_size: self.max_frame_size,
        }
    }
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("ChannelConfig");
        dbg.field("url", &self.url)
            .field("reconnect_attempts", &self.reconnect_attempts)
            .field("reconnect_interval", &self.reconnect_interval);
        if let Some(token) = &self.auth_token {
            dbg.field(
                "auth_token",
                &format_args!("<redacted:{} bytes>", token.len()),
            );
        } else {
            dbg.field("auth_token", &Option::<String>::None);
        }
        dbg.field("max_frame_size", &self.max_frame_size).finish()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
