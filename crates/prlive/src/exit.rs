use std::fmt;
use std::io;

use prlive_channel::{ChannelError, ConfigError, StartError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: &io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    match &err {
        ConfigError::Io { source, .. } => io_error(context, source),
        ConfigError::Parse(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ConfigError::MissingUrl | ConfigError::InvalidUrl { .. } | ConfigError::InvalidValue { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

pub fn start_error(context: &str, err: StartError) -> CliError {
    match err {
        StartError::Config(err) => config_error(context, err),
        StartError::NoRuntime => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn channel_error(context: &str, err: &ChannelError) -> CliError {
    let code = match err {
        ChannelError::TransportOpen(_)
        | ChannelError::Transport(_)
        | ChannelError::ReconnectExhausted { .. } => TRANSPORT_ERROR,
        ChannelError::Decode(_) => DATA_INVALID,
        ChannelError::SendWhileClosed { .. } => FAILURE,
        ChannelError::Encode { .. } => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_channel_errors() {
        assert_eq!(
            channel_error("x", &ChannelError::ReconnectExhausted { attempts: 5 }).code,
            TRANSPORT_ERROR
        );
        assert_eq!(
            channel_error("x", &ChannelError::Decode("bad".into())).code,
            DATA_INVALID
        );
        assert_eq!(
            channel_error("x", &ChannelError::SendWhileClosed { kind: "k".into() }).code,
            FAILURE
        );
    }

    #[test]
    fn maps_config_errors() {
        assert_eq!(config_error("x", ConfigError::MissingUrl).code, USAGE);

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(config_error("x", ConfigError::Parse(parse)).code, DATA_INVALID);

        let missing = ConfigError::Io {
            path: "/nope".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let err = config_error("reading config", missing);
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("reading config: "));
    }
}
