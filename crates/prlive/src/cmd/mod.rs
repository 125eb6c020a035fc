use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use prlive_channel::{ChannelConfig, EventName};
use prlive_frame::SuggestionStatus;

use crate::exit::{config_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod analyze;
pub mod comment;
pub mod listen;
pub mod send;
pub mod session;
pub mod suggestion;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect, subscribe to pull requests and print live events.
    Listen(ListenArgs),
    /// Send one raw envelope.
    Send(SendArgs),
    /// Post a review comment.
    Comment(CommentArgs),
    /// Accept or reject a suggestion.
    Suggestion(SuggestionArgs),
    /// Request analysis of a pull request.
    Analyze(AnalyzeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format).await,
        Command::Send(args) => send::run(args, format).await,
        Command::Comment(args) => comment::run(args, format).await,
        Command::Suggestion(args) => suggestion::run(args, format).await,
        Command::Analyze(args) => analyze::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

/// Where and how to connect.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Server address (ws:// or wss://).
    #[arg(long, env = "PRLIVE_URL", conflicts_with = "config")]
    pub url: Option<String>,
    /// Session token, sent as the `token` query parameter.
    #[arg(long, env = "PRLIVE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// JSON channel configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Automatic reconnect attempts after an unplanned close.
    #[arg(long, value_name = "N")]
    pub reconnect_attempts: Option<u32>,
    /// Delay between reconnect attempts (e.g. 3s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub reconnect_interval: Option<String>,
    /// Give up if no connection is established within this time.
    #[arg(long, value_name = "DURATION", default_value = "10s")]
    pub connect_timeout: String,
}

impl ConnectArgs {
    /// Build the channel configuration: file or `--url`, then flag overrides.
    pub fn channel_config(&self) -> CliResult<ChannelConfig> {
        let mut config = match (&self.config, &self.url) {
            (Some(path), _) => ChannelConfig::from_file(path)
                .map_err(|err| config_error(&format!("config {}", path.display()), err))?,
            (None, Some(url)) => ChannelConfig::new(url.clone()),
            (None, None) => {
                return Err(CliError::new(
                    USAGE,
                    "no server address: pass --url, set PRLIVE_URL, or use --config",
                ))
            }
        };

        if let Some(token) = &self.token {
            config.auth_token = Some(token.clone());
        }
        if let Some(attempts) = self.reconnect_attempts {
            config.reconnect_attempts = attempts;
        }
        if let Some(interval) = &self.reconnect_interval {
            config.reconnect_interval = parse_duration(interval)?;
        }

        config
            .validate()
            .map_err(|err| config_error("invalid configuration", err))?;
        Ok(config)
    }

    pub fn connect_timeout(&self) -> CliResult<Duration> {
        parse_timeout("--connect-timeout", &self.connect_timeout)
    }
}

/// Optional wait for a server reply after a one-shot send.
#[derive(Args, Debug, Clone)]
pub struct ReplyArgs {
    /// Wait for one inbound event and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "5s")]
    pub wait_timeout: String,
}

impl ReplyArgs {
    /// How long to wait for a reply, or `None` without `--wait`.
    pub fn wait_for(&self) -> CliResult<Option<Duration>> {
        if !self.wait {
            return Ok(None);
        }
        parse_timeout("--wait-timeout", &self.wait_timeout).map(Some)
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Pull requests to subscribe to (comma-separated). Re-sent after every reconnect.
    #[arg(long = "pr", value_name = "ID", value_delimiter = ',')]
    pub prs: Vec<u64>,
    /// Only print these events (comma-separated, e.g. newComment,prUpdate).
    #[arg(long, value_name = "EVENT", value_delimiter = ',')]
    pub events: Vec<EventName>,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    #[command(flatten)]
    pub reply: ReplyArgs,
    /// Envelope type.
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: String,
    /// JSON payload. Default: null.
    #[arg(long)]
    pub json: Option<String>,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    #[command(flatten)]
    pub reply: ReplyArgs,
    /// Pull request to comment on.
    #[arg(long)]
    pub pr: u64,
    /// Line the comment refers to.
    #[arg(long)]
    pub line: Option<u32>,
    /// Comment text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct SuggestionArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    #[command(flatten)]
    pub reply: ReplyArgs,
    /// Suggestion id.
    pub id: u64,
    /// accept or reject.
    pub status: SuggestionStatus,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    #[command(flatten)]
    pub reply: ReplyArgs,
    /// Pull request to analyze.
    #[arg(long)]
    pub pr: u64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };
    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Like [`parse_duration`], but zero is rejected: a zero timeout can never
/// be met.
pub fn parse_timeout(flag: &str, input: &str) -> CliResult<Duration> {
    let timeout = parse_duration(input)?;
    if timeout.is_zero() {
        return Err(CliError::new(USAGE, format!("{flag} must be greater than zero")));
    }
    Ok(timeout)
}
