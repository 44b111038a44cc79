//! Runtime configuration from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_ANNOUNCE_DELAY: Duration = Duration::from_millis(1000);
/// Shortest pause allowed between the two announcement messages
pub const MIN_ANNOUNCE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WEBHOOK_LISTEN: &str = "0.0.0.0:8443";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN (or BOT_TOKEN) must be set")]
    MissingToken,

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Webhook mode settings. Absent means long polling.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    /// Public URL Telegram should POST updates to
    pub url: String,
    /// Local address the webhook server binds to
    pub listen: SocketAddr,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` (None = not checked)
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    /// Directory holding the JSON documents
    pub data_dir: PathBuf,
    /// Pause between the teaser and the verdict of a `/clown` announcement
    pub announce_delay: Duration,
    pub poll_timeout: Duration,
    pub webhook: Option<WebhookConfig>,
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source. Values are trimmed and
    /// empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name).and_then(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
        };

        let token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .ok_or(ConfigError::MissingToken)?;

        let api_url = get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let data_dir = get("CLOWN_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let announce_delay = match get("CLOWN_ANNOUNCE_DELAY_MS") {
            Some(value) => {
                let millis = parse("CLOWN_ANNOUNCE_DELAY_MS", value.clone())?;
                let delay = Duration::from_millis(millis);
                if delay < MIN_ANNOUNCE_DELAY {
                    return Err(ConfigError::InvalidValue {
                        name: "CLOWN_ANNOUNCE_DELAY_MS",
                        value,
                    });
                }
                delay
            }
            None => DEFAULT_ANNOUNCE_DELAY,
        };

        let poll_timeout = match get("TELEGRAM_POLL_TIMEOUT") {
            Some(value) => Duration::from_secs(parse("TELEGRAM_POLL_TIMEOUT", value)?),
            None => DEFAULT_POLL_TIMEOUT,
        };

        let webhook = match get("WEBHOOK_URL") {
            Some(url) => {
                let listen = get("WEBHOOK_LISTEN")
                    .unwrap_or_else(|| DEFAULT_WEBHOOK_LISTEN.to_string());
                Some(WebhookConfig {
                    url,
                    listen: parse("WEBHOOK_LISTEN", listen)?,
                    secret: get("WEBHOOK_SECRET"),
                })
            }
            None => None,
        };

        Ok(Self {
            token,
            api_url,
            data_dir,
            announce_delay,
            poll_timeout,
            webhook,
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}
