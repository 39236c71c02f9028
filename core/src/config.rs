use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::default_client::DEFAULT_ORIGINATOR;

pub const CONFIG_TOML_FILE: &str = "config.toml";

/// Backend the client talks to when neither the config file nor the command
/// line name one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// How often the active conversation is re-fetched.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How long an assistant-reply notification stays on screen.
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Application configuration loaded from disk and merged with overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the chatbot web backend, e.g. `https://scotty.example.edu`.
    pub base_url: Url,

    pub poll_interval: Duration,

    pub notification_ttl: Duration,

    /// Render message bodies as markdown instead of raw text.
    pub render_markdown: bool,

    /// Value of the `originator` header sent with every request.
    pub originator: String,

    /// Optional whole-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,

    /// Directory holding `config.toml` and the log directory.
    pub scotty_home: PathBuf,
}

/// Base config deserialized from `$SCOTTY_HOME/config.toml`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigToml {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub notification_ttl_ms: Option<u64>,
    pub render_markdown: Option<bool>,
    pub originator: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

/// Optional overrides for user configuration (e.g., from CLI flags).
#[derive(Default, Debug, Clone)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub poll_interval: Option<Duration>,
    pub render_markdown: Option<bool>,
    pub scotty_home: Option<PathBuf>,
}

impl Config {
    /// Load `config.toml` from the scotty home directory (creating nothing if
    /// it is absent) and apply `overrides` on top.
    pub fn load_with_overrides(overrides: ConfigOverrides) -> std::io::Result<Self> {
        let scotty_home = match overrides.scotty_home.clone() {
            Some(home) => home,
            None => find_scotty_home()?,
        };
        let cfg = load_config_as_toml(&scotty_home)?;
        Self::load_from_base_config_with_overrides(cfg, overrides, scotty_home)
    }

    pub fn load_from_base_config_with_overrides(
        cfg: ConfigToml,
        overrides: ConfigOverrides,
        scotty_home: PathBuf,
    ) -> std::io::Result<Self> {
        let ConfigOverrides {
            base_url,
            poll_interval,
            render_markdown,
            scotty_home: _,
        } = overrides;

        let raw_base_url = base_url
            .or(cfg.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_base_url).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid base_url {raw_base_url:?}: {e}"),
            )
        })?;

        let poll_interval = poll_interval
            .or(cfg.poll_interval_ms.map(Duration::from_millis))
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "poll interval must be greater than zero",
            ));
        }

        Ok(Self {
            base_url,
            poll_interval,
            notification_ttl: cfg
                .notification_ttl_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_NOTIFICATION_TTL),
            render_markdown: render_markdown.or(cfg.render_markdown).unwrap_or(true),
            originator: cfg
                .originator
                .unwrap_or_else(|| DEFAULT_ORIGINATOR.to_string()),
            request_timeout: cfg.request_timeout_ms.map(Duration::from_millis),
            scotty_home,
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.scotty_home.join("log")
    }
}

/// Read `config.toml` from `scotty_home`. A missing file yields defaults.
pub fn load_config_as_toml(scotty_home: &Path) -> std::io::Result<ConfigToml> {
    let config_path = scotty_home.join(CONFIG_TOML_FILE);
    match std::fs::read_to_string(&config_path) {
        Ok(contents) => toml::from_str::<ConfigToml>(&contents).map_err(|e| {
            tracing::error!("Failed to parse {}: {e}", config_path.display());
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("{} not found, using defaults", config_path.display());
            Ok(ConfigToml::default())
        }
        Err(e) => {
            tracing::error!("Failed to read {}: {e}", config_path.display());
            Err(e)
        }
    }
}

/// Returns the path to the scotty configuration directory, which can be
/// specified by the `SCOTTY_HOME` environment variable. If not set, defaults
/// to `~/.scotty`.
///
/// - If `SCOTTY_HOME` is set, the value will be canonicalized and this
///   function will Err if the path does not exist.
/// - If `SCOTTY_HOME` is not set, this function does not verify that the
///   directory exists.
pub fn find_scotty_home() -> std::io::Result<PathBuf> {
    if let Ok(val) = std::env::var("SCOTTY_HOME")
        && !val.is_empty()
    {
        return PathBuf::from(val).canonicalize();
    }

    let mut p = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    p.push(".scotty");
    Ok(p)
}
