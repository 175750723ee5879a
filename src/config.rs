use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Prefix for environment overrides, e.g. `QUERY_CHAT_SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "QUERY_CHAT";

/// Pinned HTMX bundle used when `ui.htmx_src` is not set.
pub const DEFAULT_HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the service answering `POST /query`
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub ui: UiConfig,
    pub conversation: ConversationConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub title: String,
    pub static_dir: String,
    pub htmx_src: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversationConfig {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl ConversationConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Never zero; `tokio::time::interval` panics on a zero period.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("backend.base_url", "http://127.0.0.1:8000")?
            .set_default("ui.title", "Chat")?
            .set_default("ui.static_dir", "static")?
            .set_default("ui.htmx_src", DEFAULT_HTMX_SRC)?
            .set_default("conversation.idle_timeout_secs", 30 * 60)?
            .set_default("conversation.sweep_interval_secs", 60)?
            .set_default("log.format", "text")?;

        // 2. Config file: explicit path must exist, ./config.* is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Prefixed environment, e.g. QUERY_CHAT_BACKEND__BASE_URL
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and their plain env vars) win over everything
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("log.format", format.as_str())?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        url::Url::parse(&self.backend.base_url).map_err(|e| {
            config::ConfigError::Message(format!(
                "backend.base_url {:?} is not an absolute URL: {e}",
                self.backend.base_url
            ))
        })?;
        Ok(())
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
