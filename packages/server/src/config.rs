//! Server configuration: command-line flags with environment fallbacks.

use std::time::Duration;

use clap::Parser;

use crate::infrastructure::text_generator::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "taskboard-server")]
#[command(about = "Team task tracker with realtime WebSocket updates", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TASKBOARD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TASKBOARD_PORT", default_value_t = 8080)]
    pub port: u16,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, env = "JWT_SECRET", default_value = "super-secret", hide_env_values = true)]
    pub jwt_secret: String,

    /// Number of event delivery workers
    #[arg(long, env = "TASKBOARD_DELIVERY_WORKERS", default_value_t = 4)]
    pub delivery_workers: usize,

    /// Seconds a new socket may take to send its `connect` frame
    #[arg(long, env = "TASKBOARD_HANDSHAKE_TIMEOUT_SECS", default_value_t = 10)]
    pub handshake_timeout_secs: u64,

    /// API key of an OpenAI-compatible provider; task suggestions and chat
    /// fall back to local replies when absent
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub ai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub ai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub ai_base_url: String,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, env = "TASKBOARD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs.max(1))
    }

    /// Provider settings, or `None` when no usable API key is configured
    pub fn openai(&self) -> Option<OpenAiConfig> {
        let api_key = self.ai_api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())?;
        let mut config = OpenAiConfig::new(api_key);
        config.model = self.ai_model.clone();
        config.base_url = self.ai_base_url.clone();
        Some(config)
    }
}
