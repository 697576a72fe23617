use crate::session::SessionConfig;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub call: CallConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallConfig {
    pub room_prefix: String,
    pub peer_prefix: String,
    pub presets: Vec<String>,
    pub link_origin: String,
    pub link_path: String,
    pub notice_secs: u64,
    pub error_notice_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub enabled: bool,
    pub nats_url: String,
    pub subject: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load `path` (any format the `config` crate knows, extension optional),
    /// then apply `MERO_CALLS__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MERO_CALLS").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            room_prefix: session.room_prefix,
            peer_prefix: "user_".to_string(),
            presets: session.presets,
            link_origin: "http://localhost:3000".to_string(),
            link_path: "/experts".to_string(),
            notice_secs: session.notice_ttl.as_secs(),
            error_notice_secs: session.error_ttl.as_secs(),
        }
    }
}

impl CallConfig {
    /// Per-session slice of the call settings
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            room_prefix: self.room_prefix.clone(),
            presets: self.presets.clone(),
            notice_ttl: Duration::from_secs(self.notice_secs),
            error_ttl: Duration::from_secs(self.error_notice_secs),
        }
    }
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
