use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ytsm_core::DEFAULT_POLL_INTERVAL_MS;
use ytsm_engine::{
    EngineConfig, HttpSettings, RequestError, DEFAULT_JOBS_PATH, DEFAULT_NOTIFICATIONS_PATH,
    DEFAULT_TREE_PATH, DEFAULT_VIDEOS_PATH,
};
use ytsm_logging::ytsm_info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Settings read from the optional RON file. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub jobs_path: String,
    pub tree_path: String,
    pub notifications_path: String,
    pub videos_path: String,
    /// First notification id to ask for.
    pub last_notification_id: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_body_bytes: u64,
    /// Raw `Cookie` header value carrying the session.
    pub session_cookie: Option<String>,
    pub csrf_token: Option<String>,
    pub tick_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let http = HttpSettings::default();
        Self {
            base_url: "http://localhost:8000/".to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            jobs_path: DEFAULT_JOBS_PATH.to_string(),
            tree_path: DEFAULT_TREE_PATH.to_string(),
            notifications_path: DEFAULT_NOTIFICATIONS_PATH.to_string(),
            videos_path: DEFAULT_VIDEOS_PATH.to_string(),
            last_notification_id: 0,
            connect_timeout_ms: http.connect_timeout.as_millis() as u64,
            request_timeout_ms: http.request_timeout.as_millis() as u64,
            max_body_bytes: http.max_bytes,
            session_cookie: None,
            csrf_token: None,
            tick_interval_ms: 250,
        }
    }
}

impl AppConfig {
    pub fn engine_config(&self) -> Result<EngineConfig, RequestError> {
        let mut engine = EngineConfig::new(&self.base_url)?;
        engine.jobs_path.clone_from(&self.jobs_path);
        engine.tree_path.clone_from(&self.tree_path);
        engine.notifications_path.clone_from(&self.notifications_path);
        engine.videos_path.clone_from(&self.videos_path);
        engine.http = HttpSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_bytes: self.max_body_bytes,
            session_cookie: self.session_cookie.clone(),
            csrf_token: self.csrf_token.clone(),
            ..HttpSettings::default()
        };
        Ok(engine)
    }
}

pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    ytsm_info!("Loaded config from {:?}", path);
    Ok(config)
}
