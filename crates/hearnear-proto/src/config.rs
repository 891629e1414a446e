use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Capture intake: which sources count as music apps and where notifiers
/// connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<String>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_capture_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Minimum spacing between consecutive forwarded samples.  Samples
    /// arriving inside the window are dropped, not queued.
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_max_distance")]
    pub max_distance_km: f64,
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u32,
}

/// Local HTTP control API (the UI seam).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// When false the provider reports no fix at all — the desktop analog of
    /// a denied location permission.
    #[serde(default = "default_location_enabled")]
    pub enabled: bool,
    /// "static" uses the configured coordinates; "geoip" issues a single
    /// live lookup per fix request and caches the result.
    #[serde(default = "default_location_mode")]
    pub mode: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default = "default_geoip_url")]
    pub geoip_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            allowlist: default_allowlist(),
            bind_address: default_bind_address(),
            port: default_capture_port(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            throttle_secs: default_throttle_secs(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            max_distance_km: default_max_distance(),
            max_age_minutes: default_max_age_minutes(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_http_port(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: default_location_enabled(),
            mode: default_location_mode(),
            latitude: 0.0,
            longitude: 0.0,
            geoip_url: default_geoip_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_allowlist() -> Vec<String> {
    vec!["spotify".to_string(), "youtube-music".to_string()]
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_capture_port() -> u16 {
    platform::CAPTURE_TCP_PORT
}

fn default_throttle_secs() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_distance() -> f64 {
    50.0
}

fn default_max_age_minutes() -> u32 {
    60
}

fn default_http_enabled() -> bool {
    true
}

fn default_http_port() -> u16 {
    platform::CONTROL_HTTP_PORT
}

fn default_location_enabled() -> bool {
    true
}

fn default_location_mode() -> String {
    "static".to_string()
}

fn default_geoip_url() -> String {
    "http://ip-api.com/json".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
