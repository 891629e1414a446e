//! Best-effort one-shot location fixes.
//!
//! `current_fix()` returns at most one result per call: the cached
//! last-known fix when available, otherwise a single live lookup.  There is
//! no ongoing subscription.  When location is disabled in config (the
//! desktop analog of a denied permission) the call reports unavailable
//! immediately without contacting anything.

use hearnear_proto::config::LocationConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone)]
pub struct LocationProvider {
    mode: Mode,
    last_known: Arc<RwLock<Option<LocationFix>>>,
}

#[derive(Clone)]
enum Mode {
    Disabled,
    Static(LocationFix),
    GeoIp { http: reqwest::Client, url: String },
}

/// Response shape of ip-api style GeoIP endpoints.
#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    lat: f64,
    lon: f64,
}

impl LocationProvider {
    pub fn from_config(config: &LocationConfig) -> anyhow::Result<Self> {
        let mode = if !config.enabled {
            Mode::Disabled
        } else if config.mode == "geoip" {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()?;
            Mode::GeoIp {
                http,
                url: config.geoip_url.clone(),
            }
        } else {
            Mode::Static(LocationFix {
                latitude: config.latitude,
                longitude: config.longitude,
            })
        };
        Ok(Self {
            mode,
            last_known: Arc::new(RwLock::new(None)),
        })
    }

    /// Fixed coordinates, mainly for tests.
    pub fn fixed(latitude: f64, longitude: f64) -> Self {
        Self {
            mode: Mode::Static(LocationFix {
                latitude,
                longitude,
            }),
            last_known: Arc::new(RwLock::new(None)),
        }
    }

    pub fn disabled() -> Self {
        Self {
            mode: Mode::Disabled,
            last_known: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn current_fix(&self) -> Option<LocationFix> {
        match &self.mode {
            Mode::Disabled => None,
            Mode::Static(fix) => Some(*fix),
            Mode::GeoIp { http, url } => {
                if let Some(fix) = *self.last_known.read().await {
                    debug!("Using cached location fix");
                    return Some(fix);
                }
                match request_geoip_fix(http, url).await {
                    Ok(fix) => {
                        *self.last_known.write().await = Some(fix);
                        Some(fix)
                    }
                    Err(e) => {
                        warn!("Live location lookup failed: {}", e);
                        None
                    }
                }
            }
        }
    }
}

async fn request_geoip_fix(http: &reqwest::Client, url: &str) -> anyhow::Result<LocationFix> {
    let resp: GeoIpResponse = http.get(url).send().await?.error_for_status()?.json().await?;
    Ok(LocationFix {
        latitude: resp.lat,
        longitude: resp.lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_reports_unavailable() {
        let provider = LocationProvider::disabled();
        assert_eq!(provider.current_fix().await, None);
    }

    #[tokio::test]
    async fn test_static_returns_configured_coordinates() {
        let provider = LocationProvider::fixed(52.0, 21.0);
        let fix = provider.current_fix().await.unwrap();
        assert_eq!(fix.latitude, 52.0);
        assert_eq!(fix.longitude, 21.0);
    }

    #[tokio::test]
    async fn test_config_disabled_wins_over_mode() {
        let config = LocationConfig {
            enabled: false,
            mode: "geoip".to_string(),
            latitude: 1.0,
            longitude: 2.0,
            geoip_url: "http://127.0.0.1:1/json".to_string(),
        };
        let provider = LocationProvider::from_config(&config).unwrap();
        assert_eq!(provider.current_fix().await, None);
    }
}
