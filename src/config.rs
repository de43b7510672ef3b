//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default agent runtime address, matching a local OpenClaw gateway.
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:3765";

/// Server configuration.
///
/// [`Config::from_env`] reads the environment; CLI flags are applied on top by
/// the binary. [`Config::default`] ignores the environment, which keeps tests
/// hermetic.
#[derive(Clone, Debug)]
pub struct Config {
    /// Database file (from MISSION_CONTROL_DB). `None` uses the platform data dir.
    pub db_path: Option<PathBuf>,
    /// Allowed CORS origins (from MISSION_CONTROL_CORS_ORIGINS, comma-separated).
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    /// Keep-alive interval on the push endpoint (MISSION_CONTROL_HEARTBEAT_SECS).
    pub heartbeat_interval: Duration,
    /// Notifications handled per sweeper run (MISSION_CONTROL_SWEEP_BATCH).
    pub sweep_batch_size: usize,
    /// Per-listener buffer on the event bus.
    pub event_capacity: usize,
    pub gateway: GatewayConfig,
}

/// Connection settings for the external agent runtime.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL (from OPENCLAW_URL).
    pub base_url: String,
    /// Bearer token (from OPENCLAW_TOKEN).
    pub token: Option<String>,
    /// Request timeout (from OPENCLAW_TIMEOUT_SECS).
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let db_path = std::env::var("MISSION_CONTROL_DB").ok().map(PathBuf::from);

        let cors_origins = std::env::var("MISSION_CONTROL_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty());

        let heartbeat_interval = env_u64("MISSION_CONTROL_HEARTBEAT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.heartbeat_interval);

        let sweep_batch_size = env_u64("MISSION_CONTROL_SWEEP_BATCH")
            .map(|n| n as usize)
            .unwrap_or(defaults.sweep_batch_size);

        Self {
            db_path,
            cors_origins,
            heartbeat_interval,
            sweep_batch_size,
            event_capacity: defaults.event_capacity,
            gateway: GatewayConfig::from_env(),
        }
    }

    /// Config with a fixed heartbeat, for exercising the push endpoint.
    pub fn with_heartbeat(interval: Duration) -> Self {
        Self {
            heartbeat_interval: interval,
            ..Self::default()
        }
    }

    /// Config pointing the gateway at a specific runtime.
    pub fn with_gateway(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            gateway: GatewayConfig {
                base_url: base_url.into(),
                token,
                ..GatewayConfig::default()
            },
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            cors_origins: None,
            heartbeat_interval: Duration::from_secs(30),
            sweep_batch_size: 50,
            event_capacity: crate::events::DEFAULT_CAPACITY,
            gateway: GatewayConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("OPENCLAW_URL").unwrap_or(defaults.base_url),
            token: std::env::var("OPENCLAW_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout: env_u64("OPENCLAW_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// A zero interval, batch or timeout is never useful, so it falls back to the default.
fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().as_deref().and_then(parse_positive)
}

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.sweep_batch_size, 50);
        assert!(config.cors_origins.is_none());
        assert_eq!(config.gateway.base_url, DEFAULT_GATEWAY_URL);
        assert!(config.gateway.token.is_none());
    }

    #[test]
    fn with_gateway_overrides_only_the_gateway() {
        let config = Config::with_gateway("http://runtime:9000", Some("secret".to_string()));
        assert_eq!(config.gateway.base_url, "http://runtime:9000");
        assert_eq!(config.gateway.token.as_deref(), Some("secret"));
        assert_eq!(config.sweep_batch_size, 50);
    }

    #[test]
    fn rejects_zero_and_garbage_numbers() {
        assert_eq!(parse_positive(" 15 "), Some(15));
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-3"), None);
        assert_eq!(parse_positive("soon"), None);
    }

    #[test]
    fn zero_heartbeat_falls_back_to_default() {
        std::env::set_var("MISSION_CONTROL_HEARTBEAT_SECS", "0");
        let config = Config::from_env();
        std::env::remove_var("MISSION_CONTROL_HEARTBEAT_SECS");

        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    }
}
