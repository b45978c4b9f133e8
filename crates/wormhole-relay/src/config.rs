// ============================================
// File: crates/wormhole-relay/src/config.rs
// ============================================
//! # Relay Configuration
//!
//! ## Creation Reason
//! Static relay configuration loaded once at process start from a TOML
//! file.
//!
//! ## Main Functionality
//! - `RelayConfig`: root configuration
//! - Per-section structs with `#[serde(default)]` so partial files load
//! - `validate()` catches values the relay cannot run with
//!
//! ## Configuration File Format
//! ```toml
//! [network]
//! bind_ip = "0.0.0.0"
//! udp_port = 5300
//! tcp_port = 5300
//!
//! [policy]
//! allowed_cidrs = []
//! blocked_cidrs = ["10.0.0.0/8", "192.168.0.0/16"]
//!
//! [limits]
//! max_bandwidth_kbps = 10240
//! forward_timeout_secs = 5
//! peer_idle_timeout_secs = 300
//! sweep_interval_ms = 1000
//!
//! [target_key]
//! seed = 4242
//!
//! [logging]
//! level = "info"
//!
//! [[relays]]
//! name = "edge-1"
//! ip = "203.0.113.10"
//! port = 5300
//! protocol = "udp"     # dns, https or udp
//! capable = true
//!
//! [[blocked_targets]]
//! name = "archive"
//! ip = "198.51.100.7"
//! reason = "filtered upstream"
//! reachable_via = ["edge-1"]
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Port 0 means "pick an ephemeral port" and is valid
//! - No hot reload; changes need a restart
//!
//! ## Last Modified
//! v0.1.0 - Initial relay configuration

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use wormhole_common::Ipv4Cidr;

use crate::error::{RelayError, Result};
use crate::services::directory::{BlockedTarget, RelayDirectory, RelayNode};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================
// RelayConfig
// ============================================

/// Root relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Listening sockets.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Destination access policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Bandwidth and timing limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Seed for target-encrypted headers.
    #[serde(default)]
    pub target_key: TargetKeyConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Known relays.
    #[serde(default)]
    pub relays: Vec<RelayNode>,

    /// Targets unreachable on the direct path.
    #[serde(default)]
    pub blocked_targets: Vec<BlockedTarget>,
}

impl RelayConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    /// `ConfigLoad` if the file cannot be read or parsed, `ConfigInvalid`
    /// if validation fails.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RelayError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| RelayError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    /// `ConfigLoad` on parse failure, `ConfigInvalid` on validation failure.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| RelayError::config_load("<string>", e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    /// `ConfigInvalid` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        self.target_key.validate()?;
        self.logging.validate()?;
        self.validate_directory()
    }

    fn validate_directory(&self) -> Result<()> {
        let mut names = HashSet::new();
        for relay in &self.relays {
            if relay.name.is_empty() {
                return Err(RelayError::config_invalid("relays.name", "cannot be empty"));
            }
            if !names.insert(relay.name.as_str()) {
                return Err(RelayError::config_invalid(
                    "relays.name",
                    format!("duplicate relay '{}'", relay.name),
                ));
            }
            if relay.port == 0 {
                return Err(RelayError::config_invalid(
                    "relays.port",
                    format!("relay '{}' needs a non-zero port", relay.name),
                ));
            }
        }

        for target in &self.blocked_targets {
            if target.name.is_empty() {
                return Err(RelayError::config_invalid(
                    "blocked_targets.name",
                    "cannot be empty",
                ));
            }
            if let Some(unknown) = target.reachable_via.iter().find(|n| !names.contains(n.as_str())) {
                return Err(RelayError::config_invalid(
                    "blocked_targets.reachable_via",
                    format!("target '{}' names unknown relay '{unknown}'", target.name),
                ));
            }
        }

        Ok(())
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RelayError::config_invalid("serialization", e.to_string()))
    }

    /// UDP listening address.
    #[must_use]
    pub fn udp_addr(&self) -> SocketAddr {
        SocketAddr::new(self.network.bind_ip, self.network.udp_port)
    }

    /// TCP listening address.
    #[must_use]
    pub fn tcp_addr(&self) -> SocketAddr {
        SocketAddr::new(self.network.bind_ip, self.network.tcp_port)
    }

    /// Relay directory built from `[[relays]]` and `[[blocked_targets]]`.
    #[must_use]
    pub fn directory(&self) -> RelayDirectory {
        RelayDirectory::new(self.relays.clone(), self.blocked_targets.clone())
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Listening socket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address both transports bind to.
    #[serde(default = "default_bind_ip")]
    pub bind_ip: IpAddr,

    /// UDP port (0 = ephemeral).
    #[serde(default = "default_port")]
    pub udp_port: u16,

    /// TCP port (0 = ephemeral).
    #[serde(default = "default_port")]
    pub tcp_port: u16,
}

fn default_bind_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5300
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_ip: default_bind_ip(),
            udp_port: default_port(),
            tcp_port: default_port(),
        }
    }
}

// ============================================
// PolicyConfig
// ============================================

/// Destination allow/deny lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// If non-empty, only these destinations are relayed.
    #[serde(default)]
    pub allowed_cidrs: Vec<Ipv4Cidr>,

    /// Never relayed; wins over the allow list.
    #[serde(default)]
    pub blocked_cidrs: Vec<Ipv4Cidr>,
}

// ============================================
// LimitsConfig
// ============================================

/// Bandwidth and timing limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Relay-wide inbound bandwidth cap in kilobits per second.
    #[serde(default = "default_max_bandwidth_kbps")]
    pub max_bandwidth_kbps: u64,

    /// Per-forward timeout in seconds.
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,

    /// Peers idle longer than this are evicted.
    #[serde(default = "default_peer_idle_timeout")]
    pub peer_idle_timeout_secs: u64,

    /// Sweep period in milliseconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

fn default_max_bandwidth_kbps() -> u64 {
    10_240
}

fn default_forward_timeout() -> u64 {
    5
}

fn default_peer_idle_timeout() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    1_000
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.max_bandwidth_kbps == 0 {
            return Err(RelayError::config_invalid(
                "limits.max_bandwidth_kbps",
                "must be greater than 0",
            ));
        }

        if self.max_bandwidth_kbps > u64::MAX / 128 {
            return Err(RelayError::config_invalid(
                "limits.max_bandwidth_kbps",
                "too large",
            ));
        }

        if self.forward_timeout_secs == 0 {
            return Err(RelayError::config_invalid(
                "limits.forward_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.peer_idle_timeout_secs == 0 {
            return Err(RelayError::config_invalid(
                "limits.peer_idle_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.sweep_interval_ms == 0 {
            return Err(RelayError::config_invalid(
                "limits.sweep_interval_ms",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Forward timeout as a `Duration`.
    #[must_use]
    pub const fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }

    /// Peer idle timeout as a `Duration`.
    #[must_use]
    pub const fn peer_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_idle_timeout_secs)
    }

    /// Sweep period as a `Duration`.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_bandwidth_kbps: default_max_bandwidth_kbps(),
            forward_timeout_secs: default_forward_timeout(),
            peer_idle_timeout_secs: default_peer_idle_timeout(),
            sweep_interval_ms: default_sweep_interval(),
        }
    }
}

// ============================================
// TargetKeyConfig
// ============================================

/// Largest seed a TOML file can carry (TOML integers are `i64`).
pub const MAX_TARGET_SEED: u64 = i64::MAX.unsigned_abs();

/// Shared seed for sealed destination fields.
///
/// Without a seed, target-encrypted packets cannot be opened and are
/// dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetKeyConfig {
    /// Seed shared with senders, at most [`MAX_TARGET_SEED`].
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TargetKeyConfig {
    fn validate(&self) -> Result<()> {
        match self.seed {
            Some(seed) if seed > MAX_TARGET_SEED => Err(RelayError::config_invalid(
                "target_key.seed",
                format!("must be at most {MAX_TARGET_SEED}"),
            )),
            _ => Ok(()),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(RelayError::config_invalid(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.forward_timeout(), Duration::from_secs(5));
        assert_eq!(config.limits.peer_idle_timeout(), Duration::from_secs(300));
        assert_eq!(config.udp_addr().port(), 5300);
        assert!(config.target_key.seed.is_none());
    }

    #[test]
    fn test_full_config_format() {
        let toml = r#"
            [network]
            bind_ip = "127.0.0.1"
            udp_port = 6000
            tcp_port = 6001

            [policy]
            allowed_cidrs = ["203.0.113.0/24"]
            blocked_cidrs = ["10.0.0.0/8", "203.0.113.66"]

            [limits]
            max_bandwidth_kbps = 64
            forward_timeout_secs = 2

            [target_key]
            seed = 4242

            [logging]
            level = "debug"

            [[relays]]
            name = "edge-1"
            ip = "203.0.113.10"
            port = 5300

            [[blocked_targets]]
            name = "archive"
            ip = "198.51.100.7"
            reason = "filtered upstream"
            reachable_via = ["edge-1"]
        "#;

        let config = RelayConfig::from_str(toml).unwrap();
        assert_eq!(config.udp_addr(), "127.0.0.1:6000".parse().unwrap());
        assert_eq!(config.tcp_addr(), "127.0.0.1:6001".parse().unwrap());
        assert_eq!(config.policy.allowed_cidrs.len(), 1);
        assert_eq!(config.policy.blocked_cidrs[1].prefix_len(), 32);
        assert_eq!(config.limits.max_bandwidth_kbps, 64);
        assert_eq!(config.limits.sweep_interval_ms, 1_000);
        assert_eq!(config.target_key.seed, Some(4242));
        assert_eq!(config.directory().select_relay("archive").name, "edge-1");
    }

    #[test]
    fn test_ephemeral_ports_allowed() {
        let config = RelayConfig::from_str(
            r#"
                [network]
                udp_port = 0
                tcp_port = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.udp_addr().port(), 0);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = RelayConfig::from_str(
            r#"
                [limits]
                forward_timeout_secs = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::ConfigInvalid { ref field, .. } if field == "limits.forward_timeout_secs"));
    }

    #[test]
    fn test_bad_cidr_is_load_error() {
        let err = RelayConfig::from_str(
            r#"
                [policy]
                blocked_cidrs = ["10.0.0.0/40"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::ConfigLoad { .. }));
    }

    #[test]
    fn test_unknown_reachable_via_rejected() {
        let err = RelayConfig::from_str(
            r#"
                [[blocked_targets]]
                name = "archive"
                ip = "198.51.100.7"
                reachable_via = ["nowhere"]
            "#,
        )
        .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_duplicate_relay_rejected() {
        let err = RelayConfig::from_str(
            r#"
                [[relays]]
                name = "a"
                ip = "192.0.2.1"
                port = 1

                [[relays]]
                name = "a"
                ip = "192.0.2.2"
                port = 2
            "#,
        )
        .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = RelayConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = RelayConfig::default();
        config.policy.blocked_cidrs.push("10.0.0.0/8".parse().unwrap());
        config.target_key.seed = Some(7);

        let text = config.to_toml().unwrap();
        let parsed = RelayConfig::from_str(&text).unwrap();
        assert_eq!(parsed.policy.blocked_cidrs, config.policy.blocked_cidrs);
        assert_eq!(parsed.target_key.seed, Some(7));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = RelayConfig::load("/definitely/not/here.toml").await.unwrap_err();
        assert!(matches!(err, RelayError::ConfigLoad { .. }));
    }

    #[test]
    fn test_target_seed_must_fit_toml() {
        let mut config = RelayConfig::default();
        config.target_key.seed = Some(MAX_TARGET_SEED);
        assert!(config.validate().is_ok());
        let round = RelayConfig::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(round.target_key.seed, Some(MAX_TARGET_SEED));

        config.target_key.seed = Some(MAX_TARGET_SEED + 1);
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }
}
