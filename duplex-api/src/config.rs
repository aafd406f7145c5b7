//! Server Configuration Module
//!
//! Per-transport listener settings plus the logging format. Everything is
//! read from environment variables with development defaults; every field is
//! optional.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use duplex_core::ConfigError;
use duplex_storage::config::{env_lookup, parse_millis, Lookup};
use duplex_storage::DataConfig;

// ============================================================================
// TRANSPORT CONFIGURATION
// ============================================================================

/// Address family a listener binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    /// Whichever family the address resolves to first
    #[default]
    Tcp,
    Tcp4,
    Tcp6,
}

impl Network {
    /// Whether a resolved address belongs to this network.
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Network::Tcp => true,
            Network::Tcp4 => addr.is_ipv4(),
            Network::Tcp6 => addr.is_ipv6(),
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            other => Err(ConfigError::InvalidValue {
                field: "network".to_string(),
                value: other.to_string(),
                reason: "expected tcp, tcp4 or tcp6".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Tcp => write!(f, "tcp"),
            Network::Tcp4 => write!(f, "tcp4"),
            Network::Tcp6 => write!(f, "tcp6"),
        }
    }
}

/// Listener settings for one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub network: Network,
    /// `host:port` to bind
    pub addr: String,
    /// Deadline for each request's handler
    pub timeout: Duration,
}

impl TransportConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn http_default() -> Self {
        Self {
            network: Network::Tcp,
            addr: "0.0.0.0:8000".to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn grpc_default() -> Self {
        Self {
            network: Network::Tcp,
            addr: "0.0.0.0:9000".to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Loopback on an ephemeral port.
    pub fn ephemeral() -> Self {
        Self {
            network: Network::Tcp4,
            addr: "127.0.0.1:0".to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Overlay `{prefix}_NETWORK`, `{prefix}_ADDR`, `{prefix}_TIMEOUT_MS` onto
    /// `defaults`.
    pub fn from_lookup(
        prefix: &str,
        defaults: Self,
        lookup: impl Lookup,
    ) -> Result<Self, ConfigError> {
        let network_key = format!("{}_NETWORK", prefix);
        let network = match lookup(&network_key).filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse::<Network>().map_err(|_| ConfigError::InvalidValue {
                field: network_key,
                value: raw.clone(),
                reason: "expected tcp, tcp4 or tcp6".to_string(),
            })?,
            None => defaults.network,
        };
        let addr = lookup(&format!("{}_ADDR", prefix))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.addr);
        let timeout_key = format!("{}_TIMEOUT_MS", prefix);
        let timeout =
            parse_millis(&timeout_key, lookup(&timeout_key).as_deref(), defaults.timeout)?;
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: timeout_key,
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }

        Ok(Self {
            network,
            addr,
            timeout,
        })
    }
}

/// Both listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http: TransportConfig,
    pub grpc: TransportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http: TransportConfig::http_default(),
            grpc: TransportConfig::grpc_default(),
        }
    }
}

impl ServerConfig {
    /// Create a server configuration from environment variables.
    ///
    /// - `DUPLEX_HTTP_NETWORK` / `DUPLEX_GRPC_NETWORK`: `tcp`, `tcp4`, `tcp6`
    /// - `DUPLEX_HTTP_ADDR` (default 0.0.0.0:8000) / `DUPLEX_GRPC_ADDR` (default 0.0.0.0:9000)
    /// - `DUPLEX_HTTP_TIMEOUT_MS` / `DUPLEX_GRPC_TIMEOUT_MS` (default 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Lookup) -> Result<Self, ConfigError> {
        Ok(Self {
            http: TransportConfig::from_lookup(
                "DUPLEX_HTTP",
                TransportConfig::http_default(),
                &lookup,
            )?,
            grpc: TransportConfig::from_lookup(
                "DUPLEX_GRPC",
                TransportConfig::grpc_default(),
                &lookup,
            )?,
        })
    }

    /// Both listeners on loopback ephemeral ports.
    pub fn ephemeral() -> Self {
        Self {
            http: TransportConfig::ephemeral(),
            grpc: TransportConfig::ephemeral(),
        }
    }
}

// ============================================================================
// LOGGING CONFIGURATION
// ============================================================================

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue {
                field: "DUPLEX_LOG_FORMAT".to_string(),
                value: other.to_string(),
                reason: "expected json or pretty".to_string(),
            }),
        }
    }
}

// ============================================================================
// APPLICATION CONFIGURATION
// ============================================================================

/// Everything the binary reads at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data: DataConfig,
    pub server: ServerConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Lookup) -> Result<Self, ConfigError> {
        let log_format = match lookup("DUPLEX_LOG_FORMAT").filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };
        Ok(Self {
            data: DataConfig::from_lookup(&lookup)?,
            server: ServerConfig::from_lookup(&lookup)?,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> Result<(), ConfigError> {
        let config = ServerConfig::from_lookup(lookup_from(&[]))?;
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.http.addr, "0.0.0.0:8000");
        assert_eq!(config.grpc.addr, "0.0.0.0:9000");
        assert_eq!(config.grpc.timeout, Duration::from_secs(1));
        assert_eq!(config.http.network, Network::Tcp);
        Ok(())
    }

    #[test]
    fn test_each_field_is_optional() -> Result<(), ConfigError> {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DUPLEX_HTTP_NETWORK", "tcp6"),
            ("DUPLEX_GRPC_TIMEOUT_MS", "2500"),
        ]))?;
        assert_eq!(config.http.network, Network::Tcp6);
        assert_eq!(config.http.addr, "0.0.0.0:8000");
        assert_eq!(config.grpc.timeout, Duration::from_millis(2500));
        assert_eq!(config.grpc.addr, "0.0.0.0:9000");
        Ok(())
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServerConfig::from_lookup(lookup_from(&[("DUPLEX_HTTP_NETWORK", "udp")])).is_err());
        for bad in ["soon", "0"] {
            let lookup = lookup_from(&[("DUPLEX_GRPC_TIMEOUT_MS", bad)]);
            assert!(ServerConfig::from_lookup(lookup).is_err(), "accepted {:?}", bad);
        }
        assert!(AppConfig::from_lookup(lookup_from(&[("DUPLEX_LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_network_accepts() {
        let v4: SocketAddr = "127.0.0.1:80".parse().expect("valid addr");
        let v6: SocketAddr = "[::1]:80".parse().expect("valid addr");
        assert!(Network::Tcp.accepts(&v4) && Network::Tcp.accepts(&v6));
        assert!(Network::Tcp4.accepts(&v4) && !Network::Tcp4.accepts(&v6));
        assert!(Network::Tcp6.accepts(&v6) && !Network::Tcp6.accepts(&v4));
    }

    #[test]
    fn test_app_config_combines_sections() -> Result<(), ConfigError> {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DUPLEX_STORE_DRIVER", "memory"),
            ("DUPLEX_LOG_FORMAT", "pretty"),
        ]))?;
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.data.store.driver, duplex_storage::StoreDriver::Memory);
        Ok(())
    }
}
