//! Server configuration.
//!
//! The binary parses command-line arguments and environment variables into a
//! `ServerConfig`; nothing below this module reads the environment.

use thiserror::Error;

use crate::domain::RelayConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RELAY_REALM: &str = "example.com";
pub const DEFAULT_RELAY_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("relay realm must not be empty")]
    EmptyRealm,

    #[error("relay credential TTL must be greater than zero")]
    ZeroTtl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// WebSocket handshakes carrying a different `Origin` are refused.
    pub allowed_origin: Option<String>,
    /// `None` disables `GET /api/turn`.
    pub relay: Option<RelayConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: None,
            relay: None,
        }
    }
}

impl ServerConfig {
    pub fn new(
        host: String,
        port: u16,
        allowed_origin: Option<String>,
        relay: Option<RelayConfig>,
    ) -> Result<Self, ConfigError> {
        if let Some(relay) = &relay {
            if relay.realm.trim().is_empty() {
                return Err(ConfigError::EmptyRealm);
            }
            if relay.ttl_secs == 0 {
                return Err(ConfigError::ZeroTtl);
            }
        }

        Ok(Self {
            host,
            port,
            allowed_origin: allowed_origin.filter(|origin| !origin.trim().is_empty()),
            relay,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connections without an `Origin` header are always accepted.
    pub fn is_origin_allowed(&self, origin: Option<&str>) -> bool {
        match (&self.allowed_origin, origin) {
            (Some(allowed), Some(origin)) => allowed == origin,
            _ => true,
        }
    }
}

/// Split a comma-separated URL list.
pub fn parse_url_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(realm: &str, ttl_secs: u64) -> Option<RelayConfig> {
        RelayConfig::from_parts(
            Some("secret".to_string()),
            realm.to_string(),
            ttl_secs,
            vec!["turn:turn.example.com:3478".to_string()],
        )
    }

    #[test]
    fn test_new_validates_relay_settings() {
        // テスト項目: リレー設定の realm が空、または TTL が 0 の場合はエラーになる
        // given (前提条件):
        let host = DEFAULT_HOST.to_string();

        // when (操作):
        let empty_realm = ServerConfig::new(host.clone(), 3000, None, relay(" ", 60));
        let zero_ttl = ServerConfig::new(host.clone(), 3000, None, relay("example.com", 0));
        let disabled = ServerConfig::new(host, 3000, None, None);

        // then (期待する結果):
        assert_eq!(empty_realm, Err(ConfigError::EmptyRealm));
        assert_eq!(zero_ttl, Err(ConfigError::ZeroTtl));
        assert!(disabled.is_ok());
    }

    #[test]
    fn test_origin_check() {
        // テスト項目: 許可オリジンが設定されている場合、異なる Origin のみ拒否される
        // given (前提条件):
        let config = ServerConfig::new(
            "127.0.0.1".to_string(),
            3000,
            Some("https://app.example.com".to_string()),
            None,
        )
        .unwrap();
        let open = ServerConfig::default();

        // when (操作):
        let same = config.is_origin_allowed(Some("https://app.example.com"));
        let other = config.is_origin_allowed(Some("https://evil.example.com"));
        let missing = config.is_origin_allowed(None);

        // then (期待する結果):
        assert!(same);
        assert!(!other);
        assert!(missing);
        assert!(open.is_origin_allowed(Some("https://anything.example.com")));
    }

    #[test]
    fn test_parse_url_list() {
        // テスト項目: カンマ区切りの URL リストが分割され、空要素は除かれる
        // given (前提条件):
        let value = "turn:a:3478, turns:a:5349 ,,";

        // when (操作):
        let urls = parse_url_list(value);

        // then (期待する結果):
        assert_eq!(urls, vec!["turn:a:3478", "turns:a:5349"]);
    }
}
