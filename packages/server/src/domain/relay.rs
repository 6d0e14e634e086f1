//! Relay (TURN) credential types.

use std::fmt;

/// Static settings of the external relay service.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub secret: String,
    pub realm: String,
    pub ttl_secs: u64,
    pub urls: Vec<String>,
}

impl RelayConfig {
    /// Returns `None` when the secret or the URL list is missing, which disables the
    /// credential endpoint.
    pub fn from_parts(
        secret: Option<String>,
        realm: String,
        ttl_secs: u64,
        urls: Vec<String>,
    ) -> Option<Self> {
        let secret = secret.filter(|s| !s.is_empty())?;
        let urls: Vec<String> = urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if urls.is_empty() {
            return None;
        }
        Some(Self {
            secret,
            realm,
            ttl_secs,
            urls,
        })
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("secret", &"<redacted>")
            .field("realm", &self.realm)
            .field("ttl_secs", &self.ttl_secs)
            .field("urls", &self.urls)
            .finish()
    }
}

/// Time-limited credential set handed to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCredentials {
    pub urls: Vec<String>,
    /// `"<expiry>:anon"`, expiry in unix seconds.
    pub username: String,
    pub credential: String,
    pub ttl_secs: u64,
    pub realm: String,
}
