//! UseCase: リレー（TURN）認証情報の発行
//!
//! TURN REST API 方式の時間制限付き認証情報を発行する。
//!
//! - username = `"<有効期限の unix 秒>:anon"`
//! - credential = `base64(HMAC-SHA1(secret, username))`
//!
//! ユーザーを識別する情報は含めない。有効期限までは誰でも使える。

use std::sync::Arc;

use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use yoriai_shared::time::Clock;

use crate::domain::{RelayConfig, RelayCredentials};

use super::error::RelayCredentialsError;

type HmacSha1 = Hmac<Sha1>;

pub struct IssueRelayCredentialsUseCase {
    config: Option<RelayConfig>,
    clock: Arc<dyn Clock>,
}

impl IssueRelayCredentialsUseCase {
    /// `config` が `None` の場合、発行は常に `NotConfigured` になる
    pub fn new(config: Option<RelayConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn execute(&self) -> Result<RelayCredentials, RelayCredentialsError> {
        let config = self
            .config
            .as_ref()
            .ok_or(RelayCredentialsError::NotConfigured)?;

        let ttl_secs = i64::try_from(config.ttl_secs).unwrap_or(i64::MAX);
        let expiry = self.clock.now_secs().saturating_add(ttl_secs);
        let username = format!("{expiry}:anon");
        let credential = sign(&config.secret, &username)?;

        Ok(RelayCredentials {
            urls: config.urls.clone(),
            username,
            credential,
            ttl_secs: config.ttl_secs,
            realm: config.realm.clone(),
        })
    }
}

fn sign(secret: &str, username: &str) -> Result<String, RelayCredentialsError> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| RelayCredentialsError::SigningFailed(e.to_string()))?;
    mac.update(username.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
