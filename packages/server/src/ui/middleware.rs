//! HTTP middleware.

use std::{collections::HashMap, net::IpAddr, net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use yoriai_shared::time::Clock;

use crate::domain::{RatePolicy, RateWindow, Timestamp};

use super::state::AppState;

/// Expired windows are pruned once the table grows past this many addresses.
const PRUNE_THRESHOLD: usize = 10_000;

/// Fixed-window request counter per client address.
pub struct ApiRateLimiter {
    policy: RatePolicy,
    windows: Mutex<HashMap<IpAddr, RateWindow>>,
    clock: Arc<dyn Clock>,
}

impl ApiRateLimiter {
    pub fn new(policy: RatePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Count one request from `ip`; `false` once the address is over its budget.
    pub async fn check(&self, ip: IpAddr) -> bool {
        let now = Timestamp::new(self.clock.now_millis());
        let mut windows = self.windows.lock().await;

        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|_, window| !window.is_expired(&self.policy, now));
        }

        windows
            .entry(ip)
            .or_insert_with(|| RateWindow::new(now))
            .hit(&self.policy, now)
    }
}

pub async fn limit_api_requests(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !state.api_rate_limiter.check(addr.ip()).await {
        tracing::warn!("Rate limit exceeded for {} on {}", addr.ip(), request.uri());
        return (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response();
    }
    next.run(request).await
}
