//! Per-connection size and rate policy.
//!
//! The window is a fixed window with lazy reset: it restarts on the first message that
//! arrives after it has elapsed.

use super::message_pusher::CloseReason;
use super::value_object::Timestamp;

/// Largest inbound frame accepted, in bytes.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_messages: u32,
    pub window_ms: i64,
}

impl RatePolicy {
    /// WebSocket messages per connection.
    pub const WEBSOCKET: Self = Self {
        max_messages: 240,
        window_ms: 60_000,
    };

    /// HTTP API requests per client address.
    pub const HTTP_API: Self = Self {
        max_messages: 300,
        window_ms: 60_000,
    };
}

/// Counter for one fixed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    window_start: Timestamp,
    count: u32,
}

impl RateWindow {
    pub fn new(now: Timestamp) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    pub fn is_expired(&self, policy: &RatePolicy, now: Timestamp) -> bool {
        now.value() - self.window_start.value() > policy.window_ms
    }

    /// Count one message. Returns `false` once the window holds more than the policy allows.
    pub fn hit(&mut self, policy: &RatePolicy, now: Timestamp) -> bool {
        if self.is_expired(policy, now) {
            self.window_start = now;
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
        self.count <= policy.max_messages
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Size ceiling plus rate window for one connection.
#[derive(Debug, Clone)]
pub struct FrameGuard {
    policy: RatePolicy,
    max_frame_bytes: usize,
    window: RateWindow,
}

impl FrameGuard {
    pub fn new(now: Timestamp) -> Self {
        Self::with_limits(RatePolicy::WEBSOCKET, MAX_FRAME_BYTES, now)
    }

    pub fn with_limits(policy: RatePolicy, max_frame_bytes: usize, now: Timestamp) -> Self {
        Self {
            policy,
            max_frame_bytes,
            window: RateWindow::new(now),
        }
    }

    /// Oversize frames are refused before they are counted.
    pub fn admit(&mut self, frame_len: usize, now: Timestamp) -> Result<(), CloseReason> {
        if frame_len > self.max_frame_bytes {
            return Err(CloseReason::MessageTooBig);
        }
        if !self.window.hit(&self.policy, now) {
            return Err(CloseReason::RateLimited);
        }
        Ok(())
    }
}
