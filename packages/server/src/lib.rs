//! Presence and call-signaling relay server.
//!
//! Clients open a WebSocket, join password-protected rooms, see who else is there
//! and relay opaque WebRTC signaling payloads to one another. Peer media never
//! passes through this server.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
