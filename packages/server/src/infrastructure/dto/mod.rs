//! Data Transfer Objects (DTOs) for the signaling server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frames
//! - `http`: HTTP API responses

pub mod conversion;
pub mod http;
pub mod websocket;
