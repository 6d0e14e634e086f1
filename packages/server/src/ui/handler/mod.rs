//! Request handlers.

mod http;
mod websocket;

pub use http::{get_rooms, get_turn_credentials, health_check};
pub use websocket::websocket_handler;
