//! HTTP and WebSocket surface of the signaling server.

mod handler;
mod middleware;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
