//! UI layer: HTTP / WebSocket surface of the hub.

mod handler;
mod middleware;
mod server;
mod signal;
pub mod state;

pub use server::Server;
