mod http;
mod websocket;

pub use http::{get_activities, get_evacuations, get_incidents, health_check};
pub use websocket::websocket_handler;
