//! Siaga real-time broadcast hub.
//!
//! Accepts WebSocket observers, validates and stamps the events they push,
//! hands them to the storage collaborator and fans them out to every live
//! connection. Also drives the ambient signal (weather) random walk.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
