//! Types shared between the Siaga broadcast hub and its observer clients.

pub mod logger;
pub mod protocol;
pub mod signal;
pub mod time;
