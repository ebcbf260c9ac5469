mod codec;
pub mod config;
pub mod error;
pub mod model;
mod urgency;
