//! Transport-layer services.

pub mod client;
pub mod cookies;
