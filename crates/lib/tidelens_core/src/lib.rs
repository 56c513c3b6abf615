//! # tidelens_core
//!
//! Account and authentication domain logic for Tidelens.

pub mod account;
pub mod auth;
pub mod db;
pub mod mail;
pub mod migrate;
pub mod models;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
