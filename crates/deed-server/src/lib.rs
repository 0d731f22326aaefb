//! HTTP server for the Deed Ledger.
//!
//! A thin axum boundary over [`deed_ledger::Ledger`]: append an entry,
//! verify a property chain, list a property's or a survey's history.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::{open_store, DeedServer};
