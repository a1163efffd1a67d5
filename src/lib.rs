//! # Sheets Config Agent Library
//!
//! Serves spreadsheet rows as typed key-value configuration over HTTP
//! and keeps the delegated OAuth2 credential used to read them valid.
//!
//! Modules:
//! - `config`: service configuration and the static application identity
//! - `credentials`: credential record, its durable store and the background refresher
//! - `parser`: coercion of raw cells into typed values
//! - `cache`: per-namespace configuration cache with freshness policies
//! - `sources`: spreadsheet row fetch and OAuth2 token exchange
//! - `server`: HTTP gateway

pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod server;
pub mod sources;
pub mod utils;

pub use crate::config::service::ServiceConfig;
pub use crate::error::ServiceError;
pub use crate::parser::coercion::{coerce, ConfigValue};
