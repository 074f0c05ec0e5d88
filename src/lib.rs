//! Alarm search form compiler
//!
//! Turns declarative alarm search forms into boolean queries for a
//! document-search engine. See [`search`] for the compiler itself and
//! [`api`] for the HTTP adapter.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod search;
