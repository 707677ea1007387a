//! AndinaTrading contracts service.
//!
//! Persists intermediation contracts in SQLite, drives their lifecycle
//! through the [`intermediation`] rules and renders a PDF for every change.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod render;
