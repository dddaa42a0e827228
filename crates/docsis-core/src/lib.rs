//! Domain types, port traits, and shared error taxonomy for the DOCSIS
//! upgrade controller. Depends on nothing but `serde`/`async-trait`/
//! `thiserror` — no `sqlx`, no `axum`, no `csnmp`. Every other crate in the
//! workspace depends on this one, never the reverse.

pub mod clock;
pub mod config;
pub mod error;
pub mod mac;
pub mod ports;
pub mod types;

pub use error::{CoreError, Result};
