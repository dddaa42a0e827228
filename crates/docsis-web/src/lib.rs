//! The management REST API (spec.md §6), built on `axum` following the
//! teacher's router/handlers/error/state split.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
