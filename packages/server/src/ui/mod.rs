//! UI 層
//!
//! axum server, routes, extractors and request handlers.

pub mod auth;
pub mod error;
pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
