//! Team task board server library.
//!
//! HTTP API for teams, todos and notifications, plus a WebSocket gateway that
//! pushes change events to the rooms each connection has joined.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
