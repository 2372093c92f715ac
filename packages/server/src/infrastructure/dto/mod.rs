//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: gateway frames (handshake, control messages)
//! - `http`: HTTP API request / response bodies

pub mod http;
pub mod websocket;
