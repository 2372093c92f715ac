//! Infrastructure 層
//!
//! Concrete implementations of the domain seams plus the in-memory realtime
//! tables (session registry, room directory) and the delivery worker pool.

pub mod auth;
pub mod dispatcher;
pub mod dto;
pub mod message_pusher;
pub mod repository;
pub mod room_directory;
pub mod session_registry;
pub mod text_generator;
