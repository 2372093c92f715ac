//! Utilities shared by the taskboard binaries: logging setup and clocks.

pub mod logger;
pub mod time;
