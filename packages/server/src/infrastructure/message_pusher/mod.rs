//! メッセージ送信（通知）の実装
//!
//! ## 実装
//!
//! - `websocket`: per-connection outbound channels drained by each socket's
//!   writer task

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
