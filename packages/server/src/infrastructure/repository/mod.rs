//! Repository 実装
//!
//! ドメイン層が定義する repository trait の具体的な実装を提供します。

pub mod inmemory;

pub use inmemory::{
    InMemoryNotificationRepository, InMemoryTeamRepository, InMemoryTodoRepository,
    InMemoryUserRepository,
};
