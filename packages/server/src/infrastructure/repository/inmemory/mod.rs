//! InMemory repository 実装
//!
//! Each store is a `tokio::sync::RwLock` over plain collections. Entities go
//! in and come out by value; nothing outside the lock holds a reference into
//! storage.

mod notification;
mod team;
mod todo;
mod user;

pub use notification::InMemoryNotificationRepository;
pub use team::InMemoryTeamRepository;
pub use todo::InMemoryTodoRepository;
pub use user::InMemoryUserRepository;
