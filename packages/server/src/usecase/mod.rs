//! UseCase 層
//!
//! Application logic that coordinates the domain seams: the connection
//! gateway, notification fan-out, todo and team management, and task
//! suggestions and short AI chat replies.

pub mod ai_chat;
pub mod connection_gateway;
pub mod error;
pub mod notification_fanout;
pub mod suggest_task;
pub mod team;
pub mod todo;

pub use ai_chat::{AiChatUseCase, ChatReply};
pub use connection_gateway::{ConnectionGateway, Disposition, HandshakeData};
pub use error::{ChatError, ConnectError, NotifyError, SuggestError, TeamError, TodoError};
pub use notification_fanout::{NOTIFICATION_LIST_LIMIT, NotificationFanout};
pub use suggest_task::{SuggestTaskUseCase, TaskSuggestion};
pub use team::{TeamMember, TeamUseCase, TeamWithRole};
pub use todo::{CreateTodo, TodoPatch, TodoUseCase};
