//! Request handlers, split by protocol.

pub mod http;
pub mod websocket;

pub use http::{
    add_team_member, ai_chat, create_team, create_todo, debug_rooms, delete_todo, get_todo, health_check,
    list_notifications, list_team_members, list_teams, list_todos, suggest_task, update_todo,
};
pub use websocket::websocket_handler;
