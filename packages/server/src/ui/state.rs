//! Shared application state.

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{TokenVerifier, UserRepository},
    infrastructure::{room_directory::RoomDirectory, session_registry::SessionRegistry},
    usecase::{AiChatUseCase, ConnectionGateway, NotificationFanout, SuggestTaskUseCase, TeamUseCase, TodoUseCase},
};

pub struct AppState {
    /// ConnectionGateway（WebSocket 接続のライフサイクル）
    pub connection_gateway: Arc<ConnectionGateway>,
    pub todo_usecase: Arc<TodoUseCase>,
    pub team_usecase: Arc<TeamUseCase>,
    pub notification_fanout: Arc<NotificationFanout>,
    pub suggest_task_usecase: Arc<SuggestTaskUseCase>,
    pub ai_chat_usecase: Arc<AiChatUseCase>,
    /// Bearer token verification for HTTP requests
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub user_repository: Arc<dyn UserRepository>,
    /// Read-only views for the debug endpoint
    pub room_directory: Arc<RoomDirectory>,
    pub session_registry: Arc<SessionRegistry>,
    pub handshake_timeout: Duration,
}
