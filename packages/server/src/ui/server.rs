//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use taskboard_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{MessagePusher, TextGenerationError, TextGenerator},
    infrastructure::{
        auth::JwtTokenVerifier,
        dispatcher::EventDispatcher,
        message_pusher::WebSocketMessagePusher,
        repository::{
            InMemoryNotificationRepository, InMemoryTeamRepository, InMemoryTodoRepository,
            InMemoryUserRepository,
        },
        room_directory::RoomDirectory,
        session_registry::SessionRegistry,
        text_generator::OpenAiTextGenerator,
    },
    usecase::{
        AiChatUseCase, ConnectionGateway, NotificationFanout, SuggestTaskUseCase, TeamUseCase,
        TodoUseCase,
    },
};

use super::{
    handler::{
        add_team_member, ai_chat, create_team, create_todo, debug_rooms, delete_todo, get_todo,
        health_check, list_notifications, list_team_members, list_teams, list_todos,
        suggest_task, update_todo, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Task board server: HTTP API plus the realtime WebSocket gateway
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::parse();
/// let server = Server::from_config(&config)?;
/// server.run(config.host.clone(), config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Delivery workers; stopped once the listener has drained
    dispatcher: Arc<EventDispatcher>,
}

impl Server {
    /// Wire every layer together.
    ///
    /// Must be called inside a tokio runtime, since the delivery workers are
    /// spawned here.
    ///
    /// # Errors
    ///
    /// Returns an error if the AI provider client cannot be built.
    pub fn from_config(config: &ServerConfig) -> Result<Self, TextGenerationError> {
        // Initialize dependencies in order:
        // 1. Repositories
        // 2. MessagePusher and connection bookkeeping
        // 3. Event delivery
        // 4. Token verification
        // 5. UseCases
        // 6. AppState

        // 1. Create Repositories (in-memory database)
        let user_repository = Arc::new(InMemoryUserRepository::new());
        let team_repository = Arc::new(InMemoryTeamRepository::new());
        let todo_repository = Arc::new(InMemoryTodoRepository::new());
        let notification_repository = Arc::new(InMemoryNotificationRepository::new());

        // 2. Create MessagePusher (WebSocket implementation), rooms and sessions
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let room_directory = Arc::new(RoomDirectory::new(message_pusher.clone()));
        let session_registry = Arc::new(SessionRegistry::new());

        // 3. Start the delivery workers
        let dispatcher = Arc::new(EventDispatcher::start(
            room_directory.clone(),
            config.delivery_workers,
        ));

        // 4. Token verification
        let token_verifier = Arc::new(JwtTokenVerifier::new(&config.jwt_secret));

        // 5. Create UseCases
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let notification_fanout = Arc::new(NotificationFanout::new(
            notification_repository,
            dispatcher.clone(),
            clock.clone(),
        ));
        let todo_usecase = Arc::new(TodoUseCase::new(
            todo_repository,
            team_repository.clone(),
            user_repository.clone(),
            dispatcher.clone(),
            notification_fanout.clone(),
            clock.clone(),
        ));
        let team_usecase = Arc::new(TeamUseCase::new(
            team_repository.clone(),
            user_repository.clone(),
            clock,
        ));
        let text_generator: Option<Arc<dyn TextGenerator>> = match config.openai() {
            Some(openai) => {
                tracing::info!("Task suggestions and chat use model '{}'", openai.model);
                Some(Arc::new(OpenAiTextGenerator::new(openai)?))
            }
            None => {
                tracing::info!("No AI provider configured, task suggestions and chat use local replies");
                None
            }
        };
        let ai_chat_usecase = Arc::new(AiChatUseCase::new(text_generator.clone()));
        let suggest_task_usecase = Arc::new(SuggestTaskUseCase::new(text_generator));
        let connection_gateway = Arc::new(ConnectionGateway::new(
            token_verifier.clone(),
            session_registry.clone(),
            room_directory.clone(),
            message_pusher,
            user_repository.clone(),
            team_repository,
        ));

        // 6. AppState
        let state = Arc::new(AppState {
            connection_gateway,
            todo_usecase,
            team_usecase,
            notification_fanout,
            suggest_task_usecase,
            ai_chat_usecase,
            token_verifier,
            user_repository,
            room_directory,
            session_registry,
            handshake_timeout: config.handshake_timeout(),
        });

        Ok(Self { state, dispatcher })
    }

    /// Build the router over the shared state
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/debug/rooms", get(debug_rooms))
            .route("/api/health", get(health_check))
            .route("/api/teams", get(list_teams).post(create_team))
            .route(
                "/api/teams/{team_id}/members",
                get(list_team_members).post(add_team_member),
            )
            .route("/api/todos", get(list_todos).post(create_todo))
            .route(
                "/api/todos/{todo_id}",
                get(get_todo).patch(update_todo).delete(delete_todo),
            )
            .route("/api/notifications", get(list_notifications))
            .route("/api/ai/suggest", post(suggest_task))
            .route("/api/ai/chat", post(ai_chat))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves, then
    /// stop the delivery workers.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        self.dispatcher.shutdown();
        tracing::info!("Server shutdown complete");

        result
    }

    /// Run the server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Task board server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        Ok(())
    }
}
