//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use taskboard_shared::time::to_rfc3339_millis;

use crate::{
    domain::{NotificationPayload, TeamId, TeamPayload, TodoId, TodoPayload},
    infrastructure::dto::http::{
        AddMemberRequest, AiChatRequest, CreateTeamRequest, CreateTodoRequest, DebugRoomsResponse,
        DeletedResponse, HealthResponse, MemberResponse, SuggestTaskRequest, TeamWithRoleResponse,
        TodoListQuery, UpdateTodoRequest,
    },
    ui::{auth::AuthUser, error::ApiError, state::AppState},
    usecase::{ChatReply, TaskSuggestion},
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        time: to_rfc3339_millis(Utc::now()),
    })
}

/// Debug endpoint: live sessions and room → member count
pub async fn debug_rooms(State(state): State<Arc<AppState>>) -> Json<DebugRoomsResponse> {
    Json(DebugRoomsResponse {
        sessions: state.session_registry.len(),
        rooms: state.room_directory.snapshot(),
    })
}

// ========================================
// Teams
// ========================================

pub async fn list_teams(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<TeamWithRoleResponse>>, ApiError> {
    let teams = state.team_usecase.list_mine(&identity.user_id).await?;
    Ok(Json(teams.into_iter().map(TeamWithRoleResponse::from).collect()))
}

pub async fn create_team(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamPayload>), ApiError> {
    let team = state
        .team_usecase
        .create(&identity.user_id, &request.name, request.description)
        .await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn list_team_members(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(team_id): Path<TeamId>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state.team_usecase.members(&identity.user_id, &team_id).await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

pub async fn add_team_member(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(team_id): Path<TeamId>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let member = state
        .team_usecase
        .add_member(&identity.user_id, &team_id, &request.email, request.role)
        .await?;
    Ok((StatusCode::CREATED, Json(member.into())))
}

// ========================================
// Todos
// ========================================

pub async fn list_todos(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(query): Query<TodoListQuery>,
) -> Result<Json<Vec<TodoPayload>>, ApiError> {
    let todos = state
        .todo_usecase
        .list(&identity.user_id, &query.team_id)
        .await?;
    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Json(request): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoPayload>), ApiError> {
    let todo = state
        .todo_usecase
        .create(&identity.user_id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(todo_id): Path<TodoId>,
) -> Result<Json<TodoPayload>, ApiError> {
    let todo = state.todo_usecase.find(&identity.user_id, &todo_id).await?;
    Ok(Json(todo))
}

pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(todo_id): Path<TodoId>,
    Json(request): Json<UpdateTodoRequest>,
) -> Result<Json<TodoPayload>, ApiError> {
    let todo = state
        .todo_usecase
        .update(&identity.user_id, &todo_id, request.into())
        .await?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(todo_id): Path<TodoId>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state
        .todo_usecase
        .delete(&identity.user_id, &todo_id)
        .await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

// ========================================
// Notifications / AI
// ========================================

/// The caller's 50 newest notifications, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<NotificationPayload>>, ApiError> {
    let notifications = state
        .notification_fanout
        .list_for_user(&identity.user_id)
        .await?;
    Ok(Json(
        notifications.iter().map(NotificationPayload::from).collect(),
    ))
}

pub async fn suggest_task(
    State(state): State<Arc<AppState>>,
    AuthUser(_identity): AuthUser,
    Json(request): Json<SuggestTaskRequest>,
) -> Result<Json<TaskSuggestion>, ApiError> {
    let suggestion = state
        .suggest_task_usecase
        .suggest(&request.prompt, request.team_context.as_deref())
        .await?;
    Ok(Json(suggestion))
}

pub async fn ai_chat(
    State(state): State<Arc<AppState>>,
    AuthUser(_identity): AuthUser,
    Json(request): Json<AiChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state.ai_chat_usecase.chat(&request.message).await?;
    Ok(Json(reply))
}
