//! HTTP API request / response DTOs.
//!
//! Request bodies accept both `snake_case` and the `camelCase` spellings web
//! clients tend to send. Responses use `snake_case`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    domain::{TeamId, TeamPayload, TeamRole, TodoStatus, UserId, UserPayload},
    usecase::{CreateTodo, TeamMember, TeamWithRole, TodoPatch},
};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DebugRoomsResponse {
    pub sessions: usize,
    /// Room key → member count
    pub rooms: BTreeMap<String, usize>,
}

// ========================================
// Teams
// ========================================

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    #[serde(default)]
    pub role: Option<TeamRole>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamWithRoleResponse {
    #[serde(flatten)]
    pub team: TeamPayload,
    pub role: TeamRole,
}

impl From<TeamWithRole> for TeamWithRoleResponse {
    fn from(value: TeamWithRole) -> Self {
        Self {
            team: value.team,
            role: value.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberResponse {
    pub user: UserPayload,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

impl From<TeamMember> for MemberResponse {
    fn from(member: TeamMember) -> Self {
        Self {
            user: UserPayload::from(&member.user),
            role: member.membership.role,
            joined_at: member.membership.created_at,
        }
    }
}

// ========================================
// Todos
// ========================================

#[derive(Debug, Deserialize)]
pub struct TodoListQuery {
    #[serde(rename = "teamId", alias = "team_id")]
    pub team_id: TeamId,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<TodoStatus>,
    #[serde(alias = "teamId")]
    pub team_id: TeamId,
    #[serde(default, alias = "assigneeId")]
    pub assignee_id: Option<UserId>,
}

impl From<CreateTodoRequest> for CreateTodo {
    fn from(request: CreateTodoRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            due_date: request.due_date,
            status: request.status,
            team_id: request.team_id,
            assignee_id: request.assignee_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "dueDate", deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub status: Option<TodoStatus>,
    #[serde(default, alias = "assigneeId", deserialize_with = "double_option")]
    pub assignee_id: Option<Option<UserId>>,
}

impl From<UpdateTodoRequest> for TodoPatch {
    fn from(request: UpdateTodoRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            due_date: request.due_date,
            status: request.status,
            assignee_id: request.assignee_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// ========================================
// AI
// ========================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestTaskRequest {
    pub prompt: String,
    #[serde(default, alias = "team_context")]
    pub team_context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AiChatRequest {
    pub message: String,
}
