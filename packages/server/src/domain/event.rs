//! Typed server events and the envelope handed to the dispatcher.
//!
//! Every payload is a resolved snapshot: ids, strings and timestamps only.
//! Frames are serialized as `{"event": "<name>", "data": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    entity::{Notification, NotificationType, Team, Todo, TodoStatus, User},
    value_object::{NotificationId, RoomKey, TeamId, TodoId, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPayload {
    pub id: TeamId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserPayload>,
}

impl TeamPayload {
    pub fn resolve(team: &Team, owner: Option<&User>) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            description: team.description.clone(),
            owner_id: team.owner_id,
            created_at: team.created_at,
            updated_at: team.updated_at,
            owner: owner.map(UserPayload::from),
        }
    }
}

/// Read representation of a todo, shared by the HTTP API and the
/// `todo.created` / `todo.updated` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPayload {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TodoStatus,
    pub team_id: TeamId,
    pub assignee_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub team: Option<TeamPayload>,
    pub assignee: Option<UserPayload>,
}

impl TodoPayload {
    /// Materialize a todo together with its team (and owner) and assignee.
    pub fn resolve(
        todo: &Todo,
        team: Option<&Team>,
        owner: Option<&User>,
        assignee: Option<&User>,
    ) -> Self {
        Self {
            id: todo.id,
            title: todo.title.clone(),
            description: todo.description.clone(),
            due_date: todo.due_date,
            status: todo.status,
            team_id: todo.team_id,
            assignee_id: todo.assignee_id,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
            team: team.map(|team| TeamPayload::resolve(team, owner)),
            assignee: assignee.map(UserPayload::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDeletedPayload {
    pub id: TodoId,
    pub team_id: TeamId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub id: NotificationId,
    pub user_id: UserId,
    pub team_id: Option<TeamId>,
    pub r#type: NotificationType,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationPayload {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            user_id: notification.user_id,
            team_id: notification.team_id,
            r#type: notification.r#type,
            message: notification.message.clone(),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamJoinedPayload {
    #[serde(rename = "teamId")]
    pub team_id: String,
}

/// Every event the server emits to rooms or connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
    #[serde(rename = "todo.created")]
    TodoCreated(TodoPayload),
    #[serde(rename = "todo.updated")]
    TodoUpdated(TodoPayload),
    #[serde(rename = "todo.deleted")]
    TodoDeleted(TodoDeletedPayload),
    #[serde(rename = "notification.created")]
    NotificationCreated(NotificationPayload),
    #[serde(rename = "team.joined")]
    TeamJoined(TeamJoinedPayload),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::TodoCreated(_) => "todo.created",
            Event::TodoUpdated(_) => "todo.updated",
            Event::TodoDeleted(_) => "todo.deleted",
            Event::NotificationCreated(_) => "notification.created",
            Event::TeamJoined(_) => "team.joined",
        }
    }

    /// Serialize as a wire frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Resolved `{event, room, payload}` triple submitted for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    pub room: RoomKey,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(room: RoomKey, event: Event) -> Self {
        Self { room, event }
    }
}
