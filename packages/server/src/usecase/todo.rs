//! UseCase: todo management
//!
//! Every mutation commits its write first, then publishes the change to the
//! team room and hands the policy's notification intents to the fan-out.
//! Delivery problems after the write are logged; the mutation still succeeds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskboard_shared::time::Clock;

use crate::domain::{
    Event, EventPublisher, NotificationIntent, NotificationPolicy, RoomKey, TeamId, TeamRepository,
    Todo, TodoDeletedPayload, TodoId, TodoPayload, TodoRepository, TodoStatus, UserId,
    UserRepository,
};

use super::{error::TodoError, notification_fanout::NotificationFanout};

const MIN_TITLE_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TodoStatus>,
    pub team_id: TeamId,
    pub assignee_id: Option<UserId>,
}

/// Partial update. For the double options, `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<TodoStatus>,
    pub assignee_id: Option<Option<UserId>>,
}

pub struct TodoUseCase {
    todos: Arc<dyn TodoRepository>,
    teams: Arc<dyn TeamRepository>,
    users: Arc<dyn UserRepository>,
    publisher: Arc<dyn EventPublisher>,
    fanout: Arc<NotificationFanout>,
    clock: Arc<dyn Clock>,
}

impl TodoUseCase {
    pub fn new(
        todos: Arc<dyn TodoRepository>,
        teams: Arc<dyn TeamRepository>,
        users: Arc<dyn UserRepository>,
        publisher: Arc<dyn EventPublisher>,
        fanout: Arc<NotificationFanout>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            todos,
            teams,
            users,
            publisher,
            fanout,
            clock,
        }
    }

    pub async fn create(&self, actor: &UserId, input: CreateTodo) -> Result<TodoPayload, TodoError> {
        let title = validate_title(&input.title)?;
        self.ensure_member(&input.team_id, actor).await?;
        if let Some(assignee) = &input.assignee_id {
            self.ensure_assignable(&input.team_id, assignee).await?;
        }

        let now = self.clock.now();
        let todo = Todo {
            id: TodoId::generate(),
            title,
            description: input.description,
            due_date: input.due_date,
            status: input.status.unwrap_or_default(),
            team_id: input.team_id,
            assignee_id: input.assignee_id,
            created_at: now,
            updated_at: now,
        };
        let todo = self.todos.insert(todo).await?;
        tracing::info!("Todo '{}' created in team '{}'", todo.id, todo.team_id);

        let payload = self.resolve(&todo).await?;
        self.publisher.publish(
            RoomKey::for_team(todo.team_id),
            Event::TodoCreated(payload.clone()),
        );
        self.notify(
            &todo,
            NotificationPolicy::on_created(*actor, todo.assignee_id, &todo.title),
        )
        .await;

        Ok(payload)
    }

    /// Todos of a team: due date ascending with undated last, then newest first
    pub async fn list(&self, actor: &UserId, team_id: &TeamId) -> Result<Vec<TodoPayload>, TodoError> {
        self.ensure_member(team_id, actor).await?;

        let mut todos = self.todos.list_by_team(team_id).await?;
        todos.sort_by(|a, b| {
            let by_due = match (a.due_date, b.due_date) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            by_due.then_with(|| b.created_at.cmp(&a.created_at))
        });

        let mut payloads = Vec::with_capacity(todos.len());
        for todo in &todos {
            payloads.push(self.resolve(todo).await?);
        }
        Ok(payloads)
    }

    pub async fn find(&self, actor: &UserId, id: &TodoId) -> Result<TodoPayload, TodoError> {
        let todo = self.load(actor, id).await?;
        self.resolve(&todo).await
    }

    pub async fn update(&self, actor: &UserId, id: &TodoId, patch: TodoPatch) -> Result<TodoPayload, TodoError> {
        let mut todo = self.load(actor, id).await?;
        let previous_assignee = todo.assignee_id;

        if let Some(title) = &patch.title {
            todo.title = validate_title(title)?;
        }
        if let Some(Some(assignee)) = &patch.assignee_id {
            self.ensure_assignable(&todo.team_id, assignee).await?;
        }
        if let Some(assignee_id) = patch.assignee_id {
            todo.assignee_id = assignee_id;
        }
        if let Some(description) = patch.description {
            todo.description = Some(description);
        }
        if let Some(status) = patch.status {
            todo.status = status;
        }
        if let Some(due_date) = patch.due_date {
            todo.due_date = due_date;
        }
        todo.updated_at = self.clock.now();

        let todo = self.todos.update(todo).await?;
        tracing::info!("Todo '{}' updated", todo.id);

        let payload = self.resolve(&todo).await?;
        self.publisher.publish(
            RoomKey::for_team(todo.team_id),
            Event::TodoUpdated(payload.clone()),
        );
        self.notify(
            &todo,
            NotificationPolicy::on_updated(*actor, previous_assignee, todo.assignee_id, &todo.title),
        )
        .await;

        Ok(payload)
    }

    pub async fn delete(&self, actor: &UserId, id: &TodoId) -> Result<(), TodoError> {
        self.load(actor, id).await?;
        let todo = self.todos.delete(id).await?;
        tracing::info!("Todo '{}' deleted", todo.id);

        self.publisher.publish(
            RoomKey::for_team(todo.team_id),
            Event::TodoDeleted(TodoDeletedPayload {
                id: todo.id,
                team_id: todo.team_id,
            }),
        );
        self.notify(
            &todo,
            NotificationPolicy::on_deleted(*actor, todo.assignee_id, &todo.title),
        )
        .await;

        Ok(())
    }

    /// Load a todo the actor is allowed to see
    async fn load(&self, actor: &UserId, id: &TodoId) -> Result<Todo, TodoError> {
        let todo = self
            .todos
            .find(id)
            .await?
            .ok_or_else(|| TodoError::NotFound(format!("todo '{}'", id)))?;
        self.ensure_member(&todo.team_id, actor).await?;
        Ok(todo)
    }

    async fn ensure_member(&self, team_id: &TeamId, user_id: &UserId) -> Result<(), TodoError> {
        match self.teams.membership(team_id, user_id).await? {
            Some(_) => Ok(()),
            None => Err(TodoError::Forbidden(
                "You are not part of this team".to_string(),
            )),
        }
    }

    async fn ensure_assignable(&self, team_id: &TeamId, assignee: &UserId) -> Result<(), TodoError> {
        match self.teams.membership(team_id, assignee).await? {
            Some(_) => Ok(()),
            None => Err(TodoError::Validation(format!(
                "assignee '{}' is not a member of this team",
                assignee
            ))),
        }
    }

    async fn resolve(&self, todo: &Todo) -> Result<TodoPayload, TodoError> {
        let team = self.teams.find(&todo.team_id).await?;
        let owner = match team.as_ref().and_then(|team| team.owner_id) {
            Some(owner_id) => self.users.find_by_id(&owner_id).await?,
            None => None,
        };
        let assignee = match &todo.assignee_id {
            Some(assignee_id) => self.users.find_by_id(assignee_id).await?,
            None => None,
        };
        Ok(TodoPayload::resolve(
            todo,
            team.as_ref(),
            owner.as_ref(),
            assignee.as_ref(),
        ))
    }

    async fn notify(&self, todo: &Todo, intents: Vec<NotificationIntent>) {
        if let Err(e) = self.fanout.deliver(Some(todo.team_id), intents).await {
            tracing::error!("Failed to record notifications for todo '{}': {}", todo.id, e);
        }
    }
}

fn validate_title(title: &str) -> Result<String, TodoError> {
    let title = title.trim();
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(TodoError::Validation(format!(
            "title must be at least {} characters",
            MIN_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}
