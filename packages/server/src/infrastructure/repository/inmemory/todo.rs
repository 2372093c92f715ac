//! InMemory Todo Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{RepositoryError, TeamId, Todo, TodoId, TodoRepository};

#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: RwLock<HashMap<TodoId, Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn insert(&self, todo: Todo) -> Result<Todo, RepositoryError> {
        let mut todos = self.todos.write().await;
        if todos.contains_key(&todo.id) {
            return Err(RepositoryError::Conflict(format!("todo '{}'", todo.id)));
        }
        todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError> {
        let todos = self.todos.read().await;
        Ok(todos.get(id).cloned())
    }

    async fn update(&self, todo: Todo) -> Result<Todo, RepositoryError> {
        let mut todos = self.todos.write().await;
        match todos.get_mut(&todo.id) {
            Some(stored) => {
                *stored = todo.clone();
                Ok(todo)
            }
            None => Err(RepositoryError::NotFound(format!("todo '{}'", todo.id))),
        }
    }

    async fn delete(&self, id: &TodoId) -> Result<Todo, RepositoryError> {
        let mut todos = self.todos.write().await;
        todos
            .remove(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("todo '{}'", id)))
    }

    async fn list_by_team(&self, team_id: &TeamId) -> Result<Vec<Todo>, RepositoryError> {
        let todos = self.todos.read().await;
        Ok(todos
            .values()
            .filter(|todo| todo.team_id == *team_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TodoStatus;
    use chrono::Utc;

    fn todo_in(team_id: TeamId, title: &str) -> Todo {
        let now = Utc::now();
        Todo {
            id: TodoId::generate(),
            title: title.to_string(),
            description: None,
            due_date: None,
            status: TodoStatus::Backlog,
            team_id,
            assignee_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_by_team_filters_other_teams() {
        // テスト項目: list_by_team は指定チームの todo だけを返す
        // given (前提条件):
        let repository = InMemoryTodoRepository::new();
        let team = TeamId::generate();
        repository.insert(todo_in(team, "mine")).await.unwrap();
        repository.insert(todo_in(TeamId::generate(), "other")).await.unwrap();

        // when (操作):
        let todos = repository.list_by_team(&team).await.unwrap();

        // then (期待する結果):
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "mine");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_todo_fail() {
        // テスト項目: 存在しない todo の更新・削除は NotFound
        // given (前提条件):
        let repository = InMemoryTodoRepository::new();
        let ghost = todo_in(TeamId::generate(), "ghost");

        // when (操作):
        let updated = repository.update(ghost.clone()).await;
        let deleted = repository.delete(&ghost.id).await;

        // then (期待する結果):
        assert!(matches!(updated, Err(RepositoryError::NotFound(_))));
        assert!(matches!(deleted, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_todo() {
        // テスト項目: 削除は削除した todo を返し、以後 find で見つからない
        // given (前提条件):
        let repository = InMemoryTodoRepository::new();
        let todo = repository.insert(todo_in(TeamId::generate(), "done")).await.unwrap();

        // when (操作):
        let removed = repository.delete(&todo.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(removed, todo);
        assert_eq!(repository.find(&todo.id).await.unwrap(), None);
    }
}
