//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! Repositories return owned entities. Nothing handed out here refers back
//! into storage, so values can cross into the delivery path freely.

use async_trait::async_trait;

use super::{
    entity::{Notification, Team, TeamMembership, Todo, User},
    error::RepositoryError,
    value_object::{TeamId, TodoId, UserId},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or refresh a user (keyed by id)
    async fn upsert(&self, user: User) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team together with its owner membership
    async fn create(&self, team: Team, owner: TeamMembership) -> Result<Team, RepositoryError>;

    async fn find(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError>;

    async fn membership(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Option<TeamMembership>, RepositoryError>;

    /// Add a membership; an existing membership for the same user is returned unchanged
    async fn add_membership(
        &self,
        membership: TeamMembership,
    ) -> Result<TeamMembership, RepositoryError>;

    /// Memberships of a team, oldest first
    async fn members(&self, team_id: &TeamId) -> Result<Vec<TeamMembership>, RepositoryError>;

    /// Teams the user belongs to with their membership, oldest membership first
    async fn teams_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<(Team, TeamMembership)>, RepositoryError>;
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn insert(&self, todo: Todo) -> Result<Todo, RepositoryError>;

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError>;

    async fn update(&self, todo: Todo) -> Result<Todo, RepositoryError>;

    /// Delete and return the removed todo
    async fn delete(&self, id: &TodoId) -> Result<Todo, RepositoryError>;

    async fn list_by_team(&self, team_id: &TeamId) -> Result<Vec<Todo>, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist all records or none
    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<(), RepositoryError>;

    /// Newest first, at most `limit` records
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError>;
}
