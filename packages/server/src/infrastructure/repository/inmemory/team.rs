//! InMemory Team Repository 実装
//!
//! Teams and memberships share one lock so a team never exists without its
//! owner membership.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{RepositoryError, Team, TeamId, TeamMembership, TeamRepository, UserId};

#[derive(Default)]
struct TeamStore {
    teams: HashMap<TeamId, Team>,
    /// Insertion order is membership age
    memberships: Vec<TeamMembership>,
}

#[derive(Default)]
pub struct InMemoryTeamRepository {
    store: RwLock<TeamStore>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn create(&self, team: Team, owner: TeamMembership) -> Result<Team, RepositoryError> {
        let mut store = self.store.write().await;
        if store.teams.contains_key(&team.id) {
            return Err(RepositoryError::Conflict(format!("team '{}'", team.id)));
        }
        store.teams.insert(team.id, team.clone());
        store.memberships.push(owner);
        Ok(team)
    }

    async fn find(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store.teams.get(id).cloned())
    }

    async fn membership(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> Result<Option<TeamMembership>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .memberships
            .iter()
            .find(|m| m.team_id == *team_id && m.user_id == *user_id)
            .cloned())
    }

    async fn add_membership(
        &self,
        membership: TeamMembership,
    ) -> Result<TeamMembership, RepositoryError> {
        let mut store = self.store.write().await;
        if !store.teams.contains_key(&membership.team_id) {
            return Err(RepositoryError::NotFound(format!(
                "team '{}'",
                membership.team_id
            )));
        }
        if let Some(existing) = store
            .memberships
            .iter()
            .find(|m| m.team_id == membership.team_id && m.user_id == membership.user_id)
        {
            return Ok(existing.clone());
        }
        store.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn members(&self, team_id: &TeamId) -> Result<Vec<TeamMembership>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .memberships
            .iter()
            .filter(|m| m.team_id == *team_id)
            .cloned()
            .collect())
    }

    async fn teams_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<(Team, TeamMembership)>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .memberships
            .iter()
            .filter(|m| m.user_id == *user_id)
            .filter_map(|m| store.teams.get(&m.team_id).map(|t| (t.clone(), m.clone())))
            .collect())
    }
}
