//! UseCase: teams and memberships

use std::sync::Arc;

use taskboard_shared::time::Clock;

use crate::domain::{
    Team, TeamId, TeamMembership, TeamPayload, TeamRepository, TeamRole, User, UserId,
    UserRepository,
};

use super::error::TeamError;

const MIN_NAME_CHARS: usize = 2;

/// A team as seen by one of its members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamWithRole {
    pub team: TeamPayload,
    pub role: TeamRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub user: User,
    pub membership: TeamMembership,
}

pub struct TeamUseCase {
    teams: Arc<dyn TeamRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl TeamUseCase {
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            teams,
            users,
            clock,
        }
    }

    /// Create a team; the creator becomes its owner.
    pub async fn create(
        &self,
        actor: &UserId,
        name: &str,
        description: Option<String>,
    ) -> Result<TeamPayload, TeamError> {
        let name = name.trim();
        if name.chars().count() < MIN_NAME_CHARS {
            return Err(TeamError::Validation(format!(
                "name must be at least {} characters",
                MIN_NAME_CHARS
            )));
        }

        let now = self.clock.now();
        let team = Team {
            id: TeamId::generate(),
            name: name.to_string(),
            description,
            owner_id: Some(*actor),
            created_at: now,
            updated_at: now,
        };
        let owner = TeamMembership {
            team_id: team.id,
            user_id: *actor,
            role: TeamRole::Owner,
            created_at: now,
        };
        let team = self.teams.create(team, owner).await?;
        tracing::info!("Team '{}' created by '{}'", team.id, actor);

        let owner = self.users.find_by_id(actor).await?;
        Ok(TeamPayload::resolve(&team, owner.as_ref()))
    }

    /// Teams the actor belongs to, oldest membership first
    pub async fn list_mine(&self, actor: &UserId) -> Result<Vec<TeamWithRole>, TeamError> {
        let memberships = self.teams.teams_for_user(actor).await?;
        let mut teams = Vec::with_capacity(memberships.len());
        for (team, membership) in memberships {
            let owner = match team.owner_id {
                Some(owner_id) => self.users.find_by_id(&owner_id).await?,
                None => None,
            };
            teams.push(TeamWithRole {
                team: TeamPayload::resolve(&team, owner.as_ref()),
                role: membership.role,
            });
        }
        Ok(teams)
    }

    /// Add a known user to a team by email. Only owners may add members;
    /// adding an existing member returns the existing membership.
    pub async fn add_member(
        &self,
        actor: &UserId,
        team_id: &TeamId,
        email: &str,
        role: Option<TeamRole>,
    ) -> Result<TeamMember, TeamError> {
        if self.teams.find(team_id).await?.is_none() {
            return Err(TeamError::NotFound(format!("team '{}'", team_id)));
        }
        let is_owner = self
            .teams
            .membership(team_id, actor)
            .await?
            .is_some_and(|membership| membership.role == TeamRole::Owner);
        if !is_owner {
            return Err(TeamError::Forbidden(
                "Only team owners can add members".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| TeamError::NotFound(format!("user '{}'", email.trim())))?;
        let membership = self
            .teams
            .add_membership(TeamMembership {
                team_id: *team_id,
                user_id: user.id,
                role: role.unwrap_or(TeamRole::Member),
                created_at: self.clock.now(),
            })
            .await?;
        tracing::info!("User '{}' is a member of team '{}'", user.id, team_id);

        Ok(TeamMember { user, membership })
    }

    /// Members of a team the actor belongs to, oldest first
    pub async fn members(&self, actor: &UserId, team_id: &TeamId) -> Result<Vec<TeamMember>, TeamError> {
        if self.teams.membership(team_id, actor).await?.is_none() {
            return Err(TeamError::Forbidden(
                "You are not part of this team".to_string(),
            ));
        }

        let memberships = self.teams.members(team_id).await?;
        let mut members = Vec::with_capacity(memberships.len());
        for membership in memberships {
            match self.users.find_by_id(&membership.user_id).await? {
                Some(user) => members.push(TeamMember { user, membership }),
                None => tracing::warn!(
                    "Membership of unknown user '{}' in team '{}'",
                    membership.user_id,
                    team_id
                ),
            }
        }
        Ok(members)
    }
}
