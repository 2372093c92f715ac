//! Value objects: identifiers, room keys and the authenticated identity.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Transport-level connection identifier, minted when a socket is accepted
    ConnectionId
);
uuid_id!(UserId);
uuid_id!(TeamId);
uuid_id!(TodoId);
uuid_id!(NotificationId);

/// The two kinds of broadcast rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// `team-<teamId>`: everyone interested in a team's todo changes
    Team,
    /// `user-<userId>`: private channel for one user's notifications
    User,
}

impl RoomKind {
    fn prefix(self) -> &'static str {
        match self {
            RoomKind::Team => "team-",
            RoomKind::User => "user-",
        }
    }
}

/// Name of a broadcast room.
///
/// Team rooms are keyed by the team id exactly as the client sent it, so a
/// client joining with a non-canonical id still lands in a well-defined room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn for_team(team_id: impl fmt::Display) -> Self {
        Self(format!("{}{}", RoomKind::Team.prefix(), team_id))
    }

    pub fn for_user(user_id: &UserId) -> Self {
        Self(format!("{}{}", RoomKind::User.prefix(), user_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> Option<RoomKind> {
        [RoomKind::Team, RoomKind::User]
            .into_iter()
            .find(|kind| self.0.starts_with(kind.prefix()))
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Principal bound to a connection, derived once from token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_key_for_team_and_user() {
        // テスト項目: team / user のルームキーが命名規則に従って生成される
        // given (前提条件):
        let team_id: TeamId = "6f1c2f8e-0d6a-4c57-9a43-3f5b2a3c9d10".parse().unwrap();
        let user_id: UserId = "0b7e4a4e-2b2f-4e8e-8f33-7a9d3c1b5e22".parse().unwrap();

        // when (操作):
        let team_room = RoomKey::for_team(team_id);
        let user_room = RoomKey::for_user(&user_id);

        // then (期待する結果):
        assert_eq!(team_room.as_str(), "team-6f1c2f8e-0d6a-4c57-9a43-3f5b2a3c9d10");
        assert_eq!(user_room.as_str(), "user-0b7e4a4e-2b2f-4e8e-8f33-7a9d3c1b5e22");
        assert_eq!(team_room.kind(), Some(RoomKind::Team));
        assert_eq!(user_room.kind(), Some(RoomKind::User));
    }

    #[test]
    fn test_room_key_from_raw_team_id_matches_typed_team_id() {
        // テスト項目: クライアントが送った文字列の teamId と TeamId から同じルームになる
        // given (前提条件):
        let team_id = TeamId::generate();

        // when (操作):
        let from_client = RoomKey::for_team(team_id.to_string());
        let from_server = RoomKey::for_team(team_id);

        // then (期待する結果):
        assert_eq!(from_client, from_server);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        // テスト項目: UUID でない文字列は ID として解析できない
        // given (前提条件):
        let raw = "not-a-uuid";

        // when (操作):
        let result = raw.parse::<UserId>();

        // then (期待する結果):
        assert!(result.is_err());
    }
}
