//! UseCase: connection gateway
//!
//! Drives one connection through `Connecting → Authenticated → Disconnected`.
//! The transport (UI layer) owns the socket and calls in at each step:
//!
//! 1. `accept` mints the connection id
//! 2. `on_connect` authenticates and registers it, or rejects it
//! 3. `on_message` handles control messages (`join_team` / `joinTeam`); only
//!    members of a team may join its room
//! 4. `on_disconnect` tears everything down
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - トークン抽出の優先順位（auth payload → query → Authorization header）
//! - 認証失敗時に何も登録されないこと
//! - 認証前の制御メッセージで切断されること
//! - join_team で team ルームに参加し、本人にだけ team.joined が返ること
//! - チームのメンバーでなければ team ルームに参加できないこと
//! - on_disconnect が冪等であること

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{
        AuthError, ConnectionId, Event, Identity, MessagePusher, PusherChannel, RoomKey, TeamId,
        TeamJoinedPayload, TeamRepository, TokenVerifier, User, UserRepository,
    },
    infrastructure::{
        dto::websocket::{ConnectedPayload, GatewayFrame, JoinTeamRequest},
        room_directory::RoomDirectory,
        session_registry::SessionRegistry,
    },
};

use super::error::ConnectError;

const JOIN_TEAM_EVENTS: [&str; 2] = ["join_team", "joinTeam"];

/// Credentials offered during the handshake
#[derive(Debug, Clone, Default)]
pub struct HandshakeData {
    /// `data` of the client's `connect` frame
    pub auth: Value,
    /// `token` query parameter of the upgrade request
    pub query_token: Option<String>,
    /// `Authorization` header of the upgrade request
    pub authorization: Option<String>,
}

impl HandshakeData {
    /// First non-blank token from the auth payload, the query string, then a
    /// `Bearer` authorization header.
    pub fn token(&self) -> Option<String> {
        let from_auth = self.auth.get("token").and_then(Value::as_str);
        let from_header = self
            .authorization
            .as_deref()
            .and_then(|header| header.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token);

        [from_auth, self.query_token.as_deref(), from_header]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|token| !token.is_empty())
            .map(str::to_string)
    }
}

/// What the transport should do after an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Disconnect,
}

pub struct ConnectionGateway {
    token_verifier: Arc<dyn TokenVerifier>,
    session_registry: Arc<SessionRegistry>,
    room_directory: Arc<RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
    user_repository: Arc<dyn UserRepository>,
    team_repository: Arc<dyn TeamRepository>,
}

impl ConnectionGateway {
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        session_registry: Arc<SessionRegistry>,
        room_directory: Arc<RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
        user_repository: Arc<dyn UserRepository>,
        team_repository: Arc<dyn TeamRepository>,
    ) -> Self {
        Self {
            token_verifier,
            session_registry,
            room_directory,
            message_pusher,
            user_repository,
            team_repository,
        }
    }

    pub fn accept(&self) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        tracing::debug!("Accepted connection '{}'", connection_id);
        connection_id
    }

    /// Authenticate a connection and register it.
    ///
    /// On success the `connected` frame is queued on `sender` ahead of any
    /// room traffic, and the connection is a member of its `user-<id>` room.
    /// On failure nothing is left registered.
    pub async fn on_connect(
        &self,
        connection_id: ConnectionId,
        handshake: &HandshakeData,
        sender: PusherChannel,
    ) -> Result<Identity, ConnectError> {
        let token = handshake.token().ok_or(AuthError::MissingToken)?;
        let identity = self.token_verifier.verify(&token)?;
        self.session_registry.bind(connection_id, identity.clone())?;

        let connected = GatewayFrame::Connected(ConnectedPayload {
            connection_id: connection_id.to_string(),
            user_id: identity.user_id.to_string(),
        });
        let queued = connected
            .to_frame()
            .map_err(|e| e.to_string())
            .and_then(|frame| sender.try_send(frame).map_err(|e| e.to_string()));
        if let Err(e) = queued {
            self.session_registry.forget(&connection_id);
            return Err(ConnectError::ChannelClosed(e));
        }

        self.message_pusher
            .register_client(connection_id, sender)
            .await;
        self.room_directory
            .join(&RoomKey::for_user(&identity.user_id), connection_id);

        let user = User {
            id: identity.user_id,
            email: identity.email.clone(),
            name: identity.name.clone(),
        };
        if let Err(e) = self.user_repository.upsert(user).await {
            tracing::warn!("Failed to record user '{}': {}", identity.user_id, e);
        }

        tracing::info!(
            "Connection '{}' authenticated as '{}'",
            connection_id,
            identity.email
        );
        Ok(identity)
    }

    /// Handle one control message from a connection.
    pub async fn on_message(&self, connection_id: &ConnectionId, event: &str, data: &Value) -> Disposition {
        let Some(identity) = self.session_registry.identity_of(connection_id) else {
            tracing::warn!(
                "Control message '{}' from unauthenticated connection '{}', disconnecting",
                event,
                connection_id
            );
            return Disposition::Disconnect;
        };

        if JOIN_TEAM_EVENTS.contains(&event) {
            self.join_team(connection_id, &identity, data).await;
        } else {
            tracing::warn!(
                "Ignoring unknown event '{}' from connection '{}'",
                event,
                connection_id
            );
        }
        Disposition::Continue
    }

    async fn join_team(&self, connection_id: &ConnectionId, identity: &Identity, data: &Value) {
        let Some(requested) = JoinTeamRequest::parse(data) else {
            tracing::warn!(
                "Malformed join_team from connection '{}': {}",
                connection_id,
                data
            );
            return;
        };
        let Ok(team_id) = requested.parse::<TeamId>() else {
            tracing::warn!(
                "Connection '{}' asked to join unknown team '{}'",
                connection_id,
                requested
            );
            return;
        };

        match self.team_repository.membership(&team_id, &identity.user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(
                    "User '{}' is not a member of team '{}', join refused",
                    identity.user_id,
                    team_id
                );
                return;
            }
            Err(e) => {
                tracing::error!("Failed to check membership of team '{}': {}", team_id, e);
                return;
            }
        }

        let room = RoomKey::for_team(team_id);
        self.room_directory.join(&room, *connection_id);

        let reply = Event::TeamJoined(TeamJoinedPayload {
            team_id: team_id.to_string(),
        });
        match reply.to_frame() {
            Ok(frame) => {
                if let Err(e) = self.message_pusher.push_to(connection_id, &frame).await {
                    tracing::warn!("Failed to confirm '{}' to '{}': {}", room, connection_id, e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize team.joined: {}", e),
        }
    }

    /// Remove every trace of a connection. Safe to call more than once.
    pub async fn on_disconnect(&self, connection_id: &ConnectionId) {
        let rooms = self.room_directory.leave_all(connection_id);
        let identity = self.session_registry.forget(connection_id);
        self.message_pusher.unregister_client(connection_id).await;

        if let Some(identity) = identity {
            tracing::info!(
                "Connection '{}' ({}) disconnected, left {} room(s)",
                connection_id,
                identity.email,
                rooms.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Team, TeamMembership, TeamRole, UserId, collaborator::MockTokenVerifier, outbound_channel},
        infrastructure::{
            message_pusher::WebSocketMessagePusher,
            repository::{InMemoryTeamRepository, InMemoryUserRepository},
        },
    };
    use chrono::Utc;
    use serde_json::json;

    struct Fixture {
        gateway: ConnectionGateway,
        sessions: Arc<SessionRegistry>,
        rooms: Arc<RoomDirectory>,
        pusher: Arc<WebSocketMessagePusher>,
        users: Arc<InMemoryUserRepository>,
        teams: Arc<InMemoryTeamRepository>,
    }

    impl Fixture {
        /// A team with `owner` as its only member
        async fn team_owned_by(&self, owner: &Identity) -> TeamId {
            let now = Utc::now();
            let team = Team {
                id: TeamId::generate(),
                name: "Platform".to_string(),
                description: None,
                owner_id: Some(owner.user_id),
                created_at: now,
                updated_at: now,
            };
            let membership = TeamMembership {
                team_id: team.id,
                user_id: owner.user_id,
                role: TeamRole::Owner,
                created_at: now,
            };
            self.teams.create(team, membership).await.unwrap().id
        }
    }

    fn alice() -> Identity {
        Identity {
            user_id: UserId::generate(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
        }
    }

    fn fixture(verifier: MockTokenVerifier) -> Fixture {
        let sessions = Arc::new(SessionRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let rooms = Arc::new(RoomDirectory::new(pusher.clone()));
        let users = Arc::new(InMemoryUserRepository::new());
        let teams = Arc::new(InMemoryTeamRepository::new());
        let gateway = ConnectionGateway::new(
            Arc::new(verifier),
            sessions.clone(),
            rooms.clone(),
            pusher.clone(),
            users.clone(),
            teams.clone(),
        );
        Fixture {
            gateway,
            sessions,
            rooms,
            pusher,
            users,
            teams,
        }
    }

    fn accepting(identity: Identity) -> MockTokenVerifier {
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(move |token| match token {
                "good" => Ok(identity.clone()),
                _ => Err(AuthError::InvalidToken("bad signature".to_string())),
            });
        verifier
    }

    fn with_token(token: &str) -> HandshakeData {
        HandshakeData {
            auth: json!({ "token": token }),
            ..Default::default()
        }
    }

    fn frame(raw: Option<String>) -> Value {
        serde_json::from_str(&raw.expect("expected a frame")).unwrap()
    }

    #[test]
    fn test_token_source_priority() {
        // テスト項目: auth payload → query → Authorization header の順でトークンを選ぶ
        // given (前提条件):
        let all = HandshakeData {
            auth: json!({"token": "from-auth"}),
            query_token: Some("from-query".to_string()),
            authorization: Some("Bearer from-header".to_string()),
        };
        let query_and_header = HandshakeData {
            auth: json!({"token": "  "}),
            query_token: Some("from-query".to_string()),
            authorization: Some("Bearer from-header".to_string()),
        };
        let header_only = HandshakeData {
            authorization: Some("bearer from-header".to_string()),
            ..Default::default()
        };
        let wrong_scheme = HandshakeData {
            authorization: Some("Basic abc".to_string()),
            ..Default::default()
        };

        // when (操作):
        let picked = [&all, &query_and_header, &header_only, &wrong_scheme].map(HandshakeData::token);

        // then (期待する結果):
        assert_eq!(
            picked,
            [
                Some("from-auth".to_string()),
                Some("from-query".to_string()),
                Some("from-header".to_string()),
                None,
            ]
        );
    }

    #[tokio::test]
    async fn test_connect_registers_session_and_user_room() {
        // テスト項目: 認証成功で connected が最初に届き、user ルームに参加する
        // given (前提条件):
        let identity = alice();
        let f = fixture(accepting(identity.clone()));
        let connection_id = f.gateway.accept();
        let (tx, mut rx) = outbound_channel();

        // when (操作):
        let result = f.gateway.on_connect(connection_id, &with_token("good"), tx).await;

        // then (期待する結果):
        assert_eq!(result, Ok(identity.clone()));
        let connected = frame(rx.recv().await);
        assert_eq!(connected["event"], "connected");
        assert_eq!(connected["data"]["userId"], identity.user_id.to_string());
        assert_eq!(f.sessions.identity_of(&connection_id), Some(identity.clone()));
        assert_eq!(
            f.rooms.rooms_of(&connection_id),
            vec![RoomKey::for_user(&identity.user_id)]
        );
        assert_eq!(f.pusher.client_count().await, 1);
        let stored = f.users.find_by_id(&identity.user_id).await.unwrap();
        assert_eq!(stored.map(|u| u.email), Some(identity.email));
    }

    #[tokio::test]
    async fn test_invalid_token_registers_nothing() {
        // テスト項目: 不正なトークンでは拒否され、セッション・ルームに何も残らない
        // given (前提条件):
        let f = fixture(accepting(alice()));
        let connection_id = f.gateway.accept();
        let (tx, _rx) = outbound_channel();

        // when (操作):
        let result = f.gateway.on_connect(connection_id, &with_token("forged"), tx).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ConnectError::Auth(AuthError::InvalidToken(_)))));
        assert!(f.sessions.is_empty());
        assert_eq!(f.rooms.room_count(), 0);
        assert_eq!(f.pusher.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected_without_verifying() {
        // テスト項目: トークンが無い場合は検証器を呼ばずに MissingToken で拒否
        // given (前提条件):
        let mut verifier = MockTokenVerifier::new();
        verifier.expect_verify().never();
        let f = fixture(verifier);
        let (tx, _rx) = outbound_channel();

        // when (操作):
        let result = f
            .gateway
            .on_connect(f.gateway.accept(), &HandshakeData::default(), tx)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::Auth(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_message_before_auth_forces_disconnect() {
        // テスト項目: 認証前の制御メッセージは切断を指示する
        // given (前提条件):
        let f = fixture(accepting(alice()));
        let connection_id = f.gateway.accept();

        // when (操作):
        let disposition = f
            .gateway
            .on_message(&connection_id, "join_team", &json!({"teamId": "t1"}))
            .await;

        // then (期待する結果):
        assert_eq!(disposition, Disposition::Disconnect);
        assert_eq!(f.rooms.room_count(), 0);
    }

    #[tokio::test]
    async fn test_join_team_replies_only_to_requester() {
        // テスト項目: joinTeam で team ルームに参加し、team.joined は本人にだけ届く
        // given (前提条件):
        let identity = alice();
        let f = fixture(accepting(identity.clone()));
        let team_id = f.team_owned_by(&identity).await;
        let requester = f.gateway.accept();
        let (tx, mut rx) = outbound_channel();
        f.gateway.on_connect(requester, &with_token("good"), tx).await.unwrap();
        let _connected = rx.recv().await;

        let bystander = ConnectionId::generate();
        let (bystander_tx, mut bystander_rx) = outbound_channel();
        f.pusher.register_client(bystander, bystander_tx).await;
        f.rooms.join(&RoomKey::for_team(team_id), bystander);

        // when (操作):
        let disposition = f
            .gateway
            .on_message(&requester, "joinTeam", &json!({"team_id": team_id.to_string()}))
            .await;

        // then (期待する結果):
        assert_eq!(disposition, Disposition::Continue);
        let joined = frame(rx.recv().await);
        assert_eq!(
            joined,
            json!({"event": "team.joined", "data": {"teamId": team_id.to_string()}})
        );
        assert!(bystander_rx.try_recv().is_err());
        let mut members = f.rooms.members(&RoomKey::for_team(team_id));
        members.sort();
        let mut expected = vec![requester, bystander];
        expected.sort();
        assert_eq!(members, expected);
    }

    #[tokio::test]
    async fn test_malformed_join_team_keeps_connection() {
        // テスト項目: 不正な join_team は無視され、接続は維持される
        // given (前提条件):
        let f = fixture(accepting(alice()));
        let connection_id = f.gateway.accept();
        let (tx, mut rx) = outbound_channel();
        f.gateway.on_connect(connection_id, &with_token("good"), tx).await.unwrap();
        let _connected = rx.recv().await;

        // when (操作):
        let disposition = f
            .gateway
            .on_message(&connection_id, "join_team", &json!({"team": 1}))
            .await;

        // then (期待する結果):
        assert_eq!(disposition, Disposition::Continue);
        assert!(rx.try_recv().is_err());
        assert_eq!(f.rooms.rooms_of(&connection_id).len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        // テスト項目: on_disconnect で全ルーム・セッションから外れ、2 回目も安全
        // given (前提条件):
        let identity = alice();
        let f = fixture(accepting(identity.clone()));
        let team_id = f.team_owned_by(&identity).await;
        let connection_id = f.gateway.accept();
        let (tx, _rx) = outbound_channel();
        f.gateway.on_connect(connection_id, &with_token("good"), tx).await.unwrap();
        f.gateway
            .on_message(&connection_id, "join_team", &json!({"teamId": team_id.to_string()}))
            .await;
        assert_eq!(f.rooms.rooms_of(&connection_id).len(), 2);

        // when (操作):
        f.gateway.on_disconnect(&connection_id).await;
        f.gateway.on_disconnect(&connection_id).await;

        // then (期待する結果):
        assert!(f.sessions.is_empty());
        assert_eq!(f.rooms.room_count(), 0);
        assert_eq!(f.pusher.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_join_team_requires_membership() {
        // テスト項目: メンバーでないチーム・存在しないチーム・UUID でない ID のルームには参加できない
        // given (前提条件):
        let identity = alice();
        let f = fixture(accepting(identity.clone()));
        let outsider = Identity {
            user_id: UserId::generate(),
            email: "mallory@example.com".to_string(),
            name: "Mallory".to_string(),
        };
        let foreign_team = f.team_owned_by(&outsider).await;
        let connection_id = f.gateway.accept();
        let (tx, mut rx) = outbound_channel();
        f.gateway.on_connect(connection_id, &with_token("good"), tx).await.unwrap();
        let _connected = rx.recv().await;

        // when (操作):
        let mut dispositions = Vec::new();
        for data in [
            json!({"teamId": foreign_team.to_string()}),
            json!({"teamId": TeamId::generate().to_string()}),
            json!({"teamId": 42}),
        ] {
            dispositions.push(f.gateway.on_message(&connection_id, "join_team", &data).await);
        }

        // then (期待する結果):
        assert_eq!(dispositions, vec![Disposition::Continue; 3]);
        assert!(rx.try_recv().is_err());
        assert_eq!(
            f.rooms.rooms_of(&connection_id),
            vec![RoomKey::for_user(&identity.user_id)]
        );
        assert!(f.rooms.members(&RoomKey::for_team(foreign_team)).is_empty());
    }
}
