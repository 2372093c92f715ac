//! WebSocket frame DTOs.
//!
//! Every frame in either direction is `{"event": <name>, "data": <object>}`.
//! Server events (`todo.*`, `notification.created`, `team.joined`) are the
//! domain `Event` union; this module holds the gateway's own frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Handshake frame name sent by the client right after the upgrade
pub const CONNECT_EVENT: &str = "connect";

/// Inbound frame as received from a client
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    #[serde(rename = "connectionId")]
    pub connection_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectErrorPayload {
    pub message: String,
}

/// Frames produced by the gateway itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum GatewayFrame {
    #[serde(rename = "connected")]
    Connected(ConnectedPayload),
    #[serde(rename = "connect_error")]
    ConnectError(ConnectErrorPayload),
}

impl GatewayFrame {
    pub fn connect_error(message: impl Into<String>) -> Self {
        Self::ConnectError(ConnectErrorPayload {
            message: message.into(),
        })
    }

    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawTeamId {
    Text(String),
    Number(serde_json::Number),
}

/// `join_team` / `joinTeam` body: `{teamId}` or legacy `{team_id}`, string or number
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinTeamRequest {
    #[serde(rename = "teamId", alias = "team_id")]
    team_id: RawTeamId,
}

impl JoinTeamRequest {
    /// Parse the control message body; `None` when it is malformed or blank.
    pub fn parse(data: &Value) -> Option<String> {
        let request = JoinTeamRequest::deserialize(data).ok()?;
        let team_id = match request.team_id {
            RawTeamId::Text(text) => text.trim().to_string(),
            RawTeamId::Number(number) => number.to_string(),
        };
        (!team_id.is_empty()).then_some(team_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_team_accepts_both_key_spellings_and_numbers() {
        // テスト項目: teamId / team_id、文字列 / 数値のいずれも受け付ける
        // given (前提条件):
        let camel = json!({"teamId": "abc"});
        let snake = json!({"team_id": "abc"});
        let numeric = json!({"teamId": 42});

        // when (操作):
        let parsed: Vec<Option<String>> = [camel, snake, numeric]
            .iter()
            .map(JoinTeamRequest::parse)
            .collect();

        // then (期待する結果):
        assert_eq!(
            parsed,
            vec![Some("abc".to_string()), Some("abc".to_string()), Some("42".to_string())]
        );
    }

    #[test]
    fn test_join_team_rejects_malformed_bodies() {
        // テスト項目: teamId が無い・空・型違いの本文は None
        // given (前提条件):
        let bodies = [
            json!({}),
            json!({"teamId": "  "}),
            json!({"teamId": null}),
            json!({"teamId": {"nested": true}}),
            json!("abc"),
            Value::Null,
        ];

        // when (操作):
        let parsed: Vec<Option<String>> = bodies.iter().map(JoinTeamRequest::parse).collect();

        // then (期待する結果):
        assert!(parsed.iter().all(Option::is_none));
    }

    #[test]
    fn test_gateway_frames_shape() {
        // テスト項目: connected / connect_error が {event, data} 形式になる
        // given (前提条件):
        let connected = GatewayFrame::Connected(ConnectedPayload {
            connection_id: "c1".to_string(),
            user_id: "u1".to_string(),
        });
        let rejected = GatewayFrame::connect_error("missing auth token");

        // when (操作):
        let connected: Value = serde_json::from_str(&connected.to_frame().unwrap()).unwrap();
        let rejected: Value = serde_json::from_str(&rejected.to_frame().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            connected,
            json!({"event": "connected", "data": {"connectionId": "c1", "userId": "u1"}})
        );
        assert_eq!(
            rejected,
            json!({"event": "connect_error", "data": {"message": "missing auth token"}})
        );
    }

    #[test]
    fn test_client_frame_data_defaults_to_null() {
        // テスト項目: data を省略したフレームもパースできる
        // given (前提条件):
        let raw = r#"{"event":"connect"}"#;

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        assert_eq!(frame.event, CONNECT_EVENT);
        assert_eq!(frame.data, Value::Null);
    }
}
