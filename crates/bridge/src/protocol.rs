//! Wire protocol between the bridge and the transport adapter.
//!
//! Inbound envelopes arrive from the adapter (`ws-message`,
//! `connection-status`, ...). Outbound envelopes go back to it
//! (`ws-send`, progress notifications, plugin info). The command tag
//! vocabulary and parameter names are the contract with the remote
//! control plane and must stay stable.

use crate::BridgeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter, EnumString};

/// Every command the bridge knows how to run.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommandTag {
    // === Queries ===
    GetRootLayers,
    GetSelection,
    GetNodeChildren,
    ExportNode,

    // === Creation ===
    CreateRectangle,
    CreateText,
    CreateFrame,
    CreateComponent,
    CreateInstance,

    // === Style ===
    SetFill,
    SetStroke,
    SetEffects,

    // === Edit ===
    UpdateNode,
    DeleteNode,
}

/// A command sent by the remote control plane.
///
/// The tag is kept as a raw string so an unrecognized tag can still be
/// answered with an `Unknown command` error under the right id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    pub command: String,
    #[serde(default, deserialize_with = "nullable_map")]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_required: Option<bool>,
}

impl Command {
    pub fn new(id: impl Into<String>, tag: CommandTag, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            command: tag.to_string(),
            params,
            response_required: None,
        }
    }

    /// Only an explicit `false` opts out of tracking.
    pub fn requires_response(&self) -> bool {
        self.response_required != Some(false)
    }
}

fn nullable_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Message carried inside a `ws-message` envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Command(Command),
    /// Acknowledgements and anything else the server chatters about.
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// An envelope from the transport adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    WsMessage {
        message: ServerMessage,
    },
    ConnectionStatus {
        status: ConnectionStatus,
        #[serde(default)]
        message: String,
    },
    WsError {
        #[serde(default)]
        error: Value,
    },
    GetPluginInfo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    Text,
    Image,
}

/// The answer to a command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The originating command's id.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the command succeeded but some of its work could not be
    /// applied (text styling after a font failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Response {
    pub fn from_outcome(id: impl Into<String>, outcome: Result<crate::Reply, BridgeError>) -> Self {
        let id = id.into();
        match outcome {
            Ok(reply) => Self {
                id,
                kind: reply.kind,
                success: true,
                result: reply.result,
                error: None,
                warning: reply.warning,
            },
            Err(err) => Self {
                id,
                kind: ResponseKind::Text,
                success: false,
                result: None,
                error: Some(err.to_string()),
                warning: None,
            },
        }
    }
}

/// Message forwarded to the remote server inside `ws-send`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Response { id: String, data: Response },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub id: String,
    pub user: Option<UserInfo>,
}

/// An envelope for the transport adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Forward to the remote server.
    WsSend { data: ClientMessage },
    /// Progress notification for the status UI.
    Command { command: String, message: String },
    PluginInfo { data: PluginInfo },
}

impl OutboundMessage {
    pub fn response(response: Response) -> Self {
        Self::WsSend {
            data: ClientMessage::Response {
                id: response.id.clone(),
                data: response,
            },
        }
    }

    pub fn progress(command: &str) -> Self {
        Self::Command {
            command: command.to_string(),
            message: format!("Executing: {command}"),
        }
    }

    /// The response carried by this envelope, if any.
    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Self::WsSend {
                data: ClientMessage::Response { data, .. },
            } => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reply;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_command_tags_use_snake_case() {
        assert_eq!(CommandTag::GetRootLayers.to_string(), "get_root_layers");
        assert_eq!(
            CommandTag::from_str("create_instance").unwrap(),
            CommandTag::CreateInstance
        );
        assert!(CommandTag::from_str("frobnicate").is_err());
    }

    #[test]
    fn test_ws_message_command_deserializes() {
        let json = r#"{
            "type": "ws-message",
            "message": {
                "type": "command",
                "id": "create_rectangle_1",
                "command": "create_rectangle",
                "params": {"width": 50}
            }
        }"#;
        let message: InboundMessage = serde_json::from_str(json).unwrap();

        match message {
            InboundMessage::WsMessage {
                message: ServerMessage::Command(command),
            } => {
                assert_eq!(command.id, "create_rectangle_1");
                assert_eq!(command.command, "create_rectangle");
                assert_eq!(command.params["width"], 50);
                assert!(command.requires_response());
            }
            other => panic!("Expected a command, got {other:?}"),
        }
    }

    #[test]
    fn test_null_params_become_empty() {
        // The server forwards `arguments` verbatim, which may be null
        let command: Command = serde_json::from_value(json!({
            "id": "1",
            "command": "get_selection",
            "params": null
        }))
        .unwrap();
        assert!(command.params.is_empty());
    }

    #[test]
    fn test_only_explicit_false_opts_out_of_response() {
        let mut command = Command::new("1", CommandTag::GetSelection, json!({}));
        assert!(command.requires_response());
        command.response_required = Some(true);
        assert!(command.requires_response());
        command.response_required = Some(false);
        assert!(!command.requires_response());
    }

    #[test]
    fn test_unrelated_server_messages_are_tolerated() {
        let message: InboundMessage = serde_json::from_value(json!({
            "type": "ws-message",
            "message": {"type": "received", "message": "Success"}
        }))
        .unwrap();
        assert_eq!(
            message,
            InboundMessage::WsMessage {
                message: ServerMessage::Other
            }
        );
    }

    #[test]
    fn test_connection_status_deserializes() {
        let message: InboundMessage = serde_json::from_value(json!({
            "type": "connection-status",
            "status": "disconnected",
            "message": "socket closed"
        }))
        .unwrap();
        assert_eq!(
            message,
            InboundMessage::ConnectionStatus {
                status: ConnectionStatus::Disconnected,
                message: "socket closed".to_string(),
            }
        );
    }

    #[test]
    fn test_response_envelope_wire_shape() {
        let response = Response::from_outcome(
            "42",
            Err(BridgeError::NodeNotFound("123".to_string())),
        );
        let json = serde_json::to_value(OutboundMessage::response(response)).unwrap();

        assert_eq!(
            json,
            json!({
                "type": "ws-send",
                "data": {
                    "type": "response",
                    "id": "42",
                    "data": {
                        "id": "42",
                        "type": "text",
                        "success": false,
                        "error": "Node not found: 123"
                    }
                }
            })
        );
    }

    #[test]
    fn test_successful_response_omits_error() {
        let reply = Reply::text(&json!({"id": "1:1"})).unwrap();
        let json = serde_json::to_value(Response::from_outcome("7", Ok(reply))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["result"], json!({"id": "1:1"}));
        assert!(json.get("error").is_none());
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn test_progress_and_plugin_info_envelopes() {
        let json = serde_json::to_value(OutboundMessage::progress("get_selection")).unwrap();
        assert_eq!(
            json,
            json!({"type": "command", "command": "get_selection", "message": "Executing: get_selection"})
        );

        let info = OutboundMessage::PluginInfo {
            data: PluginInfo {
                name: "Doc".to_string(),
                id: "Unknown ID".to_string(),
                user: None,
            },
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["type"], "plugin-info");
        assert_eq!(json["data"]["user"], Value::Null);
    }
}
