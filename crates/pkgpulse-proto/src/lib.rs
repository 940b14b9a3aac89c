#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Wire types for the A2A (agent-to-agent) protocol.
//!
//! This crate defines the JSON-RPC 2.0 envelope and the message, task, and
//! artifact types exchanged with A2A callers.
//!
//! ## Wire format
//! Plain JSON-RPC 2.0 over HTTP: a request carries `jsonrpc`, `id`, `method`
//! and method-specific `params`; a response carries either `result` or
//! `error`, never both. Field names are part of the compatibility surface
//! and must not change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only supported JSON-RPC protocol version tag.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name for single-message exchanges.
pub const METHOD_MESSAGE_SEND: &str = "message/send";

/// Method name for batched-message exchanges.
pub const METHOD_EXECUTE: &str = "execute";

/// JSON-RPC error codes (per the JSON-RPC 2.0 convention).
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn message_kind() -> String {
    "message".to_string()
}

fn task_kind() -> String {
    "task".to_string()
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    System,
}

/// One part of a message body.
///
/// `kind` is an open string: `text`, `file`, and `data` are interpreted;
/// anything else is carried through untouched. Unknown sibling fields are
/// preserved in `extra` so a decode/encode round trip is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Part {
    /// Part kind carrying plain text.
    pub const KIND_TEXT: &'static str = "text";
    /// Part kind carrying an uploaded file payload.
    pub const KIND_FILE: &'static str = "file";
    /// Part kind carrying structured data.
    pub const KIND_DATA: &'static str = "data";

    /// Create a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Self::KIND_TEXT.to_string(),
            text: Some(text.into()),
            data: None,
            file_url: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Create a data part.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Self {
            kind: Self::KIND_DATA.to_string(),
            text: None,
            data: Some(data),
            file_url: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// A chat message exchanged over the protocol.
///
/// Immutable once appended to a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "message_kind")]
    pub kind: String,
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(rename = "messageId", default = "new_id")]
    pub message_id: String,
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Message {
    /// Create an agent-authored message with a single text part.
    #[must_use]
    pub fn agent_text(text: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            kind: message_kind(),
            role: Role::Agent,
            parts: vec![Part::text(text)],
            message_id: new_id(),
            task_id,
            metadata: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Create a user-authored message with a single text part.
    #[must_use]
    pub fn user_text(text: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            kind: message_kind(),
            role: Role::User,
            parts: vec![Part::text(text)],
            message_id: new_id(),
            task_id,
            metadata: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Push notification target for non-blocking exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushNotificationConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Value>,
}

fn default_blocking() -> bool {
    true
}

/// Delivery configuration attached to `message/send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageConfiguration {
    #[serde(default = "default_blocking")]
    pub blocking: bool,
    #[serde(rename = "acceptedOutputModes", skip_serializing_if = "Option::is_none")]
    pub accepted_output_modes: Option<Vec<String>>,
    #[serde(rename = "pushNotificationConfig", skip_serializing_if = "Option::is_none")]
    pub push_notification_config: Option<PushNotificationConfig>,
}

/// Params for the `message/send` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSendParams {
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<MessageConfiguration>,
}

/// Params for the `execute` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteParams {
    #[serde(rename = "contextId", default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(rename = "taskId", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub messages: Vec<Message>,
}

/// A decoded JSON-RPC request envelope.
///
/// `method` stays a plain string so an unsupported method can be answered
/// with `METHOD_NOT_FOUND` instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Working,
    Completed,
    InputRequired,
    Failed,
}

/// Status of a task, stamped when the status is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl TaskStatus {
    /// Build a `completed` status carrying the agent's reply.
    #[must_use]
    pub fn completed(message: Message) -> Self {
        Self {
            state: TaskState::Completed,
            timestamp: chrono::Utc::now().to_rfc3339(),
            message: Some(message),
        }
    }
}

/// A machine-readable artifact attached to a task result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "artifactId", default = "new_id")]
    pub artifact_id: String,
    pub name: String,
    pub parts: Vec<Part>,
}

impl Artifact {
    /// Create an artifact with a freshly minted id.
    #[must_use]
    pub fn new(name: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            artifact_id: new_id(),
            name: name.into(),
            parts,
        }
    }
}

/// The result payload of a successful exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: String,
    #[serde(rename = "contextId")]
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default = "task_kind")]
    pub kind: String,
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Create an error with no attached data.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error with a `{"details": ...}` data payload.
    #[must_use]
    pub fn with_details(code: i32, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(serde_json::json!({ "details": details.into() })),
        }
    }
}

/// A JSON-RPC response envelope.
///
/// Exactly one of `result` / `error` is present; the constructors enforce
/// this. `id` is `None` only when the inbound id could not be recovered
/// (parse errors, missing id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    /// Build a success response.
    #[must_use]
    pub fn result(id: impl Into<String>, result: TaskResult) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn error(id: Option<String>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}
