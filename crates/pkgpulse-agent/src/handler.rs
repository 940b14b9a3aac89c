//! A2A protocol dispatcher.
//!
//! Decodes inbound envelopes, routes the user's intent, drives the analysis
//! pipeline, and assembles task results. Every outcome is a well-formed
//! JSON-RPC response; malformed input maps to the protocol error codes and
//! external-service trouble never surfaces past the analysis pipeline.

use crate::history::ConversationStore;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pkgpulse_core::{extract, format_report, AggregateReport, Analyzer, Ecosystem};
use pkgpulse_proto::{
    codes, Artifact, ExecuteParams, JsonRpcRequest, JsonRpcResponse, Message, MessageSendParams,
    Part, RpcError, TaskResult, TaskStatus, JSONRPC_VERSION, METHOD_EXECUTE, METHOD_MESSAGE_SEND,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Static help text returned for help requests and unrecognized input.
pub const HELP_TEXT: &str = "\n## Package Health Monitor Agent \u{1f4e6}\n\nI can help you check the health of your Python and npm packages!\n\n### Commands:\n\n**Analyze Python packages:**\n- \"Check flask==2.0.1, requests>=2.25.0\"\n- \"Analyze Python packages: numpy==1.19.0, pandas\"\n\n**Analyze npm packages:**\n- \"Check express@4.17.1, axios@0.21.1\"\n- \"Analyze npm packages: react@17.0.0, lodash@4.17.20\"\n\nI'll check for:\n\u{2705} Outdated versions\n\u{2705} Security vulnerabilities (CVEs)\n\u{2705} Deprecated packages\n\u{2705} Overall health score\n\nJust send me a list of packages and I'll analyze them for you!\n";

const HELP_KEYWORDS: [&str; 3] = ["help", "what can you do", "commands"];
const PYTHON_KEYWORDS: [&str; 3] = ["python", "pip", "requirements"];
const NPM_KEYWORDS: [&str; 3] = ["npm", "node", "javascript"];

/// What the user is asking for, decided by keyword priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Show the help text.
    Help,
    /// Analyze packages for a named ecosystem.
    Analyze(Ecosystem),
    /// No ecosystem named: try Python extraction, then npm.
    Auto,
}

/// Classify the user's text.
///
/// Case-insensitive containment checks, first match wins: help keywords,
/// then Python keywords, then npm keywords, else `Auto`.
#[must_use]
pub fn route_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    if HELP_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Intent::Help;
    }
    if PYTHON_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Intent::Analyze(Ecosystem::Python);
    }
    if NPM_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Intent::Analyze(Ecosystem::Npm);
    }
    Intent::Auto
}

/// Flatten a message's parts into one text blob.
///
/// Text parts pass through verbatim; file parts are base64-decoded when
/// possible and taken raw otherwise; data parts contribute the string or
/// the serialized object. Unknown kinds are skipped.
#[must_use]
pub fn extract_text(message: &Message) -> String {
    let mut chunks: Vec<String> = Vec::new();

    for part in &message.parts {
        match part.kind.as_str() {
            Part::KIND_TEXT => {
                if let Some(text) = &part.text {
                    chunks.push(text.clone());
                }
            }
            Part::KIND_FILE => {
                if let Some(data) = &part.data {
                    chunks.push(decode_file_payload(data));
                }
            }
            Part::KIND_DATA => match &part.data {
                Some(Value::String(s)) => chunks.push(s.clone()),
                Some(value @ Value::Object(_)) => chunks.push(value.to_string()),
                _ => {}
            },
            _ => {}
        }
    }

    chunks.join(" ")
}

/// Best-effort decode of a file payload: base64 then UTF-8, falling back to
/// the raw value. Decode failure never aborts the request.
fn decode_file_payload(data: &Value) -> String {
    let Some(raw) = data.as_str() else {
        return data.to_string();
    };

    match BASE64.decode(raw) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}

/// Validate the raw envelope before typed decoding.
///
/// Returns the rejection response for a wrong `jsonrpc` tag or a
/// missing/empty `id` (`INVALID_REQUEST`, echoing whatever id could be
/// recovered), `None` when the envelope may proceed. Runs before any
/// business logic.
#[must_use]
pub fn check_envelope(body: &Value) -> Option<JsonRpcResponse> {
    let id = body.get("id").and_then(Value::as_str).map(String::from);

    if body.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Some(JsonRpcResponse::error(
            id,
            RpcError::with_details(codes::INVALID_REQUEST, "Invalid Request", "jsonrpc must be '2.0'"),
        ));
    }

    if id.as_deref().map_or(true, str::is_empty) {
        return Some(JsonRpcResponse::error(
            None,
            RpcError::with_details(codes::INVALID_REQUEST, "Invalid Request", "id is required"),
        ));
    }

    None
}

fn new_context_id() -> String {
    Uuid::new_v4().to_string()
}

fn usage_hint(ecosystem: Ecosystem) -> String {
    match ecosystem {
        Ecosystem::Python => {
            "Please provide Python packages to analyze. Example: `flask==2.0.1, requests>=2.25.0`"
                .to_string()
        }
        Ecosystem::Npm => {
            "Please provide npm packages to analyze. Example: `express@4.17.1, axios@0.21.1`"
                .to_string()
        }
    }
}

fn report_artifact(report: &AggregateReport) -> Artifact {
    Artifact::new(
        "package-health-report.json",
        vec![Part::data(serde_json::to_value(report).unwrap_or_default())],
    )
}

fn invalid_params(id: String, error: impl std::fmt::Display) -> JsonRpcResponse {
    JsonRpcResponse::error(
        Some(id),
        RpcError::new(codes::INVALID_PARAMS, format!("Invalid params: {error}")),
    )
}

/// Handler for A2A protocol exchanges.
pub struct AgentHandler {
    analyzer: Analyzer,
    history: Arc<dyn ConversationStore>,
}

impl AgentHandler {
    /// Create a handler over an analyzer and a conversation store.
    #[must_use]
    pub fn new(analyzer: Analyzer, history: Arc<dyn ConversationStore>) -> Self {
        Self { analyzer, history }
    }

    /// Handle a decoded request envelope.
    ///
    /// Each exchange runs to completion before the response is returned;
    /// there is no background work.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!(method = %request.method, id = %request.id, "a2a request");

        match request.method.as_str() {
            METHOD_MESSAGE_SEND => self.handle_message_send(request).await,
            METHOD_EXECUTE => self.handle_execute(request).await,
            other => JsonRpcResponse::error(
                Some(request.id),
                RpcError::new(codes::METHOD_NOT_FOUND, format!("Method not found: {other}")),
            ),
        }
    }

    async fn handle_message_send(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: MessageSendParams = match serde_json::from_value(request.params) {
            Ok(params) => params,
            Err(e) => return invalid_params(request.id, e),
        };

        let inbound = params.message;
        let task_id = inbound.task_id.clone();
        let context_id = task_id.clone().unwrap_or_else(new_context_id);
        let user_text = extract_text(&inbound);
        info!(
            context = %context_id,
            parts = inbound.parts.len(),
            "message/send"
        );

        self.history.append(&context_id, inbound).await;

        let (response_text, artifacts) = self.process_user_message(&user_text).await;

        let agent_message = Message::agent_text(response_text, Some(context_id.clone()));
        self.history.append(&context_id, agent_message.clone()).await;

        let result = TaskResult {
            id: task_id.unwrap_or_else(new_context_id),
            context_id: context_id.clone(),
            status: TaskStatus::completed(agent_message),
            artifacts,
            history: self.history.snapshot(&context_id).await,
            kind: "task".to_string(),
        };

        JsonRpcResponse::result(request.id, result)
    }

    async fn handle_execute(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: ExecuteParams = match serde_json::from_value(request.params) {
            Ok(params) => params,
            Err(e) => return invalid_params(request.id, e),
        };

        let context_id = params.context_id.clone().unwrap_or_else(new_context_id);

        // History reflects everything the caller sent, even when the batch
        // turns out not to contain a user message.
        let last_user = params
            .messages
            .iter()
            .rev()
            .find(|m| m.role == pkgpulse_proto::Role::User)
            .cloned();
        self.history.append_all(&context_id, params.messages).await;

        let Some(user_message) = last_user else {
            return JsonRpcResponse::error(
                Some(request.id),
                RpcError::new(
                    codes::INVALID_PARAMS,
                    "No user message found in execute request",
                ),
            );
        };

        let user_text = extract_text(&user_message);
        let (response_text, artifacts) = self.process_user_message(&user_text).await;

        let agent_message = Message::agent_text(response_text, params.task_id.clone());
        self.history.append(&context_id, agent_message.clone()).await;

        let result = TaskResult {
            id: params.task_id.unwrap_or_else(new_context_id),
            context_id: context_id.clone(),
            status: TaskStatus::completed(agent_message),
            artifacts,
            history: self.history.snapshot(&context_id).await,
            kind: "task".to_string(),
        };

        JsonRpcResponse::result(request.id, result)
    }

    /// Turn the user's text into a reply and optional artifacts.
    ///
    /// Priority order: help, named Python, named npm, then auto-detection
    /// (Python preferred). Every branch returns; artifacts are attached
    /// only when an aggregate report was produced.
    async fn process_user_message(&self, user_text: &str) -> (String, Vec<Artifact>) {
        match route_intent(user_text) {
            Intent::Help => (HELP_TEXT.to_string(), Vec::new()),
            Intent::Analyze(ecosystem) => {
                let specifiers = extract(user_text, ecosystem);
                if specifiers.is_empty() {
                    return (usage_hint(ecosystem), Vec::new());
                }
                self.run_analysis(&specifiers, ecosystem).await
            }
            Intent::Auto => {
                let python = extract(user_text, Ecosystem::Python);
                if !python.is_empty() {
                    return self.run_analysis(&python, Ecosystem::Python).await;
                }
                let npm = extract(user_text, Ecosystem::Npm);
                if !npm.is_empty() {
                    return self.run_analysis(&npm, Ecosystem::Npm).await;
                }
                (HELP_TEXT.to_string(), Vec::new())
            }
        }
    }

    async fn run_analysis(
        &self,
        specifiers: &[pkgpulse_core::Specifier],
        ecosystem: Ecosystem,
    ) -> (String, Vec<Artifact>) {
        let report = self.analyzer.analyze(specifiers, ecosystem).await;
        let text = format_report(report.as_ref(), ecosystem.label());
        let artifacts = report.as_ref().map(report_artifact).into_iter().collect();
        (text, artifacts)
    }
}
