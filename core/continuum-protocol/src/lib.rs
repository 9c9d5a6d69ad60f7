//! IPC protocol types and validation for continuum-daemon.
//!
//! Shared by the daemon and its clients to prevent schema drift. The daemon
//! remains the authority on validation, but clients can reuse the same types
//! to construct valid requests.
//!
//! Framing: one JSON [`Request`] per line in, one JSON [`Response`] per line out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024; // 1MB
pub const MAX_TEXT_CHARS: usize = 4096;
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const MAX_HISTORY_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Method {
    GetHealth,
    GetSummary,
    GetContext,
    GetHistory,
    GetTasks,
    LogNote,
    SetPhase,
    AddTask,
    CompleteTask,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    pub protocol_version: u32,
    pub method: Method,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(method: Method, params: Option<Value>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            method,
            id: None,
            params,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl Response {
    pub fn ok(id: Option<String>, data: Value) -> Self {
        Self {
            ok: true,
            id,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(id: Option<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(ErrorInfo::new(code, message)),
        }
    }

    pub fn error_with_info(id: Option<String>, error: ErrorInfo) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(error),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Params
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogNoteParams {
    pub notes: String,
    #[serde(rename = "type", default = "default_note_type")]
    pub kind: String,
}

fn default_note_type() -> String {
    "note".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseParams {
    pub phase: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskParams {
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryParams {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl HistoryParams {
    /// Requested limit, defaulted and clamped to [`MAX_HISTORY_LIMIT`].
    pub fn effective_limit(&self) -> usize {
        self.limit
            .map(|limit| limit.min(MAX_HISTORY_LIMIT as u64) as usize)
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
    }
}

pub fn parse_log_note(params: Option<Value>) -> Result<LogNoteParams, ErrorInfo> {
    let parsed: LogNoteParams = parse_required(params, "notes is required")?;
    validate_text("notes", &parsed.notes)?;
    validate_text("type", &parsed.kind)?;
    Ok(parsed)
}

pub fn parse_phase(params: Option<Value>) -> Result<PhaseParams, ErrorInfo> {
    let parsed: PhaseParams = parse_required(params, "phase is required")?;
    // An empty phase clears it; only the length is checked.
    if parsed.phase.chars().count() > MAX_TEXT_CHARS {
        return Err(too_long("phase"));
    }
    Ok(parsed)
}

pub fn parse_task(params: Option<Value>) -> Result<TaskParams, ErrorInfo> {
    let parsed: TaskParams = parse_required(params, "task is required")?;
    validate_text("task", &parsed.task)?;
    Ok(parsed)
}

pub fn parse_history(params: Option<Value>) -> Result<HistoryParams, ErrorInfo> {
    match params {
        None | Some(Value::Null) => Ok(HistoryParams::default()),
        Some(value) => {
            let mut parsed: HistoryParams = parse_object(value)?;
            if parsed.kind.as_deref().is_some_and(|k| k.trim().is_empty()) {
                parsed.kind = None;
            }
            Ok(parsed)
        }
    }
}

fn parse_required<T: serde::de::DeserializeOwned>(
    params: Option<Value>,
    missing: &str,
) -> Result<T, ErrorInfo> {
    match params {
        None | Some(Value::Null) => Err(ErrorInfo::new("invalid_params", missing)),
        Some(value) => parse_object(value),
    }
}

fn parse_object<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ErrorInfo> {
    if !value.is_object() {
        return Err(ErrorInfo::new("invalid_params", "params must be an object"));
    }
    serde_json::from_value(value)
        .map_err(|err| ErrorInfo::new("invalid_params", format!("invalid params: {}", err)))
}

fn validate_text(field: &str, value: &str) -> Result<(), ErrorInfo> {
    if value.trim().is_empty() {
        return Err(ErrorInfo::new(
            "invalid_params",
            format!("{} must not be empty", field),
        ));
    }
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(too_long(field));
    }
    Ok(())
}

fn too_long(field: &str) -> ErrorInfo {
    ErrorInfo::new(
        "invalid_params",
        format!("{} must be {} characters or fewer", field, MAX_TEXT_CHARS),
    )
}
