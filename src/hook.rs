use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use tracing::debug;

/// Read the hook payload off stdin.
///
/// The contents are unused beyond protocol compliance, but stdin must be
/// drained on every invocation, even when empty or malformed, so the
/// upstream runner never trips over a closed pipe.
pub fn read_payload<R: Read>(mut reader: R) -> Value {
    let mut buf = String::new();
    if reader.read_to_string(&mut buf).is_err() {
        return Value::Null;
    }

    let payload = serde_json::from_str(&buf).unwrap_or(Value::Null);
    if let Some(event) = payload.get("hook_event_name").and_then(Value::as_str) {
        debug!("hook payload event: {event}");
    }
    payload
}

/// The single response line the runner consumes from stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
}

impl HookResponse {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            system_message: Some(text.into()),
            decision: None,
        }
    }

    pub fn approve() -> Self {
        Self {
            system_message: None,
            decision: Some(Decision::Approve),
        }
    }

    pub fn approve_with(text: impl Into<String>) -> Self {
        Self {
            system_message: Some(text.into()),
            decision: Some(Decision::Approve),
        }
    }
}

/// Emit the one response line. Serialization of this shape cannot fail; if
/// it somehow did, stdout stays silent rather than half-written.
pub fn emit(response: &HookResponse) {
    if let Ok(line) = serde_json::to_string(response) {
        println!("{line}");
    }
}
