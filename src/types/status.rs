use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Connection status reported by the remote service.
///
/// Holds the complete decoded body so fields the client does not know about survive.
/// The server promises a `status` field; the client passes the body through either way.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SessionStatus {
    body: Map<String, Value>,
}

impl SessionStatus {
    /// Wrap a decoded body. Returns `None` unless it is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(body) => Some(Self { body }),
            _ => None,
        }
    }

    /// The raw `status` value, e.g. `"pending"` or `"connected"`; empty when the server
    /// sent none or a non-string one.
    pub fn status(&self) -> &str {
        self.body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_status(self.status())
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Any field of the body.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.body
    }
}

/// Interpretation of [`SessionStatus::status`]. The remote service owns these values;
/// anything unrecognised is kept verbatim in [`SessionState::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Connected,
    Expired,
    Failed,
    Unknown(String),
}

impl SessionState {
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "pending" | "qr" | "waiting" | "scanning" => Self::Pending,
            "connected" | "authenticated" | "open" | "ready" => Self::Connected,
            "expired" | "timeout" => Self::Expired,
            "failed" | "error" | "closed" | "logged_out" => Self::Failed,
            _ => Self::Unknown(status.to_string()),
        }
    }

    /// Whether polling can stop: the session either connected or will not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Connected | Self::Expired | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Connected => f.write_str("connected"),
            Self::Expired => f.write_str("expired"),
            Self::Failed => f.write_str("failed"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}
