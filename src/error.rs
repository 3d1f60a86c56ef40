use thiserror::Error;

/// Library result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the gateway client.
///
/// Handshake and gateway failures display only their human-readable message,
/// so `err.to_string()` is exactly what the server (or the fallback) said.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

/// Missing or invalid credentials at construction time. Never recoverable by retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "WHATSAPP_API_URL is required (pass it explicitly or provide it through the environment)"
    )]
    MissingBaseUrl,

    #[error(
        "WHATSAPP_API_KEY is required (pass it explicitly or provide it through the environment)"
    )]
    MissingApiKey,
}

/// Step of the QR session handshake that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    Start,
    FetchQr,
    CheckStatus,
}

impl HandshakeStep {
    /// Message used when the server gives no usable `message` field.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Start => "Failed to start session",
            Self::FetchQr => "Failed to load QR code",
            Self::CheckStatus => "Failed to check status",
        }
    }
}

impl std::fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::FetchQr => "fetch QR",
            Self::CheckStatus => "check status",
        };
        f.write_str(name)
    }
}

/// A step of the QR handshake was rejected or returned an unusable body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandshakeError {
    pub step: HandshakeStep,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    pub message: String,
}

impl HandshakeError {
    /// Build an error from an optional server message, falling back to the step's generic text.
    pub fn new(step: HandshakeStep, status: Option<u16>, message: Option<String>) -> Self {
        Self {
            step,
            status,
            message: message.unwrap_or_else(|| step.fallback_message().to_string()),
        }
    }
}

/// A message-send call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GatewayError {
    /// Endpoint path the request was sent to (e.g. `/message/send`).
    pub endpoint: &'static str,
    /// HTTP status; `None` when the request payload could not be serialized and nothing was sent.
    pub status: Option<u16>,
    pub message: String,
}

/// Network-level failures. The client never retries them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("timeout")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_error_displays_server_message() {
        let err: Error =
            HandshakeError::new(HandshakeStep::Start, Some(400), Some("bad".into())).into();
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn handshake_error_falls_back_per_step() {
        let err = HandshakeError::new(HandshakeStep::FetchQr, Some(200), None);
        assert_eq!(err.to_string(), "Failed to load QR code");
        let err = HandshakeError::new(HandshakeStep::CheckStatus, None, None);
        assert_eq!(err.message, "Failed to check status");
    }

    #[test]
    fn config_error_names_env_var() {
        assert!(ConfigError::MissingApiKey
            .to_string()
            .contains("WHATSAPP_API_KEY"));
    }
}
