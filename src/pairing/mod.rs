//! QR session pairing: start a remote session, fetch its QR code, poll its status.
//!
//! The three steps are driven by the caller in order. [`QrSession`] keeps no state besides
//! its session id and credentials, so calls may be repeated or issued concurrently; each is
//! a single independent request.

use crate::config::ClientCredentials;
use crate::error::{HandshakeError, HandshakeStep};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::types::{QrEndpoint, QrPayload, SessionId, SessionStatus};
use crate::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Trailing routing segment of the base URL that the QR endpoint is *not* served under.
pub const API_ROOT_SEGMENT: &str = "/api";

const START_PATH: &str = "/auth/start";
const STATUS_PATH: &str = "/auth/status";

/// Result of [`QrSession::start`].
///
/// `qr` is always empty here: the QR payload is retrieved separately with
/// [`QrSession::fetch_qr`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrSessionResult {
    pub qr: String,
    pub qr_endpoint: QrEndpoint,
}

/// Authentication handshake bound to one session id.
#[derive(Clone)]
pub struct QrSession {
    session_id: SessionId,
    credentials: ClientCredentials,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for QrSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrSession")
            .field("session_id", &self.session_id)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl QrSession {
    /// Create a session handshake over the default `reqwest` transport.
    #[cfg(feature = "reqwest")]
    pub fn new(session_id: impl Into<SessionId>, credentials: ClientCredentials) -> Self {
        Self::with_transport(
            session_id,
            credentials,
            Arc::new(crate::transport::ReqwestTransport::new()),
        )
    }

    /// Create a session handshake over the given transport.
    pub fn with_transport(
        session_id: impl Into<SessionId>,
        credentials: ClientCredentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            credentials,
            transport,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Ask the server to start the session and return where its QR code can be fetched.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn start(&self) -> Result<QrSessionResult> {
        let url = format!("{}{}", self.credentials.base_url(), START_PATH);
        let request = HttpRequest::post_json(
            url,
            self.credentials.api_key(),
            json!({ "sessionId": self.session_id.as_str() }),
        );
        debug!("starting session");
        let response = self.transport.execute(request).await?;
        let body = Self::expect_success(HandshakeStep::Start, &response)?;

        let qr_endpoint = body
            .as_ref()
            .and_then(|b| b.get("qrEndpoint"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                HandshakeError::new(HandshakeStep::Start, Some(response.status), None)
            })?;
        Ok(QrSessionResult {
            qr: String::new(),
            qr_endpoint: QrEndpoint::new(qr_endpoint),
        })
    }

    /// Fetch the QR payload from an endpoint returned by [`start`](Self::start).
    ///
    /// The endpoint is served from the host root, so one trailing [`API_ROOT_SEGMENT`] is
    /// removed from the base URL before appending it. Pass the path exactly as returned,
    /// never an absolute URL.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn fetch_qr(&self, qr_endpoint: &QrEndpoint) -> Result<QrPayload> {
        let url = format!("{}{}", self.root_url(), qr_endpoint.as_str());
        debug!(%url, "fetching QR code");
        let response = self
            .transport
            .execute(HttpRequest::get(url, self.credentials.api_key()))
            .await?;

        let body = response.json();
        let qr = body
            .as_ref()
            .filter(|b| b.get("success").and_then(Value::as_bool) == Some(true))
            .and_then(|b| b.get("qr"))
            .and_then(Value::as_str)
            .filter(|qr| !qr.is_empty());
        match qr {
            Some(qr) if response.is_success() => Ok(QrPayload::new(qr)),
            _ => {
                let err = HandshakeError::new(
                    HandshakeStep::FetchQr,
                    Some(response.status),
                    response.server_message(),
                );
                warn!(status = response.status, error = %err, "QR code unavailable");
                Err(err.into())
            }
        }
    }

    /// Current session status as reported by the server, with every field it sent.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn check_status(&self) -> Result<SessionStatus> {
        let url = format!(
            "{}{}/{}",
            self.credentials.base_url(),
            STATUS_PATH,
            self.session_id
        );
        let response = self
            .transport
            .execute(HttpRequest::get(url, self.credentials.api_key()))
            .await?;
        let body = Self::expect_success(HandshakeStep::CheckStatus, &response)?;

        let status = body.and_then(SessionStatus::from_value).ok_or_else(|| {
            HandshakeError::new(HandshakeStep::CheckStatus, Some(response.status), None)
        })?;
        debug!(status = status.status(), "session status");
        Ok(status)
    }

    /// Base URL with one trailing [`API_ROOT_SEGMENT`] removed.
    fn root_url(&self) -> &str {
        let base = self.credentials.base_url();
        base.strip_suffix(API_ROOT_SEGMENT).unwrap_or(base)
    }

    /// Fail on a non-2xx status; otherwise return the decoded body, if it was JSON.
    fn expect_success(
        step: HandshakeStep,
        response: &HttpResponse,
    ) -> std::result::Result<Option<Value>, HandshakeError> {
        if response.is_success() {
            return Ok(response.json());
        }
        let err = HandshakeError::new(step, Some(response.status), response.server_message());
        warn!(status = response.status, %step, error = %err, "handshake step rejected");
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TransportError};
    use crate::transport::mock::MockTransport;
    use crate::transport::{Method, API_KEY_HEADER};
    use tokio_test::{assert_err, assert_ok};

    fn session(base_url: &str) -> (QrSession, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let creds = ClientCredentials::new(base_url, "test-key").unwrap();
        let session = QrSession::with_transport("dummy-session", creds, transport.clone());
        (session, transport)
    }

    fn handshake_err(err: Error) -> HandshakeError {
        match err {
            Error::Handshake(e) => e,
            other => panic!("expected handshake error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_returns_endpoint_and_empty_qr() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(200, json!({"qrEndpoint": "/x"}));

        let res = session.start().await.unwrap();
        assert_eq!(
            res,
            QrSessionResult {
                qr: String::new(),
                qr_endpoint: QrEndpoint::new("/x"),
            }
        );

        let reqs = transport.requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].method, Method::Post);
        assert_eq!(reqs[0].url, "https://h.com/api/auth/start");
        assert_eq!(reqs[0].header(API_KEY_HEADER), Some("test-key"));
        assert_eq!(reqs[0].header("content-type"), Some("application/json"));
        assert_eq!(reqs[0].body, Some(json!({"sessionId": "dummy-session"})));
    }

    #[tokio::test]
    async fn start_rejected_uses_server_message() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(400, json!({"message": "bad"}));

        let err = session.start().await.unwrap_err();
        assert_eq!(err.to_string(), "bad");
        let err = handshake_err(err);
        assert_eq!(err.step, HandshakeStep::Start);
        assert_eq!(err.status, Some(400));
    }

    #[tokio::test]
    async fn start_rejected_without_message_uses_fallback() {
        let (session, transport) = session("https://h.com/api");
        transport.push_raw(500, "<html>Internal Server Error</html>");

        let err = session.start().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to start session");
    }

    #[tokio::test]
    async fn start_success_with_unparseable_body_fails() {
        let (session, transport) = session("https://h.com/api");
        transport.push_raw(200, "not json");
        assert_err!(session.start().await);
    }

    #[tokio::test]
    async fn start_makes_exactly_one_attempt() {
        let (session, transport) = session("https://h.com/api");
        transport.push_error(TransportError::Timeout);
        transport.push_json(200, json!({"qrEndpoint": "/x"}));

        let err = session.start().await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Timeout)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn fetch_qr_strips_one_api_segment() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(200, json!({"success": true, "qr": "2@abc"}));

        let qr = session.fetch_qr(&QrEndpoint::new("/q/1")).await.unwrap();
        assert_eq!(qr.as_str(), "2@abc");

        let reqs = transport.requests();
        assert_eq!(reqs[0].method, Method::Get);
        assert_eq!(reqs[0].url, "https://h.com/q/1");
        assert_eq!(reqs[0].header(API_KEY_HEADER), Some("test-key"));
        assert!(reqs[0].body.is_none());
    }

    #[tokio::test]
    async fn fetch_qr_strips_only_the_last_api_segment() {
        let (session, transport) = session("https://h.com/api/api");
        transport.push_json(200, json!({"success": true, "qr": "x"}));
        assert_ok!(session.fetch_qr(&QrEndpoint::new("/q/1")).await);
        assert_eq!(transport.requests()[0].url, "https://h.com/api/q/1");
    }

    #[tokio::test]
    async fn fetch_qr_keeps_base_without_api_segment() {
        let (session, transport) = session("https://h.com/v1");
        transport.push_json(200, json!({"success": true, "qr": "x"}));
        assert_ok!(session.fetch_qr(&QrEndpoint::new("/q/1")).await);
        assert_eq!(transport.requests()[0].url, "https://h.com/v1/q/1");
    }

    #[tokio::test]
    async fn fetch_qr_empty_qr_fails_despite_200() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(200, json!({"success": true, "qr": ""}));

        let err = session
            .fetch_qr(&QrEndpoint::new("/q/1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to load QR code");
        assert_eq!(handshake_err(err).status, Some(200));
    }

    #[tokio::test]
    async fn fetch_qr_success_false_uses_server_message() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(
            200,
            json!({"success": false, "qr": "x", "message": "QR not ready"}),
        );

        let err = session
            .fetch_qr(&QrEndpoint::new("/q/1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "QR not ready");
    }

    #[tokio::test]
    async fn fetch_qr_http_failure() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(404, json!({"success": true, "qr": "x"}));

        let err = handshake_err(
            session
                .fetch_qr(&QrEndpoint::new("/q/1"))
                .await
                .unwrap_err(),
        );
        assert_eq!(err.step, HandshakeStep::FetchQr);
        assert_eq!(err.status, Some(404));
    }

    #[tokio::test]
    async fn fetch_qr_can_be_repeated() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(200, json!({"success": true, "qr": "first"}));
        transport.push_json(200, json!({"success": true, "qr": "second"}));
        let ep = QrEndpoint::new("/q/1");

        assert_eq!(session.fetch_qr(&ep).await.unwrap().as_str(), "first");
        assert_eq!(session.fetch_qr(&ep).await.unwrap().as_str(), "second");
    }

    #[tokio::test]
    async fn check_status_returns_full_body() {
        let (session, transport) = session("https://h.com/api");
        let body = json!({"status": "pending", "extra": {"n": 1}, "phone": null});
        transport.push_json(200, body.clone());

        let status = session.check_status().await.unwrap();
        assert_eq!(status.status(), "pending");
        assert_eq!(Value::Object(status.into_inner()), body);
        assert_eq!(
            transport.requests()[0].url,
            "https://h.com/api/auth/status/dummy-session"
        );
    }

    #[tokio::test]
    async fn check_status_failure_messages() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(401, json!({"message": "Invalid API key"}));
        transport.push_raw(502, "Bad Gateway");

        let err = session.check_status().await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid API key");
        let err = session.check_status().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to check status");
    }

    #[tokio::test]
    async fn check_status_passes_through_body_without_status() {
        let (session, transport) = session("https://h.com/api");
        let body = json!({"status": null, "connected": false});
        transport.push_json(200, body.clone());

        let status = session.check_status().await.unwrap();
        assert_eq!(status.status(), "");
        assert_eq!(Value::Object(status.into_inner()), body);
    }

    #[tokio::test]
    async fn check_status_non_json_success_body_fails() {
        let (session, transport) = session("https://h.com/api");
        transport.push_raw(200, "<html>ok</html>");
        let err = handshake_err(session.check_status().await.unwrap_err());
        assert_eq!(err.step, HandshakeStep::CheckStatus);
        assert_eq!(err.message, "Failed to check status");
    }

    #[tokio::test]
    async fn repeated_check_status_reflects_latest_response() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(200, json!({"status": "pending"}));
        transport.push_json(200, json!({"status": "connected", "user": "628123"}));

        let first = session.check_status().await.unwrap();
        let second = session.check_status().await.unwrap();
        assert!(!first.is_connected());
        assert!(second.is_connected());
        assert_eq!(second.get("user"), Some(&json!("628123")));
        assert_eq!(session.session_id().as_str(), "dummy-session");

        let reqs = transport.requests();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].url, reqs[1].url);
    }

    #[tokio::test]
    async fn concurrent_check_status_are_independent() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(200, json!({"status": "pending"}));
        transport.push_json(200, json!({"status": "pending"}));

        let (a, b) = tokio::join!(session.check_status(), session.check_status());
        assert_ok!(a);
        assert_ok!(b);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn calls_before_start_reach_the_server() {
        let (session, transport) = session("https://h.com/api");
        transport.push_json(404, json!({"message": "Session not found"}));

        let err = session.check_status().await.unwrap_err();
        assert_eq!(err.to_string(), "Session not found");
        assert_eq!(transport.requests().len(), 1);
    }
}
