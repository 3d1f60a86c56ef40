//! Transport abstraction for the request layer.
//!
//! Implement this trait to plug in a different HTTP stack, or a scripted one in tests.
//! Each call is exactly one request/response cycle; nothing is pooled, queued or retried here.

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;

/// Header carrying the static API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP methods used by the gateway API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully resolved outgoing request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body; sent with `Content-Type: application/json` when present.
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// GET carrying only the API key header.
    pub fn get(url: impl Into<String>, api_key: &str) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: vec![(API_KEY_HEADER.to_string(), api_key.to_string())],
            body: None,
        }
    }

    /// POST with a JSON body, the API key and a JSON content type.
    pub fn post_json(url: impl Into<String>, api_key: &str, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                (API_KEY_HEADER.to_string(), api_key.to_string()),
            ],
            body: Some(body),
        }
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response as received; decoding is left to the caller.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase for the status, if known.
    pub status_text: Option<String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as JSON, or `None` if it is not valid JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Non-empty `message` field of a JSON body, if any.
    pub fn server_message(&self) -> Option<String> {
        self.json()
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// Async trait for the HTTP transport used by [`QrSession`](crate::QrSession) and
/// [`MessageGateway`](crate::MessageGateway).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request and return the response, whatever its status.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::{HttpRequest, HttpResponse, Method, Transport};
    use crate::error::TransportError;
    use async_trait::async_trait;
    use std::time::Duration;

    /// [`Transport`] backed by `reqwest`.
    #[derive(Clone, Debug, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Transport whose requests fail with [`TransportError::Timeout`] after `timeout`.
        pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| TransportError::Request(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap an existing `reqwest::Client`.
        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    fn map_err(e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e.to_string())
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let mut builder = match request.method {
                Method::Get => self.client.get(&request.url),
                Method::Post => self.client.post(&request.url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                let bytes =
                    serde_json::to_vec(body).map_err(|e| TransportError::Request(e.to_string()))?;
                builder = builder.body(bytes);
            }

            let response = builder.send().await.map_err(map_err)?;
            let status = response.status();
            let body = response.bytes().await.map_err(map_err)?;
            Ok(HttpResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().map(str::to_string),
                body,
            })
        }
    }
}
