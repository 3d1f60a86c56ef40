//! Message gateway client.

mod send;

use crate::config::ClientCredentials;
use crate::error::{ConfigError, GatewayError};
use crate::transport::{HttpRequest, Transport};
use crate::types::ApiResult;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub use send::{SendLocationParams, SendMediaParams, SendMessageParams};

const SEND_MESSAGE_PATH: &str = "/message/send";
const SEND_MEDIA_PATH: &str = "/message/send-media";
const SEND_LOCATION_PATH: &str = "/message/send-location";

/// Client for the gateway's message endpoints.
///
/// Stateless per call; only the credentials are held, and they can be rotated.
#[derive(Clone)]
pub struct MessageGateway {
    credentials: ClientCredentials,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for MessageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageGateway")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl MessageGateway {
    /// Create a gateway over the default `reqwest` transport.
    #[cfg(feature = "reqwest")]
    pub fn new(credentials: ClientCredentials) -> Self {
        Self::with_transport(
            credentials,
            Arc::new(crate::transport::ReqwestTransport::new()),
        )
    }

    /// Create a gateway over the given transport.
    pub fn with_transport(credentials: ClientCredentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Replace the API key used for subsequent requests.
    pub fn set_api_key(&mut self, api_key: &str) -> std::result::Result<(), ConfigError> {
        self.credentials.set_api_key(api_key)
    }

    /// Replace the base URL used for subsequent requests.
    pub fn set_base_url(&mut self, base_url: &str) -> std::result::Result<(), ConfigError> {
        self.credentials.set_base_url(base_url)
    }

    /// Send a text message.
    #[instrument(skip(self, params), fields(session_id = %params.session_id, to = %params.to))]
    pub async fn send_message(&self, params: &SendMessageParams) -> Result<ApiResult> {
        self.post(SEND_MESSAGE_PATH, params).await
    }

    /// Send media (image, video, document) by URL.
    #[instrument(skip(self, params), fields(session_id = %params.session_id, to = %params.to))]
    pub async fn send_media(&self, params: &SendMediaParams) -> Result<ApiResult> {
        self.post(SEND_MEDIA_PATH, params).await
    }

    /// Send a location.
    #[instrument(skip(self, params), fields(session_id = %params.session_id, to = %params.to))]
    pub async fn send_location(&self, params: &SendLocationParams) -> Result<ApiResult> {
        self.post(SEND_LOCATION_PATH, params).await
    }

    /// POST `payload` as JSON and decode the envelope. Non-2xx responses become a
    /// [`GatewayError`] with the body's `message`; a body that is not JSON falls back to the
    /// status text, and either falls back to the status code.
    async fn post<P: Serialize>(&self, endpoint: &'static str, payload: &P) -> Result<ApiResult> {
        let body = serde_json::to_value(payload).map_err(|e| GatewayError {
            endpoint,
            status: None,
            message: format!("invalid request payload: {e}"),
        })?;
        let url = format!("{}{}", self.credentials.base_url(), endpoint);
        debug!(endpoint, "sending gateway request");

        let response = self
            .transport
            .execute(HttpRequest::post_json(url, self.credentials.api_key(), body))
            .await?;

        if !response.is_success() {
            // Status text only stands in for bodies that are not JSON at all.
            let message = match response.json() {
                Some(_) => response.server_message(),
                None => response.status_text.clone().filter(|s| !s.is_empty()),
            }
            .unwrap_or_else(|| format!("API request failed with status {}", response.status));
            warn!(endpoint, status = response.status, %message, "gateway request rejected");
            return Err(GatewayError {
                endpoint,
                status: Some(response.status),
                message,
            }
            .into());
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            GatewayError {
                endpoint,
                status: Some(response.status),
                message: format!("invalid response body: {e}"),
            }
            .into()
        })
    }
}
