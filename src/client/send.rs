//! Send request types.

use serde::Serialize;

/// Text message.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    pub session_id: String,
    pub to: String,
    pub message: String,
}

/// Image, video or document by URL. An absent or empty caption is left out of the payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaParams {
    pub session_id: String,
    pub to: String,
    pub media_url: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub caption: Option<String>,
}

/// Location pin. An absent or empty description is left out of the payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLocationParams {
    pub session_id: String,
    pub to: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}
