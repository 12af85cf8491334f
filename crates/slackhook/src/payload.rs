use serde::{Serialize, Serializer};
use serde_json::Value;

/// Message posted to an incoming webhook.
///
/// Every display override is optional; unset or empty values are left out
/// of the payload so the webhook's own defaults apply. `text` is always sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlackMessage {
    #[serde(skip_serializing_if = "is_blank")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub icon_url: Option<String>,
    /// Sent as `1` when enabled, omitted otherwise.
    #[serde(skip_serializing_if = "is_false", serialize_with = "as_flag")]
    pub link_names: bool,
    #[serde(skip_serializing_if = "is_empty_list")]
    pub attachments: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "is_empty_list")]
    pub blocks: Option<Vec<Value>>,
    #[serde(rename = "text")]
    pub message: String,
}

impl SlackMessage {
    /// Compact JSON body for the webhook request.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_empty_list(value: &Option<Vec<Value>>) -> bool {
    value.as_ref().map_or(true, Vec::is_empty)
}

fn as_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}
