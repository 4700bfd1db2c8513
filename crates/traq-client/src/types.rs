//! traQ API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw message record as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Response of the channel listing endpoint. DM channels are excluded
/// at request time, so only the public list is populated.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelList {
    pub public: Vec<ChannelResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StampResponse {
    pub id: String,
    pub name: String,
}

/// Body for posting a message to a channel.
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    pub content: String,
    /// Let the server re-encode mentions/links in the posted content.
    pub embed: bool,
}

/// Body for the bot join/leave action endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotActionRequest {
    pub channel_id: String,
}

/// A channel with its full slash-separated path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// e.g. "team/sound/1dtm"
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    /// Login name, without the leading `@`.
    pub name: String,
    pub display_name: String,
    pub is_bot: bool,
}

/// A message with its channel and author resolved.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub channel: Channel,
    pub author: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Combine a raw record with its resolved channel and author.
    pub fn from_response(response: MessageResponse, channel: Channel, author: User) -> Self {
        Self {
            id: response.id,
            text: response.content,
            channel,
            author,
            created_at: response.created_at,
            updated_at: response.updated_at,
        }
    }
}
