//! traQ HTTP client.

use crate::error::TraqError;
use crate::types::*;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use urlencoding::encode;

/// The channel message endpoint rejects limits of 200 and above,
/// so paged reads step in chunks below that.
const MESSAGE_PAGE_SIZE: usize = 150;

/// traQ REST API client.
#[derive(Clone)]
pub struct TraqClient {
    client: Client,
    base_url: String,
}

impl TraqClient {
    /// Create a new client with a bot access token.
    pub fn new(base_url: impl Into<String>, access_token: &str) -> Result<Self, TraqError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| TraqError::InvalidToken)?;
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn check(response: Response) -> Result<Response, TraqError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TraqError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Get the bot's own user record.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, TraqError> {
        let response = self
            .client
            .get(format!("{}/users/me", self.base_url))
            .send()
            .await?;
        let me: UserResponse = Self::check(response).await?.json().await?;

        Ok(User {
            id: me.id,
            name: me.name,
            display_name: me.display_name,
            is_bot: true,
        })
    }

    /// Get a user by UUID.
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> Result<User, TraqError> {
        let response = self
            .client
            .get(format!("{}/users/{}", self.base_url, encode(user_id)))
            .send()
            .await?;
        let user: UserResponse = Self::check(response).await?.json().await?;

        Ok(User {
            id: user.id,
            name: user.name,
            display_name: user.display_name,
            is_bot: user.bot,
        })
    }

    async fn get_channel_raw(&self, channel_id: &str) -> Result<ChannelResponse, TraqError> {
        let response = self
            .client
            .get(format!("{}/channels/{}", self.base_url, encode(channel_id)))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Get a channel by UUID, resolving its full path by walking parents.
    #[instrument(skip(self))]
    pub async fn get_channel(&self, channel_id: &str) -> Result<Channel, TraqError> {
        let channel = self.get_channel_raw(channel_id).await?;
        let mut path = channel.name.clone();

        let mut parent_id = channel.parent_id.clone();
        while let Some(id) = parent_id {
            let parent = self.get_channel_raw(&id).await?;
            path = format!("{}/{}", parent.name, path);
            parent_id = parent.parent_id;
        }

        Ok(Channel {
            id: channel.id,
            name: channel.name,
            path,
        })
    }

    /// List the UUIDs of a channel's direct children.
    pub async fn get_children(&self, channel_id: &str) -> Result<Vec<String>, TraqError> {
        Ok(self.get_channel_raw(channel_id).await?.children)
    }

    /// Get a message by UUID with its channel and author resolved.
    #[instrument(skip(self))]
    pub async fn get_message(&self, message_id: &str) -> Result<Message, TraqError> {
        let response = self
            .client
            .get(format!("{}/messages/{}", self.base_url, encode(message_id)))
            .send()
            .await?;
        let message: MessageResponse = Self::check(response).await?.json().await?;

        let channel = self.get_channel(&message.channel_id).await?;
        let author = self.get_user(&message.user_id).await?;
        Ok(Message::from_response(message, channel, author))
    }

    /// Post a message to a channel.
    #[instrument(skip(self, content))]
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), TraqError> {
        let request = PostMessageRequest {
            content: content.to_string(),
            embed: true,
        };

        let response = self
            .client
            .post(format!(
                "{}/channels/{}/messages",
                self.base_url,
                encode(channel_id)
            ))
            .json(&request)
            .send()
            .await?;
        Self::check(response).await?;

        debug!("Sent message to channel {}", channel_id);
        Ok(())
    }

    /// Put a stamp on a message.
    #[instrument(skip(self))]
    pub async fn add_stamp(&self, message_id: &str, stamp_id: &str) -> Result<(), TraqError> {
        let response = self
            .client
            .post(format!(
                "{}/messages/{}/stamps/{}",
                self.base_url,
                encode(message_id),
                encode(stamp_id)
            ))
            .json(&serde_json::json!({ "count": 1 }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Make the bot join a channel.
    pub async fn join_channel(&self, bot_id: &str, channel_id: &str) -> Result<(), TraqError> {
        self.bot_action(bot_id, channel_id, "join").await
    }

    /// Make the bot leave a channel.
    pub async fn leave_channel(&self, bot_id: &str, channel_id: &str) -> Result<(), TraqError> {
        self.bot_action(bot_id, channel_id, "leave").await
    }

    async fn bot_action(
        &self,
        bot_id: &str,
        channel_id: &str,
        action: &str,
    ) -> Result<(), TraqError> {
        let request = BotActionRequest {
            channel_id: channel_id.to_string(),
        };

        let response = self
            .client
            .post(format!(
                "{}/bots/{}/actions/{}",
                self.base_url,
                encode(bot_id),
                action
            ))
            .json(&request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// List every stamp on the instance.
    pub async fn get_stamps(&self) -> Result<Vec<StampResponse>, TraqError> {
        let response = self
            .client
            .get(format!("{}/stamps", self.base_url))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// List every user, suspended accounts included.
    pub async fn get_users(&self) -> Result<Vec<UserResponse>, TraqError> {
        let response = self
            .client
            .get(format!("{}/users", self.base_url))
            .query(&[("include-suspended", "true")])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// List every public channel. DM channels are excluded.
    pub async fn get_channels(&self) -> Result<ChannelList, TraqError> {
        let response = self
            .client
            .get(format!("{}/channels", self.base_url))
            .query(&[("include-dm", "false")])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Latest messages across public channels, newest first.
    pub async fn activity_timeline(&self, limit: usize) -> Result<Vec<MessageResponse>, TraqError> {
        let response = self
            .client
            .get(format!("{}/activity/timeline", self.base_url))
            .query(&[("limit", limit.to_string()), ("all", "true".to_string())])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Recent messages on a channel, newest first, resolved into [`Message`]s.
    ///
    /// Reads in pages and reuses author lookups within the call, since
    /// fetching the same user once per message trips the API rate limit.
    #[instrument(skip(self))]
    pub async fn recent_messages(
        &self,
        channel: &Channel,
        limit: usize,
    ) -> Result<Vec<Message>, TraqError> {
        let mut records: Vec<MessageResponse> = Vec::new();

        let mut offset = 0;
        while offset < limit {
            let response = self
                .client
                .get(format!(
                    "{}/channels/{}/messages",
                    self.base_url,
                    encode(&channel.id)
                ))
                .query(&[
                    ("limit", MESSAGE_PAGE_SIZE.to_string()),
                    ("offset", offset.to_string()),
                ])
                .send()
                .await?;
            let page: Vec<MessageResponse> = Self::check(response).await?.json().await?;

            let last_page = page.len() < MESSAGE_PAGE_SIZE;
            records.extend(page);
            if last_page {
                break;
            }
            offset += MESSAGE_PAGE_SIZE;
        }
        records.truncate(limit);

        let mut authors: HashMap<String, User> = HashMap::new();
        let mut messages = Vec::with_capacity(records.len());
        for record in records {
            if !authors.contains_key(&record.user_id) {
                let user = self.get_user(&record.user_id).await?;
                authors.insert(record.user_id.clone(), user);
            }
            let author = authors[&record.user_id].clone();
            messages.push(Message::from_response(record, channel.clone(), author));
        }

        Ok(messages)
    }
}
