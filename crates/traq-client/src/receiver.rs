//! Message receiver with polling.
//!
//! The hosting transport is swappable; this implementation polls the
//! activity timeline and yields each new message with its channel and
//! author already resolved, so downstream dispatch never has to block on
//! the network.

use crate::client::TraqClient;
use crate::types::Message;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

const TIMELINE_LIMIT: usize = 50;

/// Message receiver that polls for new messages.
pub struct MessageReceiver {
    client: TraqClient,
    poll_interval: Duration,
    ignore_user_id: Option<String>,
}

impl MessageReceiver {
    /// Create a new message receiver.
    pub fn new(client: TraqClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            ignore_user_id: None,
        }
    }

    /// Skip messages authored by this user (normally the bot itself).
    pub fn ignore_user(mut self, user_id: impl Into<String>) -> Self {
        self.ignore_user_id = Some(user_id.into());
        self
    }

    /// Start receiving messages as an async stream.
    ///
    /// The first successful poll only primes the watermark, so history
    /// posted before startup is never replayed.
    pub fn stream(self) -> impl Stream<Item = Message> {
        async_stream::stream! {
            let mut watermark: Option<DateTime<Utc>> = None;

            loop {
                match self.client.activity_timeline(TIMELINE_LIMIT).await {
                    Ok(records) => {
                        let newest = records.iter().map(|r| r.created_at).max();

                        if let Some(since) = watermark {
                            // Timeline is newest first; yield in arrival order.
                            for record in records.into_iter().rev() {
                                if record.created_at <= since {
                                    continue;
                                }
                                if self.ignore_user_id.as_deref() == Some(record.user_id.as_str()) {
                                    continue;
                                }
                                match self.client.get_message(&record.id).await {
                                    Ok(message) => {
                                        debug!(
                                            "Received message on #{} from @{}",
                                            message.channel.path, message.author.name
                                        );
                                        yield message;
                                    }
                                    Err(e) => error!("Failed to resolve message: {}", e),
                                }
                            }
                        }

                        if let Some(newest) = newest {
                            watermark = Some(watermark.map_or(newest, |w| w.max(newest)));
                        } else if watermark.is_none() {
                            // Empty instance; start delivering from here on.
                            watermark = Some(Utc::now());
                        }
                    }
                    Err(e) => {
                        error!("Timeline poll error: {}", e);
                        // Back off on error
                        sleep(Duration::from_secs(5)).await;
                        continue;
                    }
                }

                sleep(self.poll_interval).await;
            }
        }
    }
}
