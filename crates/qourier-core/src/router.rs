//! Per-message dispatch.
//!
//! One pass per incoming message: scan embeds, decide whether the message
//! is a mention-prefixed command invocation, and either run the command or
//! hand the message to the plain-message callback. Every failure path ends
//! in a callback or a log line; nothing propagates to the caller.

use crate::command::{Command, Registry};
use crate::embed::scan;
use crate::error::CommandError;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;
use traq_client::Message;

/// Embed kind that denotes a user mention.
const MENTION_KIND: &str = "user";

type PlainCallback = Arc<dyn Fn(Message) -> BoxFuture<'static, ()> + Send + Sync>;
type FailCallback =
    Arc<dyn Fn(Message, Arc<Command>, CommandError) -> BoxFuture<'static, ()> + Send + Sync>;

/// Terminal state of one dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A registered command matched and its handler succeeded.
    Command { name: String },
    /// Routed to the plain-message path (no mention prefix, or an
    /// unrecognized word after one).
    Plain,
    /// A registered command matched but matching or the handler failed;
    /// the failure callback has been invoked.
    Failed { name: String },
}

/// Routes messages to command handlers or the plain-message callback.
///
/// The registry is fixed at construction; a dispatch pass keeps all its
/// state on the stack, so the router can serve concurrent messages.
pub struct Router {
    registry: Registry,
    bot_user_id: String,
    on_plain: Option<PlainCallback>,
    on_fail: Option<FailCallback>,
}

impl Router {
    pub fn new(registry: Registry, bot_user_id: impl Into<String>) -> Self {
        Self {
            registry,
            bot_user_id: bot_user_id.into(),
            on_plain: None,
            on_fail: None,
        }
    }

    /// Callback for messages that are not command invocations.
    pub fn on_plain<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_plain = Some(Arc::new(move |message| Box::pin(callback(message))));
        self
    }

    /// Callback for command invocations that fail. Without one, failures
    /// are logged.
    pub fn on_fail<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(Message, Arc<Command>, CommandError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_fail = Some(Arc::new(move |message, command, error| {
            Box::pin(callback(message, command, error))
        }));
        self
    }

    /// Run one dispatch pass for an incoming message.
    pub async fn dispatch(&self, message: Message) -> Dispatch {
        let (_, embeds) = scan(&message.text);

        // Command interpretation requires the bot's own mention as the
        // very first thing in the message.
        let mention_end = match embeds.first() {
            Some(embed)
                if embed.start == 0
                    && embed.kind == MENTION_KIND
                    && embed.id == self.bot_user_id =>
            {
                embed.end
            }
            _ => return self.plain_message(message).await,
        };

        // Embed offsets are code points into the original text.
        let after: String = message.text.chars().skip(mention_end).collect();
        let trimmed = after.trim();
        let (name, remainder) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (trimmed, ""),
        };

        let Some(command) = self.registry.get(name) else {
            // An unrecognized word after a mention is conversation directed
            // at the bot, not an error.
            return self.plain_message(message).await;
        };
        let command = Arc::clone(command);

        match command.execute(message.clone(), remainder).await {
            Ok(()) => Dispatch::Command {
                name: command.name().to_string(),
            },
            Err(error) => {
                let name = command.name().to_string();
                match &self.on_fail {
                    Some(on_fail) => on_fail(message, command, error).await,
                    None => warn!("Command '{}' failed: {}", name, error),
                }
                Dispatch::Failed { name }
            }
        }
    }

    async fn plain_message(&self, message: Message) -> Dispatch {
        if let Some(on_plain) = &self.on_plain {
            on_plain(message).await;
        }
        Dispatch::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_message;
    use std::sync::Mutex;

    const BOT_ID: &str = "bot-uuid";

    fn mention(id: &str) -> String {
        format!(r#"!{{"type":"user","raw":"@qourier","id":"{id}"}}"#)
    }

    fn recording_registry(seen: &Arc<Mutex<Vec<(String, i64, i64)>>>) -> Registry {
        let sink = Arc::clone(seen);
        let mut registry = Registry::new();
        registry
            .register(
                "set",
                "%s %d:%d",
                move |_ms: Message, day: String, hour: i64, min: i64| {
                    let sink = Arc::clone(&sink);
                    async move {
                        sink.lock().unwrap().push((day, hour, min));
                        anyhow::Ok(())
                    }
                },
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn mention_prefix_routes_to_command() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new(recording_registry(&seen), BOT_ID);

        let text = format!("{} set Sunday 21:00", mention(BOT_ID));
        let outcome = router.dispatch(test_message(&text)).await;

        assert_eq!(outcome, Dispatch::Command { name: "set".into() });
        assert_eq!(seen.lock().unwrap().as_slice(), &[("Sunday".into(), 21, 0)]);
    }

    #[tokio::test]
    async fn mention_not_at_offset_zero_is_plain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new(recording_registry(&seen), BOT_ID);

        let text = format!("hey {} set Sunday 21:00", mention(BOT_ID));
        let outcome = router.dispatch(test_message(&text)).await;

        assert_eq!(outcome, Dispatch::Plain);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mention_of_someone_else_is_plain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new(recording_registry(&seen), BOT_ID);

        let text = format!("{} set Sunday 21:00", mention("other-user"));
        let outcome = router.dispatch(test_message(&text)).await;

        assert_eq!(outcome, Dispatch::Plain);
    }

    #[tokio::test]
    async fn unknown_command_routes_to_plain_not_failure() {
        let plain_count = Arc::new(Mutex::new(0));
        let fail_count = Arc::new(Mutex::new(0));

        let plain = Arc::clone(&plain_count);
        let fail = Arc::clone(&fail_count);
        let router = Router::new(Registry::new(), BOT_ID)
            .on_plain(move |_ms| {
                let plain = Arc::clone(&plain);
                async move {
                    *plain.lock().unwrap() += 1;
                }
            })
            .on_fail(move |_ms, _command, _error| {
                let fail = Arc::clone(&fail);
                async move {
                    *fail.lock().unwrap() += 1;
                }
            });

        let text = format!("{} frobnicate now", mention(BOT_ID));
        let outcome = router.dispatch(test_message(&text)).await;

        assert_eq!(outcome, Dispatch::Plain);
        assert_eq!(*plain_count.lock().unwrap(), 1);
        assert_eq!(*fail_count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn bad_arguments_invoke_failure_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let failures = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&failures);
        let router = Router::new(recording_registry(&seen), BOT_ID).on_fail(
            move |_ms, command, error| {
                let sink = Arc::clone(&sink);
                let name = command.name().to_string();
                async move {
                    sink.lock().unwrap().push((name, error.to_string()));
                }
            },
        );

        let text = format!("{} set Sunday", mention(BOT_ID));
        let outcome = router.dispatch(test_message(&text)).await;

        assert_eq!(outcome, Dispatch::Failed { name: "set".into() });
        let failures = failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "set");
        assert_eq!(failures[0].1, "too few arguments");
    }

    #[tokio::test]
    async fn message_without_embeds_goes_to_plain_callback() {
        let plain_count = Arc::new(Mutex::new(0));

        let plain = Arc::clone(&plain_count);
        let router = Router::new(Registry::new(), BOT_ID).on_plain(move |_ms| {
            let plain = Arc::clone(&plain);
            async move {
                *plain.lock().unwrap() += 1;
            }
        });

        let outcome = router.dispatch(test_message("just chatting")).await;

        assert_eq!(outcome, Dispatch::Plain);
        assert_eq!(*plain_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn mention_with_no_command_word_is_plain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new(recording_registry(&seen), BOT_ID);

        let outcome = router.dispatch(test_message(&mention(BOT_ID))).await;
        assert_eq!(outcome, Dispatch::Plain);
    }

    #[tokio::test]
    async fn remainder_preserves_internal_spacing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new(recording_registry(&seen), BOT_ID);

        // Extra whitespace around the command word is separator, but the
        // remainder itself is handed to the matcher as written.
        let text = format!("{}   set   Sunday 21:00", mention(BOT_ID));
        let outcome = router.dispatch(test_message(&text)).await;

        assert_eq!(outcome, Dispatch::Command { name: "set".into() });
        assert_eq!(seen.lock().unwrap().as_slice(), &[("Sunday".into(), 21, 0)]);
    }
}
