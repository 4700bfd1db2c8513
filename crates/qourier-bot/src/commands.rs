//! Bot commands.
//!
//! The bot keeps one scheduled slot: `@bot set Sunday 21:00` stores it,
//! `@bot get` reads it back.

use capsule_store::Capsule;
use qourier_core::{Registry, RegistrationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use traq_client::{Directory, Message, TraqClient};

/// Stamp put on a message once its `set` was persisted.
const DONE_STAMP: &str = "done-nya";

/// The persisted slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Date {
    pub day: String,
    pub hour: i64,
    pub min: i64,
}

impl Default for Date {
    fn default() -> Self {
        Self {
            day: "Sunday".into(),
            hour: 12,
            min: 0,
        }
    }
}

/// Build the command registry. A template/handler mismatch surfaces here
/// and aborts startup.
pub fn register(
    client: TraqClient,
    capsule: Capsule,
    directory: Arc<Directory>,
) -> Result<Registry, RegistrationError> {
    let mut registry = Registry::new();

    // @bot set Sunday 21:00
    {
        let client = client.clone();
        let capsule = capsule.clone();
        let directory = Arc::clone(&directory);
        registry.register(
            "set",
            "%s %d:%d",
            move |ms: Message, day: String, hour: i64, min: i64| {
                let client = client.clone();
                let capsule = capsule.clone();
                let directory = Arc::clone(&directory);
                async move {
                    let reply = format!("On {day} {hour:02}:{min:02}, right?");
                    client.send_message(&ms.channel.id, &reply).await?;
                    capsule.save(&Date { day, hour, min }).await?;
                    if let Some(stamp_id) = directory.stamps.id(DONE_STAMP) {
                        client.add_stamp(&ms.id, stamp_id).await?;
                    }
                    anyhow::Ok(())
                }
            },
        )?;
    }

    // @bot get
    {
        let client = client.clone();
        let capsule = capsule.clone();
        registry.register("get", "", move |ms: Message| {
            let client = client.clone();
            let capsule = capsule.clone();
            async move {
                let date: Date = capsule.load().await?;
                let reply = format!(
                    "It was on {} {:02}:{:02}!",
                    date.day, date.hour, date.min
                );
                client.send_message(&ms.channel.id, &reply).await?;
                anyhow::Ok(())
            }
        })?;
    }

    Ok(registry)
}
