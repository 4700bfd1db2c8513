//! Qourier bot - Main entry point.

mod commands;
mod config;
mod error;

use crate::commands::Date;
use crate::config::Config;
use crate::error::AppResult;
use anyhow::Context;
use capsule_store::Capsule;
use qourier_core::Router;
use std::sync::Arc;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use traq_client::{Directory, MessageReceiver, TraqClient};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting qourier bot...");

    let client = TraqClient::new(&config.traq.base_url, &config.traq.access_token)?;

    let me = client
        .get_me()
        .await
        .context("Failed to authenticate - check TRAQ__ACCESS_TOKEN")?;
    info!("Authenticated as @{} ({})", me.name, me.id);

    let directory = Arc::new(Directory::fetch(&client).await?);
    info!(
        "Directory snapshot ready ({} users, {} channels, {} stamps)",
        directory.users.len(),
        directory.channels.len(),
        directory.stamps.len()
    );

    let capsule = Capsule::setup(
        &config.storage.database_url,
        &Date::default(),
        config.storage.reset,
    )
    .await?;

    // Command registration validates each handler against its template;
    // a mismatch aborts startup here.
    let registry = commands::register(client.clone(), capsule, Arc::clone(&directory))?;
    info!("Registered {} commands", registry.len());

    let plain_client = client.clone();
    let fail_client = client.clone();
    let router = Router::new(registry, &me.id)
        .on_plain(move |ms| {
            let client = plain_client.clone();
            async move {
                let greeting = format!("Oisu! Here is #{}", ms.channel.path);
                if let Err(e) = client.send_message(&ms.channel.id, &greeting).await {
                    error!("Failed to send greeting: {}", e);
                }
            }
        })
        .on_fail(move |ms, command, err| {
            let client = fail_client.clone();
            let notice = format!(
                "Failed to run '{}': {} (syntax: \"{}\")",
                command.name(),
                err,
                command.template().source()
            );
            async move {
                warn!("{}", notice);
                if let Err(e) = client.send_message(&ms.channel.id, &notice).await {
                    error!("Failed to send failure notice: {}", e);
                }
            }
        });

    info!("Listening for messages...");

    // Start message receiver
    let receiver =
        MessageReceiver::new(client.clone(), config.traq.poll_interval).ignore_user(&me.id);
    let mut stream = Box::pin(receiver.stream());

    // Main message loop
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                router.dispatch(message).await;
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
