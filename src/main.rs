mod cli;
mod editable;
mod error;
mod notification;
mod state;
mod websocket;

use clap::Parser;
use cli::{Cli, NotifyCommands};
use futures::StreamExt;
use notification::{start_refetch_job, Notification};
use state::{AppState, Config};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use websocket::{FrameHandler, LiveClient, NotificationCallback, TungsteniteConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,family_notify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let state = AppState::new(config)?;

    match cli.command.unwrap_or(NotifyCommands::Watch) {
        NotifyCommands::Watch => watch(state).await?,
        NotifyCommands::MarkRead(args) => {
            let notification = state.notification_service.mark_read(args.id).await?;
            tracing::info!("Marked '{}' as read", notification.title);
        }
        NotifyCommands::MarkAllRead => {
            state.notification_service.mark_all_read().await?;
            tracing::info!("Marked all notifications as read");
        }
        NotifyCommands::Preferences(args) => {
            let mut preferences = state.notification_service.load_preferences().await?;
            if let Some(enabled) = args.enabled {
                preferences = preferences.edit(|p| p.notification_enabled = enabled);
                preferences = state.notification_service.save_preferences(preferences).await?;
            }
            tracing::info!(
                "Notifications are {}",
                if preferences.current().notification_enabled { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}

async fn watch(state: AppState) -> anyhow::Result<()> {
    if state.config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN is not set; the notification cable stays idle");
    }

    tracing::info!("Fetching notifications...");
    if let Err(e) = state.notification_service.refresh().await {
        tracing::warn!("Initial notification fetch failed: {}", e);
    }

    let mut scheduler = start_refetch_job(
        state.notification_service.clone(),
        &state.config.refetch_schedule,
    )
    .await?;

    let on_notification: NotificationCallback = Arc::new(|notification: &Notification| {
        tracing::info!(
            "[{}] {}{}",
            notification.kind().icon(),
            notification.title,
            notification
                .link
                .as_deref()
                .map(|link| format!(" -> {}", link))
                .unwrap_or_default()
        );
    });

    let handler = FrameHandler::new(state.feed_cache.clone(), Some(on_notification));
    let live = LiveClient::new(state.config.clone(), TungsteniteConnector, handler)
        .spawn(state.credentials());

    let mut feed_updates = WatchStream::new(state.feed_cache.subscribe());
    let log_feed = async move {
        while let Some(feed) = feed_updates.next().await {
            if let Some(feed) = feed {
                tracing::debug!(
                    "Feed holds {} notifications, {} unread",
                    feed.notifications.len(),
                    feed.unread_count
                );
            }
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = log_feed => {}
    }

    tracing::info!("Shutting down...");
    live.shutdown().await;
    scheduler.shutdown().await.map_err(error::AppError::from)?;

    Ok(())
}
