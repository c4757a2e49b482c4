//! Telegram bot wiring for the WardenBot help menu
//!
//! Builds the service graph (store, transport, lifecycle manager, router),
//! runs the startup recovery pass, then drives an explicit Dispatcher with
//! long polling. On dispatcher shutdown every live menu timer is cancelled;
//! no extra persistence is needed because every state change was written
//! when it happened.

use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::Update,
};

use crate::catalogue::Catalogue;
use crate::config::HelpConfig;
use crate::router::HelpRouter;
use crate::sessions::MenuSessions;
use crate::store::MenuStore;
use crate::styling::{PlainStyler, TextStyler};
use crate::transport::{MenuTransport, TelegramTransport};

/// Run the bot with long polling until it is stopped.
pub async fn run_bot() -> Result<()> {
    let token =
        std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
    let config = HelpConfig::from_env();

    tracing::info!("===========================================");
    tracing::info!("  WardenBot Help Menu - Starting...");
    tracing::info!("===========================================");
    tracing::info!("Menu database: {:?}", config.db_path);
    tracing::info!("Idle timeout: {:?}", config.idle_timeout);

    let bot = Bot::new(token);

    // Verify bot token by calling getMe
    tracing::info!("Verifying bot token...");
    match bot.get_me().await {
        Ok(me) => {
            tracing::info!(
                "Bot authenticated: @{} (ID: {})",
                me.username.as_deref().unwrap_or("unknown"),
                me.id
            );
        }
        Err(e) => {
            tracing::error!("Failed to authenticate bot: {}", e);
            anyhow::bail!("Bot authentication failed: {}", e);
        }
    }

    // Delete any existing webhook to ensure polling works
    if let Err(e) = bot.delete_webhook().await {
        tracing::warn!("Failed to delete webhook: {} (continuing anyway)", e);
    }

    let store = MenuStore::open(&config.db_path)?;
    let transport: Arc<dyn MenuTransport> = Arc::new(TelegramTransport::new(bot.clone()));
    let styler: Arc<dyn TextStyler> = Arc::new(PlainStyler);
    let sessions = MenuSessions::new(store, Arc::clone(&transport), config.idle_timeout);

    // Reconcile persisted menus with the idle policy before taking updates.
    if let Err(e) = sessions.recover().await {
        tracing::warn!("Help menu recovery failed: {}", e);
    }

    let router = Arc::new(HelpRouter::new(
        Arc::clone(&sessions),
        Catalogue::builtin(),
        styler,
        transport,
        config.page_size,
    ));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    tracing::info!("Starting dispatcher with long polling...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::clone(&router)])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    sessions.shutdown().await;
    tracing::warn!("Dispatcher stopped");
    Ok(())
}

/// Message handler endpoint for the dispatcher
async fn message_handler(msg: Message, router: Arc<HelpRouter>) -> ResponseResult<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);

    match router.handle_text_message(&msg).await {
        Ok(true) => tracing::info!("Handled help command from user {}", user_id),
        // Not ours; the surrounding module dispatch would try other modules.
        Ok(false) => tracing::debug!("Message from user {} not handled by help module", user_id),
        Err(e) => tracing::error!("Error handling message from user {}: {}", user_id, e),
    }

    Ok(())
}

/// Callback query handler for inline keyboard buttons
async fn callback_handler(query: CallbackQuery, router: Arc<HelpRouter>) -> ResponseResult<()> {
    let user_id = query.from.id.0;
    tracing::debug!(
        "Callback query: user={}, data={:?}",
        user_id,
        query.data.as_deref()
    );

    if let Err(e) = router.handle_callback(&query).await {
        tracing::error!("Error handling callback from user {}: {}", user_id, e);
    }

    Ok(())
}
