//! Inbound Router
//!
//! Dispatches the two platform event kinds into view building and
//! lifecycle transitions: typed text commands (`.menu`, `/<module>help`)
//! and button-click callbacks under the `help::` namespace. Everything
//! else is declined so the surrounding module dispatch can try other
//! modules.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, error, warn};

use crate::catalogue::Catalogue;
use crate::sessions::MenuSessions;
use crate::styling::{TextStyler, HELP_MODULE};
use crate::transport::{DeleteOutcome, EditOutcome, MenuTransport, TransportError};
use crate::view::{self, MenuAction, MenuView, CALLBACK_PREFIX};

/// The menu-opening trigger token, matched case-insensitively.
pub const MENU_COMMAND: &str = ".menu";

/// A recognized text command. Parsing is pure so it is testable without
/// platform types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpCommand {
    /// `.menu` - open the paginated main menu (private chat only).
    OpenMenu,
    /// `/<module>help` resolved to a catalogue module.
    ShowTopic(String),
    /// A `...help` token whose stem matched no module.
    UnknownTopic(String),
}

impl HelpCommand {
    /// Classify the first token of a message, or `None` when the text is
    /// not ours. `/help` alone is deliberately left to other modules.
    pub fn parse(text: &str, catalogue: &Catalogue) -> Option<Self> {
        let token = text.trim().split_whitespace().next()?.to_lowercase();

        if token == MENU_COMMAND {
            return Some(Self::OpenMenu);
        }

        if token != "/help" && token.ends_with("help") {
            let stem = token.strip_prefix('/').unwrap_or(&token);
            let stem = &stem[..stem.len() - "help".len()];
            if stem.is_empty() {
                return None;
            }
            return Some(match catalogue.resolve(stem) {
                Some(name) => Self::ShowTopic(name.to_string()),
                None => Self::UnknownTopic(stem.to_string()),
            });
        }

        None
    }
}

/// Routes help-menu events between the platform and the lifecycle manager.
pub struct HelpRouter {
    sessions: Arc<MenuSessions>,
    catalogue: Catalogue,
    styler: Arc<dyn TextStyler>,
    transport: Arc<dyn MenuTransport>,
    page_size: usize,
}

impl HelpRouter {
    pub fn new(
        sessions: Arc<MenuSessions>,
        catalogue: Catalogue,
        styler: Arc<dyn TextStyler>,
        transport: Arc<dyn MenuTransport>,
        page_size: usize,
    ) -> Self {
        Self {
            sessions,
            catalogue,
            styler,
            transport,
            page_size,
        }
    }

    /// Handle a text message. Returns `false` when the message is not for
    /// this module so the surrounding dispatch can keep going.
    pub async fn handle_text_message(&self, msg: &Message) -> Result<bool> {
        let Some(text) = msg.text() else {
            return Ok(false);
        };
        let Some(command) = HelpCommand::parse(text, &self.catalogue) else {
            return Ok(false);
        };

        let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
        let chat_id = msg.chat.id;

        match command {
            HelpCommand::OpenMenu => {
                if !msg.chat.is_private() {
                    let notice = self
                        .styler
                        .apply(HELP_MODULE, "This command only works in private chat.")
                        .await;
                    self.transport.send_notice(chat_id, &notice).await?;
                    return Ok(true);
                }

                let menu = view::render_main_menu(
                    self.styler.as_ref(),
                    &self.catalogue,
                    1,
                    self.page_size,
                )
                .await;
                self.open_menu(user_id, chat_id, menu).await?;
                Ok(true)
            }
            HelpCommand::ShowTopic(name) => {
                let menu = view::render_topic(self.styler.as_ref(), &self.catalogue, &name).await;
                self.open_menu(user_id, chat_id, menu).await?;
                Ok(true)
            }
            HelpCommand::UnknownTopic(stem) => {
                let notice = self
                    .styler
                    .apply(HELP_MODULE, &format!("❌ Help not found for module: *{stem}*"))
                    .await;
                self.transport.send_notice(chat_id, &notice).await?;
                Ok(true)
            }
        }
    }

    /// Handle a button press. Payloads outside the `help::` namespace are
    /// ignored without side effects. For recognized payloads the idle
    /// timer is rearmed before the action token is validated, so an
    /// unknown action still counts as activity.
    pub async fn handle_callback(&self, query: &CallbackQuery) -> Result<()> {
        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };
        let Some(suffix) = data.strip_prefix(CALLBACK_PREFIX) else {
            return Ok(());
        };

        let user_id = query.from.id.0 as i64;
        let Some(message) = query.message.as_ref() else {
            // The menu message is no longer reachable; nothing to rearm.
            self.ack(&query.id, user_id).await;
            return Ok(());
        };
        let chat_id = message.chat().id;
        let message_id = message.id();

        self.sessions.touch(user_id, chat_id, message_id).await;
        self.ack(&query.id, user_id).await;

        let Some(action) = MenuAction::parse(suffix) else {
            debug!("Unrecognized help callback action from user {}: {}", user_id, suffix);
            return Ok(());
        };

        let result = match action {
            MenuAction::Main { page } => {
                let menu = view::render_main_menu(
                    self.styler.as_ref(),
                    &self.catalogue,
                    page,
                    self.page_size,
                )
                .await;
                self.edit_menu(chat_id, message_id, menu).await
            }
            MenuAction::Show { topic } => {
                let menu =
                    view::render_topic(self.styler.as_ref(), &self.catalogue, &topic).await;
                self.edit_menu(chat_id, message_id, menu).await
            }
            MenuAction::Delete => {
                if let DeleteOutcome::Failed(_) =
                    self.sessions.close(user_id, chat_id, message_id).await
                {
                    let notice = self
                        .styler
                        .apply(HELP_MODULE, "❌ Failed to delete the menu.")
                        .await;
                    if let Err(e) = self.transport.send_notice(chat_id, &notice).await {
                        warn!("Failed to send delete-failure notice to user {}: {}", user_id, e);
                    }
                }
                Ok(())
            }
            MenuAction::Noop => Ok(()),
        };

        if let Err(e) = result {
            error!("Help callback error for user {}: {}", user_id, e);
            let notice = self
                .styler
                .apply(HELP_MODULE, "An error occurred while processing your request.")
                .await;
            if let Err(e2) = self.transport.send_notice(chat_id, &notice).await {
                warn!("Failed to send failure notice to user {}: {}", user_id, e2);
            }
        }
        Ok(())
    }

    async fn open_menu(&self, user_id: i64, chat_id: ChatId, menu: MenuView) -> Result<()> {
        let message_id = self
            .transport
            .send_menu(chat_id, &menu.text, menu.keyboard)
            .await?;
        self.sessions.touch(user_id, chat_id, message_id).await;
        Ok(())
    }

    async fn edit_menu(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        menu: MenuView,
    ) -> Result<(), TransportError> {
        match self
            .transport
            .edit_menu(chat_id, message_id, &menu.text, menu.keyboard)
            .await?
        {
            EditOutcome::Edited => {}
            EditOutcome::Unchanged => debug!("Menu content unchanged; edit skipped"),
        }
        Ok(())
    }

    async fn ack(&self, callback_id: &str, user_id: i64) {
        if let Err(e) = self.transport.ack_callback(callback_id).await {
            warn!("Failed to acknowledge callback from user {}: {}", user_id, e);
        }
    }
}
