//! Chat Platform Transport
//!
//! The narrow interface the menu subsystem needs from the chat platform:
//! send, edit and delete a menu message, acknowledge a button press, and
//! send a plain notice. Outcome classification is explicit data so callers
//! never inspect platform error strings.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};

/// Errors from platform operations that callers must handle.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    Send(String),

    #[error("edit failed: {0}")]
    Edit(String),

    #[error("acknowledge failed: {0}")]
    Ack(String),
}

/// Result of a delete request against the platform.
///
/// `AlreadyGone` is success for our purposes: the message the user might
/// still see no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
    Failed(String),
}

/// Result of an edit request. `Unchanged` means the platform rejected the
/// edit because the content was identical, which is benign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    Unchanged,
}

/// Platform operations the menu subsystem depends on.
#[async_trait]
pub trait MenuTransport: Send + Sync {
    /// Send a new menu message; returns the platform's message id.
    async fn send_menu(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<MessageId, TransportError>;

    /// Replace a menu message's text and keyboard in place.
    async fn edit_menu(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<EditOutcome, TransportError>;

    /// Best-effort delete of a menu message.
    async fn delete_menu(&self, chat: ChatId, message: MessageId) -> DeleteOutcome;

    /// Acknowledge a button press so the client stops its spinner.
    async fn ack_callback(&self, callback_id: &str) -> Result<(), TransportError>;

    /// Plain text reply without menu bookkeeping.
    async fn send_notice(&self, chat: ChatId, text: &str) -> Result<(), TransportError>;
}

/// `MenuTransport` over a live Telegram bot.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MenuTransport for TelegramTransport {
    async fn send_menu(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<MessageId, TransportError> {
        let message = self
            .bot
            .send_message(chat, text)
            .parse_mode(ParseMode::Markdown)
            .reply_markup(keyboard)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(message.id)
    }

    async fn edit_menu(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<EditOutcome, TransportError> {
        match self
            .bot
            .edit_message_text(chat, message, text)
            .parse_mode(ParseMode::Markdown)
            .reply_markup(keyboard)
            .await
        {
            Ok(_) => Ok(EditOutcome::Edited),
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(EditOutcome::Unchanged),
            Err(e) => Err(TransportError::Edit(e.to_string())),
        }
    }

    async fn delete_menu(&self, chat: ChatId, message: MessageId) -> DeleteOutcome {
        match self.bot.delete_message(chat, message).await {
            Ok(_) => DeleteOutcome::Deleted,
            Err(RequestError::Api(
                ApiError::MessageToDeleteNotFound | ApiError::MessageIdInvalid,
            )) => DeleteOutcome::AlreadyGone,
            Err(e) => DeleteOutcome::Failed(e.to_string()),
        }
    }

    async fn ack_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Ack(e.to_string()))
    }

    async fn send_notice(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(chat, text)
            .parse_mode(ParseMode::Markdown)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}
