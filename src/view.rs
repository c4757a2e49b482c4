//! Menu View Builder
//!
//! Pure rendering of the two menu views: the paginated module list and a
//! single module's detail page. Produces the message text plus the inline
//! keyboard; sending and editing happen elsewhere.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::catalogue::{Catalogue, PRIVATE_CHAT_PREFIX};
use crate::styling::{TextStyler, HELP_MODULE};

/// Namespace prefix on every callback payload owned by the help menu.
pub const CALLBACK_PREFIX: &str = "help::";

/// Module buttons per keyboard row.
pub const BUTTONS_PER_ROW: usize = 3;

/// A rendered menu: message text and its inline keyboard.
#[derive(Debug, Clone)]
pub struct MenuView {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

/// Actions encoded in the help menu's callback payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Render a page of the main menu.
    Main { page: usize },
    /// Render a module's detail view.
    Show { topic: String },
    /// Close the menu and delete its message.
    Delete,
    /// The inert page indicator; nothing to render.
    Noop,
}

impl MenuAction {
    /// Encode as callback data, prefix included.
    pub fn encode(&self) -> String {
        match self {
            Self::Main { page } if *page <= 1 => format!("{CALLBACK_PREFIX}main"),
            Self::Main { page } => format!("{CALLBACK_PREFIX}main::{page}"),
            Self::Show { topic } => format!("{CALLBACK_PREFIX}show::{topic}"),
            Self::Delete => format!("{CALLBACK_PREFIX}delete_menu"),
            Self::Noop => format!("{CALLBACK_PREFIX}noop"),
        }
    }

    /// Parse the payload remainder after [`CALLBACK_PREFIX`] was stripped.
    ///
    /// Returns `None` for action tokens this module does not know; the
    /// router treats that as "acknowledged, nothing to render".
    pub fn parse(suffix: &str) -> Option<Self> {
        let (action, rest) = match suffix.split_once("::") {
            Some((action, rest)) => (action, Some(rest)),
            None => (suffix, None),
        };

        match action {
            "main" => {
                let page = rest.and_then(|r| r.parse().ok()).unwrap_or(1);
                Some(Self::Main { page })
            }
            "show" => rest.map(|topic| Self::Show {
                topic: topic.to_string(),
            }),
            "delete_menu" if rest.is_none() => Some(Self::Delete),
            "noop" if rest.is_none() => Some(Self::Noop),
            _ => None,
        }
    }
}

/// Number of main-menu pages for a catalogue of `total` modules.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size)
}

/// Clamp a requested page into the valid range. Out-of-range input is not
/// an error; it silently lands on the nearest valid page.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Render one page of the main menu.
pub async fn render_main_menu(
    styler: &dyn TextStyler,
    catalogue: &Catalogue,
    page: usize,
    page_size: usize,
) -> MenuView {
    let names: Vec<&str> = catalogue.names().collect();
    let total_pages = page_count(names.len(), page_size);
    let current = clamp_page(page, total_pages);

    let mut text = styler.apply(HELP_MODULE, "📚 *WardenBot Help* 📚\n\n").await;
    text.push_str(
        &styler
            .apply(
                HELP_MODULE,
                "Select a module below to learn more about its commands and functionality:",
            )
            .await,
    );

    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    let mut row: Vec<InlineKeyboardButton> = Vec::new();
    let start = (current - 1) * page_size;
    for name in names.iter().skip(start).take(page_size) {
        let label = styler.apply(HELP_MODULE, name).await;
        row.push(InlineKeyboardButton::callback(
            label,
            MenuAction::Show {
                topic: name.to_string(),
            }
            .encode(),
        ));
        if row.len() == BUTTONS_PER_ROW {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }

    if total_pages > 1 {
        let mut nav = Vec::new();
        if current > 1 {
            nav.push(InlineKeyboardButton::callback(
                "⬅️ Prev",
                MenuAction::Main { page: current - 1 }.encode(),
            ));
        }
        nav.push(InlineKeyboardButton::callback(
            format!("{current}/{total_pages}"),
            MenuAction::Noop.encode(),
        ));
        if current < total_pages {
            nav.push(InlineKeyboardButton::callback(
                "Next ➡️",
                MenuAction::Main { page: current + 1 }.encode(),
            ));
        }
        rows.push(nav);
    }

    rows.push(vec![InlineKeyboardButton::callback(
        styler.apply(HELP_MODULE, "🗑️ Delete Menu").await,
        MenuAction::Delete.encode(),
    )]);

    MenuView {
        text,
        keyboard: InlineKeyboardMarkup::new(rows),
    }
}

/// Render a module's detail view, or the not-found view for unknown names.
pub async fn render_topic(styler: &dyn TextStyler, catalogue: &Catalogue, name: &str) -> MenuView {
    let Some(topic) = catalogue.get(name) else {
        let text = styler
            .apply(HELP_MODULE, &format!("❌ Help not found for module: *{name}*"))
            .await;
        return MenuView {
            text,
            keyboard: back_keyboard(styler).await,
        };
    };

    let mut text = styler
        .apply(HELP_MODULE, &format!("📖 *{name} Module Help* 📖\n\n"))
        .await;
    text.push_str(
        &styler
            .apply(HELP_MODULE, &format!("*Summary:* {}\n\n", topic.summary))
            .await,
    );

    if topic.commands.is_empty() {
        text.push_str(
            &styler
                .apply(HELP_MODULE, "No specific commands for this module.\n\n")
                .await,
        );
    } else {
        text.push_str(&styler.apply(HELP_MODULE, "*Commands:*\n").await);
        for line in &topic.commands {
            match line.split_once(" - ") {
                // Alternate-context usage hints stay in one piece.
                Some(_) if line.starts_with(PRIVATE_CHAT_PREFIX) => {
                    let styled = styler.apply(HELP_MODULE, line).await;
                    text.push_str(&format!("• ```{styled}```\n"));
                }
                Some((command, description)) => {
                    let styled = styler.apply(HELP_MODULE, description).await;
                    text.push_str(&format!("• `{command}` - ```{styled}```\n"));
                }
                None => {
                    let styled = styler.apply(HELP_MODULE, line).await;
                    text.push_str(&format!("• `{styled}`\n"));
                }
            }
        }
        text.push('\n');
    }

    let details: String = topic
        .details
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    text.push_str(&styler.apply(HELP_MODULE, "*Details:*\n").await);
    text.push_str(&styler.apply(HELP_MODULE, &details).await);

    MenuView {
        text,
        keyboard: back_keyboard(styler).await,
    }
}

async fn back_keyboard(styler: &dyn TextStyler) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        styler.apply(HELP_MODULE, "🔙 Back to Main Menu").await,
        MenuAction::Main { page: 1 }.encode(),
    )]])
}
