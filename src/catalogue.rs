//! Help Content Catalogue
//!
//! Static descriptions of WardenBot's feature modules: a one-line summary,
//! the user-facing commands, and a free-text details section per module.
//! The menu subsystem only reads this data; it never mutates it.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Usage lines carrying this prefix describe a private-chat variant of a
/// command and are rendered as a single unit instead of being split into
/// command and description.
pub const PRIVATE_CHAT_PREFIX: &str = "Private Chat:";

/// Help entry for one feature module.
#[derive(Debug, Clone)]
pub struct HelpTopic {
    pub summary: String,
    pub commands: Vec<String>,
    pub details: String,
}

/// Ordered mapping from module name to its help topic.
///
/// Backed by a `BTreeMap` so iteration order is lexicographic and
/// deterministic, which is what the paginated menu relies on.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    topics: BTreeMap<String, HelpTopic>,
}

impl Catalogue {
    /// The built-in WardenBot catalogue.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Build a catalogue from arbitrary entries (tests, embedders).
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, HelpTopic)>,
    {
        Self {
            topics: entries.into_iter().collect(),
        }
    }

    /// Module names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Exact-key lookup.
    pub fn get(&self, name: &str) -> Option<&HelpTopic> {
        self.topics.get(name)
    }

    /// Resolve a lowercased command stem (e.g. `activemembers` from
    /// `/activemembershelp`) to its module name, case-insensitively.
    ///
    /// Names containing spaces can never match a single command token;
    /// those modules are reachable through the menu only.
    pub fn resolve(&self, stem: &str) -> Option<&str> {
        self.topics
            .keys()
            .find(|name| name.to_lowercase() == stem)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    fn with(mut self, name: &str, summary: &str, commands: &[&str], details: &str) -> Self {
        self.topics.insert(
            name.to_string(),
            HelpTopic {
                summary: summary.to_string(),
                commands: commands.iter().map(|c| c.to_string()).collect(),
                details: details.to_string(),
            },
        );
        self
    }
}

static BUILTIN: Lazy<Catalogue> = Lazy::new(|| {
    Catalogue::default()
        .with(
            "ActiveMembers",
            "Tracks message activity and shows leaderboards per group.",
            &[
                "/active - Show the live weekly leaderboard in a group.",
                "/lastactive - Show last week's most active members.",
                "Private Chat: /active - Pick a timeframe to inspect activity in your default group (admins only).",
            ],
            "Counts messages per user in every group the bot manages and keeps daily, weekly, \
             monthly and yearly leaderboards. Admins can query detailed activity from private \
             chat. Counters reset automatically at the end of each period.",
        )
        .with(
            "AntiBot",
            "Mutes bot accounts that join a group.",
            &["No direct commands for users."],
            "Newly joined bot accounts are muted before they can post, which keeps advertising \
             and scraper bots quiet. Accounts added by an admin are exempt.",
        )
        .with(
            "AntiContact",
            "Removes messages that contain contact details.",
            &["No direct commands for users."],
            "Scans group messages for email addresses and phone numbers and deletes matches. \
             Repeat offenders can be muted for a configurable period to curb contact spam.",
        )
        .with(
            "AntiLink",
            "Removes messages containing links and escalates on repeats.",
            &["No direct commands for users."],
            "Messages with URLs, text links or text mentions are deleted on sight. The first \
             offense earns a warning; further offenses inside a 24-hour window mute the sender \
             for the configured duration.",
        )
        .with(
            "AntiMention",
            "Removes messages that advertise other bots.",
            &["No direct commands for users."],
            "Deletes messages mentioning bot usernames or linking to bot invite pages in groups \
             and supergroups, keeping the chat free of bot promotion.",
        )
        .with(
            "AntiPoll",
            "Restricts who may create polls in a group.",
            &[
                "/pollon - Enable poll protection in the current group (admin only).",
                "/polloff - Disable poll protection in the current group (admin only).",
                "Private Chat: /pollon or /polloff - Manage poll protection for the default group (admins only).",
            ],
            "When protection is on, polls sent by non-admins are deleted and the sender is \
             warned. Useful for keeping focused chats free of poll spam.",
        )
        .with(
            "AntiSpoiler",
            "Removes messages that use spoiler formatting.",
            &[
                "/spoileron - Enable spoiler protection in the current group (admin only).",
                "/spoileroff - Disable spoiler protection in the current group (admin only).",
                "Private Chat: /spoileron or /spoileroff - Manage spoiler protection for the default group (admins only).",
            ],
            "When enabled, messages containing hidden spoiler text from non-admins are removed \
             and a warning is sent.",
        )
        .with(
            "Blocker",
            "Blocks configured phrases in group chats.",
            &[
                "/lock <phrase1,phrase2,...> - Add phrases to the blocklist (admin only).",
                "/unlock <phrase1,phrase2,...> - Remove phrases from the blocklist (admin only).",
                "/listlock - List all currently locked phrases (admin only).",
            ],
            "Admins maintain a list of phrases that are deleted automatically whenever they \
             appear in a group message. Handy against recurring spam and off-topic noise.",
        )
        .with(
            "Connection",
            "Links friendly names to chat ids for cross-group management.",
            &[
                "/connection <name> <chat_id> - Save a new connection (admin only).",
                "/delconnection <name> - Delete an existing connection (admin only).",
                "/listconnection - List all saved connections (admin only).",
                "/setdefault <name> - Set the default connection for private commands (admin only).",
                "/getdefault - Show the current default connection (admin only).",
            ],
            "Connections let admins drive group settings from private chat by name instead of \
             raw chat id. Several other modules use the default connection for their \
             private-chat commands.",
        )
        .with(
            "Filter",
            "Custom text triggers with responses and inline buttons.",
            &[
                "/filter - Show the filter admin panel (admin only).",
                "/delfilter <name1,name2> - Delete filters (admin only).",
                "/listfilter - List all filters (admin only).",
                "/cancel - Cancel a pending filter action (admin only).",
            ],
            "Filters match configured trigger words and answer with stored responses, \
             optionally cycling between several responses and attaching inline URL buttons \
             in custom layouts. Aliases are supported.",
        )
        .with(
            "Font Manager",
            "Per-module font styling for bot messages.",
            &["/setfont - Open the interactive font selection menu (admin only)."],
            "Lets admins pick a font style per module so the bot's messages match the group's \
             look. Styles apply to message text only, never to commands or button payloads.",
        )
        .with(
            "GroupID",
            "Shows the id of the current group.",
            &["/groupid - Show the Telegram id of the current group (admin only)."],
            "A quick way for admins to fetch the group id needed when configuring connections \
             or external integrations.",
        )
        .with(
            "Health",
            "Reports bot and host health.",
            &["/health - Full report on memory, CPU, uptime and disk usage (admin only, private chat)."],
            "Real-time numbers on system memory, process memory, CPU load, uptime and disk \
             usage, for diagnosing performance problems.",
        )
        .with(
            "MyID",
            "Shows Telegram user ids.",
            &[
                "/myid - Show your own Telegram user id.",
                "/myid <reply_to_message> - Show the id of the user you replied to.",
                "/myid <@username> - Show the id of the named user.",
            ],
            "Any user can look up their own id or another member's id by reply or username. \
             Useful when other modules ask for a numeric user id.",
        )
        .with(
            "PromoteDemote",
            "Grants or revokes basic admin rights.",
            &[
                "/promote <user_id|@username|reply_to_message> - Promote a user to basic admin (admin only).",
                "/demote <user_id|@username|reply_to_message> - Remove a user's admin rights (admin only).",
            ],
            "Quickly grants the invite-users right to a member, or takes it away again, by id, \
             username or reply.",
        )
        .with(
            "Scheduler",
            "Sends scheduled messages with layouts and frequencies.",
            &["/sched - Open the scheduler admin panel (admin only, private chat)."],
            "Admins manage time slots that post text with native formatting and inline URL \
             buttons on daily, weekly or every-N-days schedules. Slots can be edited, paused \
             and deleted, and delivery copes with the bot being removed from a chat.",
        )
        .with(
            "Service Clean",
            "Removes Telegram service messages from groups.",
            &["/cls - Trigger a manual clean check (admin only)."],
            "Join, leave and chat-photo-changed notices are deleted automatically, including \
             in batches, keeping the visible history tidy.",
        )
        .with(
            "Welcome",
            "Greets new members with configurable messages.",
            &["/wlc - Open the welcome admin panel (admin only, private chat)."],
            "Welcome messages support mentions, group names, custom text and inline URL \
             buttons, with an optional timeout after which the greeting is deleted. A \
             wizard walks admins through the setup.",
        )
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_populated_and_sorted() {
        let catalogue = Catalogue::builtin();
        assert!(catalogue.len() > 10);

        let names: Vec<&str> = catalogue.names().collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn resolve_is_case_insensitive_exact() {
        let catalogue = Catalogue::builtin();
        assert_eq!(catalogue.resolve("activemembers"), Some("ActiveMembers"));
        assert_eq!(catalogue.resolve("antilink"), Some("AntiLink"));
        assert_eq!(catalogue.resolve("active"), None);
        assert_eq!(catalogue.resolve("nosuchmodule"), None);
    }

    #[test]
    fn spaced_names_are_not_resolvable_from_a_single_token() {
        let catalogue = Catalogue::builtin();
        assert!(catalogue.get("Font Manager").is_some());
        assert_eq!(catalogue.resolve("fontmanager"), None);
    }

    #[test]
    fn from_entries_keeps_lookup_working() {
        let catalogue = Catalogue::from_entries([(
            "Demo".to_string(),
            HelpTopic {
                summary: "A demo module.".to_string(),
                commands: vec!["/demo - Run the demo.".to_string()],
                details: "Demo details.".to_string(),
            },
        )]);

        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue.get("Demo").unwrap().summary, "A demo module.");
        assert_eq!(catalogue.resolve("demo"), Some("Demo"));
    }
}
