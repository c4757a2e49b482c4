//! Menu Lifecycle Manager
//!
//! Owns every currently-open help menu: the in-memory table, the per-user
//! expiry timer, and the durable rows backing restart recovery. One
//! instance per process; the router drives all transitions through it and
//! never touches the store directly.
//!
//! Invariant: a table entry exists iff a durable row exists, except inside
//! a single transition. A fired timer re-checks message identity, so a
//! timer that outlives its menu (superseded by a newer open) is a no-op.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::store::MenuStore;
use crate::timer::ExpiryTimer;
use crate::transport::{DeleteOutcome, MenuTransport};

/// In-memory record of one user's open menu.
struct OpenMenu {
    chat_id: ChatId,
    message_id: MessageId,
    timer: ExpiryTimer,
    last_activity: i64,
}

/// The per-process menu lifecycle service.
pub struct MenuSessions {
    idle_timeout: Duration,
    store: StdMutex<MenuStore>,
    transport: Arc<dyn MenuTransport>,
    table: Mutex<HashMap<i64, OpenMenu>>,
    /// Self-handle for expiry tasks; weak so pending timers never keep a
    /// dropped service alive.
    this: Weak<MenuSessions>,
}

impl MenuSessions {
    pub fn new(
        store: MenuStore,
        transport: Arc<dyn MenuTransport>,
        idle_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            idle_timeout,
            store: StdMutex::new(store),
            transport,
            table: Mutex::new(HashMap::new()),
            this: this.clone(),
        })
    }

    /// Record an open or navigate: cancel any prior timer for the user,
    /// persist the new state, and arm a fresh timer for the full idle
    /// duration. At most one live timer per user afterwards.
    pub async fn touch(&self, user_id: i64, chat_id: ChatId, message_id: MessageId) {
        if let Some(prev) = self.table.lock().await.remove(&user_id) {
            prev.timer.cancel();
        }

        let now = chrono::Utc::now().timestamp_millis();
        if let Err(e) = self.with_store(|s| s.upsert(user_id, chat_id.0, message_id.0, now)) {
            warn!("Failed to persist help menu state for user {}: {}", user_id, e);
        }

        let timer = self.arm(user_id, message_id, self.idle_timeout);
        self.table.lock().await.insert(
            user_id,
            OpenMenu {
                chat_id,
                message_id,
                timer,
                last_activity: now,
            },
        );
    }

    /// Explicit close. State is purged regardless of the platform delete
    /// outcome; the outcome is returned so the caller can notify the user
    /// on failure.
    pub async fn close(&self, user_id: i64, chat_id: ChatId, message_id: MessageId) -> DeleteOutcome {
        if let Some(prev) = self.table.lock().await.remove(&user_id) {
            prev.timer.cancel();
        }
        self.delete_row(user_id);

        let outcome = self.transport.delete_menu(chat_id, message_id).await;
        match &outcome {
            DeleteOutcome::Deleted => {
                info!("Help menu for user {} in chat {} deleted by user request", user_id, chat_id)
            }
            DeleteOutcome::AlreadyGone => {
                debug!("Help menu for user {} was already gone on close", user_id)
            }
            DeleteOutcome::Failed(e) => {
                warn!("Failed to delete help menu for user {} on request: {}", user_id, e)
            }
        }
        outcome
    }

    /// Startup recovery: reconcile durable rows with the idle policy.
    /// Rows past the idle window are deleted best-effort; younger rows are
    /// rehydrated with a timer armed for the remaining duration.
    pub async fn recover(&self) -> Result<()> {
        let rows = self.with_store(|s| s.load_all())?;
        let idle_ms = self.idle_timeout.as_millis() as i64;
        let now = chrono::Utc::now().timestamp_millis();

        let mut restored = 0usize;
        let mut expired = 0usize;
        for row in rows {
            let chat_id = ChatId(row.chat_id);
            let message_id = MessageId(row.message_id);
            let elapsed = now - row.last_activity;

            if elapsed >= idle_ms {
                match self.transport.delete_menu(chat_id, message_id).await {
                    DeleteOutcome::Deleted => {
                        info!("Expired help menu for user {} deleted on startup", row.user_id)
                    }
                    DeleteOutcome::AlreadyGone => {
                        debug!("Expired help menu for user {} already gone", row.user_id)
                    }
                    DeleteOutcome::Failed(e) => warn!(
                        "Failed to delete expired help menu for user {} on startup: {}",
                        row.user_id, e
                    ),
                }
                self.delete_row(row.user_id);
                expired += 1;
            } else {
                let remaining = Duration::from_millis((idle_ms - elapsed) as u64);
                let timer = self.arm(row.user_id, message_id, remaining);
                self.table.lock().await.insert(
                    row.user_id,
                    OpenMenu {
                        chat_id,
                        message_id,
                        timer,
                        last_activity: row.last_activity,
                    },
                );
                restored += 1;
            }
        }

        if restored > 0 || expired > 0 {
            info!("Help menu recovery: {} restored, {} expired", restored, expired);
        }
        Ok(())
    }

    /// Cancel every live timer and clear the table. No store I/O: every
    /// state change was already persisted when it happened.
    pub async fn shutdown(&self) {
        let mut table = self.table.lock().await;
        let count = table.len();
        for (_, open) in table.drain() {
            open.timer.cancel();
        }
        if count > 0 {
            info!("Cancelled {} live help menu timer(s)", count);
        }
    }

    /// Number of currently-open menus.
    pub async fn open_count(&self) -> usize {
        self.table.lock().await.len()
    }

    /// Last-activity timestamp of a user's open menu, if any.
    pub async fn last_activity(&self, user_id: i64) -> Option<i64> {
        self.table.lock().await.get(&user_id).map(|m| m.last_activity)
    }

    fn arm(&self, user_id: i64, message_id: MessageId, delay: Duration) -> ExpiryTimer {
        let sessions = self.this.clone();
        ExpiryTimer::schedule(delay, async move {
            if let Some(sessions) = sessions.upgrade() {
                sessions.expire(user_id, message_id).await;
            }
        })
    }

    /// Idle-timeout path. Captured message identity must still match the
    /// current entry; a stale fire against a superseded menu is a no-op.
    async fn expire(&self, user_id: i64, message_id: MessageId) {
        let removed = {
            let mut table = self.table.lock().await;
            match table.get(&user_id) {
                Some(open) if open.message_id == message_id => table.remove(&user_id),
                _ => None,
            }
        };
        let Some(open) = removed else {
            debug!("Stale expiry timer for user {} ignored", user_id);
            return;
        };

        self.delete_row(user_id);
        match self.transport.delete_menu(open.chat_id, open.message_id).await {
            DeleteOutcome::Deleted => {
                info!(
                    "Help menu for user {} in chat {} deleted after idle timeout",
                    user_id, open.chat_id
                )
            }
            DeleteOutcome::AlreadyGone => {
                debug!("Idle help menu for user {} was already gone", user_id)
            }
            DeleteOutcome::Failed(e) => {
                warn!("Failed to delete idle help menu for user {}: {}", user_id, e)
            }
        }
    }

    fn delete_row(&self, user_id: i64) {
        if let Err(e) = self.with_store(|s| s.delete(user_id).map(|_| ())) {
            warn!("Failed to delete help menu row for user {}: {}", user_id, e);
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&MenuStore) -> Result<T>) -> Result<T> {
        let store = self
            .store
            .lock()
            .map_err(|e| anyhow!("Store lock poisoned: {}", e))?;
        f(&store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{EditOutcome, TransportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI32, Ordering};
    use teloxide::types::InlineKeyboardMarkup;

    /// Transport double that records calls and returns configured outcomes.
    pub(crate) struct RecordingTransport {
        next_message_id: AtomicI32,
        pub deleted: StdMutex<Vec<(i64, i32)>>,
        pub delete_outcome: StdMutex<DeleteOutcome>,
    }

    impl RecordingTransport {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                next_message_id: AtomicI32::new(1000),
                deleted: StdMutex::new(Vec::new()),
                delete_outcome: StdMutex::new(DeleteOutcome::Deleted),
            })
        }

        pub(crate) fn deletions(&self) -> Vec<(i64, i32)> {
            self.deleted.lock().unwrap().clone()
        }

        pub(crate) fn fail_deletes(&self, reason: &str) {
            *self.delete_outcome.lock().unwrap() = DeleteOutcome::Failed(reason.to_string());
        }
    }

    #[async_trait]
    impl MenuTransport for RecordingTransport {
        async fn send_menu(
            &self,
            _chat: ChatId,
            _text: &str,
            _keyboard: InlineKeyboardMarkup,
        ) -> Result<MessageId, TransportError> {
            Ok(MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst)))
        }

        async fn edit_menu(
            &self,
            _chat: ChatId,
            _message: MessageId,
            _text: &str,
            _keyboard: InlineKeyboardMarkup,
        ) -> Result<EditOutcome, TransportError> {
            Ok(EditOutcome::Edited)
        }

        async fn delete_menu(&self, chat: ChatId, message: MessageId) -> DeleteOutcome {
            self.deleted.lock().unwrap().push((chat.0, message.0));
            self.delete_outcome.lock().unwrap().clone()
        }

        async fn ack_callback(&self, _callback_id: &str) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send_notice(&self, _chat: ChatId, _text: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    const IDLE: Duration = Duration::from_secs(60);

    fn sessions_with(transport: Arc<RecordingTransport>) -> Arc<MenuSessions> {
        let store = MenuStore::open_in_memory().unwrap();
        MenuSessions::new(store, transport, IDLE)
    }

    async fn settle() {
        // Let the fired expiry task finish its awaits.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_deletes_menu_and_purges_state() {
        let transport = RecordingTransport::new();
        let sessions = sessions_with(Arc::clone(&transport));

        sessions.touch(7, ChatId(100), MessageId(555)).await;
        assert_eq!(sessions.open_count().await, 1);
        assert!(sessions.last_activity(7).await.is_some());
        assert_eq!(sessions.with_store(|s| s.load_all()).unwrap().len(), 1);

        tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
        settle().await;

        assert_eq!(transport.deletions(), vec![(100, 555)]);
        assert_eq!(sessions.open_count().await, 0);
        assert!(sessions.with_store(|s| s.load_all()).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_rearms_the_timer() {
        let transport = RecordingTransport::new();
        let sessions = sessions_with(Arc::clone(&transport));

        sessions.touch(7, ChatId(100), MessageId(555)).await;

        // Halfway through the window the user navigates; same message.
        tokio::time::sleep(IDLE / 2).await;
        sessions.touch(7, ChatId(100), MessageId(555)).await;

        // The original deadline passes without a deletion.
        tokio::time::sleep(IDLE / 2 + Duration::from_secs(1)).await;
        settle().await;
        assert!(transport.deletions().is_empty());
        assert_eq!(sessions.open_count().await, 1);

        // The rearmed deadline fires.
        tokio::time::sleep(IDLE / 2 + Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(transport.deletions(), vec![(100, 555)]);
        assert_eq!(sessions.open_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_supersedes_the_previous_menu() {
        let transport = RecordingTransport::new();
        let sessions = sessions_with(Arc::clone(&transport));

        sessions.touch(7, ChatId(100), MessageId(555)).await;
        sessions.touch(7, ChatId(100), MessageId(556)).await;

        // Exactly one record afterwards.
        assert_eq!(sessions.open_count().await, 1);
        let rows = sessions.with_store(|s| s.load_all()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message_id, 556);

        // Only the second message is ever deleted; the first timer was
        // cancelled and could not have acted on message 555.
        tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(transport.deletions(), vec![(100, 556)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_fire_is_a_noop() {
        let transport = RecordingTransport::new();
        let sessions = sessions_with(Arc::clone(&transport));

        sessions.touch(7, ChatId(100), MessageId(555)).await;

        // Fire the captured identity of a superseded message directly,
        // simulating a timer that escaped cancellation.
        sessions.expire(7, MessageId(500)).await;

        assert!(transport.deletions().is_empty());
        assert_eq!(sessions.open_count().await, 1);
        assert_eq!(sessions.with_store(|s| s.load_all()).unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_close_purges_even_when_platform_delete_fails() {
        let transport = RecordingTransport::new();
        transport.fail_deletes("network unreachable");
        let sessions = sessions_with(Arc::clone(&transport));

        sessions.touch(7, ChatId(100), MessageId(555)).await;
        let outcome = sessions.close(7, ChatId(100), MessageId(555)).await;

        assert!(matches!(outcome, DeleteOutcome::Failed(_)));
        assert_eq!(sessions.open_count().await, 0);
        assert!(sessions.with_store(|s| s.load_all()).unwrap().is_empty());

        // The cancelled timer never acts afterwards.
        tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(transport.deletions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_deletes_rows_past_the_idle_window() {
        let transport = RecordingTransport::new();
        let store = MenuStore::open_in_memory().unwrap();

        let now = chrono::Utc::now().timestamp_millis();
        store.upsert(7, 100, 555, now - 2 * IDLE.as_millis() as i64).unwrap();

        let sessions = MenuSessions::new(store, transport.clone(), IDLE);
        sessions.recover().await.unwrap();

        assert_eq!(transport.deletions(), vec![(100, 555)]);
        assert_eq!(sessions.open_count().await, 0);
        assert!(sessions.with_store(|s| s.load_all()).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_rearms_young_rows_for_the_remaining_duration() {
        let transport = RecordingTransport::new();
        let store = MenuStore::open_in_memory().unwrap();

        // 20 of 60 seconds already elapsed before the restart.
        let now = chrono::Utc::now().timestamp_millis();
        store.upsert(7, 100, 555, now - 20_000).unwrap();

        let sessions = MenuSessions::new(store, transport.clone(), IDLE);
        sessions.recover().await.unwrap();

        assert_eq!(sessions.open_count().await, 1);
        assert!(transport.deletions().is_empty());

        // Well before the remaining 40 seconds: still alive.
        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(sessions.open_count().await, 1);

        // Past the remaining duration: expired.
        tokio::time::sleep(Duration::from_secs(15)).await;
        settle().await;
        assert_eq!(transport.deletions(), vec![(100, 555)]);
        assert_eq!(sessions.open_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_all_timers_without_touching_rows() {
        let transport = RecordingTransport::new();
        let sessions = sessions_with(Arc::clone(&transport));

        sessions.touch(1, ChatId(100), MessageId(10)).await;
        sessions.touch(2, ChatId(100), MessageId(20)).await;

        sessions.shutdown().await;
        assert_eq!(sessions.open_count().await, 0);

        tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
        settle().await;
        assert!(transport.deletions().is_empty());
        // Durable rows survive for the next recovery pass.
        assert_eq!(sessions.with_store(|s| s.load_all()).unwrap().len(), 2);
    }
}
