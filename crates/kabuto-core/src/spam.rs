//! Per-sender anti-spam filter.
//!
//! Counts messages per sender in a fixed window. The window opens with the
//! sender's first message and resets once it has fully elapsed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Default number of messages allowed per window.
pub const DEFAULT_MAX_MESSAGES: u32 = 10;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Counter state for one sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// When the current window opened.
    pub window_start: Instant,
    /// When the sender last wrote (allowed or not).
    pub last_message: Instant,
    /// Messages seen since `window_start`, including blocked ones.
    pub count_in_window: u32,
}

impl RateLimitEntry {
    fn open(now: Instant) -> Self {
        Self {
            window_start: now,
            last_message: now,
            count_in_window: 1,
        }
    }
}

/// Shared map of sender id to window state.
///
/// Cloning yields another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct RateLimitStore {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

impl RateLimitStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of senders tracked.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true if no sender has been seen.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Snapshot of a sender's entry.
    pub async fn entry(&self, sender_id: &str) -> Option<RateLimitEntry> {
        self.entries.lock().await.get(sender_id).copied()
    }
}

/// Verdict for a single inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamDecision {
    /// Forward the message.
    Allowed,
    /// Drop the message.
    Blocked {
        /// True for the first blocked message of the current window.
        first_in_window: bool,
    },
}

impl SpamDecision {
    /// Returns true if the message may be forwarded.
    pub fn is_allowed(&self) -> bool {
        matches!(self, SpamDecision::Allowed)
    }
}

/// Fixed-window rate limiter keyed by sender id.
#[derive(Debug, Clone)]
pub struct AntiSpamFilter {
    store: RateLimitStore,
    max_messages: u32,
    window: Duration,
}

impl AntiSpamFilter {
    /// Creates a filter allowing `max_messages` per `window`, backed by `store`.
    pub fn new(store: RateLimitStore, max_messages: u32, window: Duration) -> Self {
        Self {
            store,
            max_messages,
            window,
        }
    }

    /// Returns the backing store handle.
    pub fn store(&self) -> &RateLimitStore {
        &self.store
    }

    /// Returns true if the message from `sender_id` at `now` may pass.
    pub async fn should_allow(&self, sender_id: &str, now: Instant) -> bool {
        self.check(sender_id, now).await.is_allowed()
    }

    /// Records a message from `sender_id` at `now` and decides on it.
    pub async fn check(&self, sender_id: &str, now: Instant) -> SpamDecision {
        let mut entries = self.store.entries.lock().await;

        let Some(entry) = entries.get_mut(sender_id) else {
            entries.insert(sender_id.to_string(), RateLimitEntry::open(now));
            return SpamDecision::Allowed;
        };

        if now.saturating_duration_since(entry.window_start) >= self.window {
            *entry = RateLimitEntry::open(now);
            return SpamDecision::Allowed;
        }

        entry.last_message = now;
        entry.count_in_window = entry.count_in_window.saturating_add(1);

        if entry.count_in_window <= self.max_messages {
            SpamDecision::Allowed
        } else {
            debug!(
                sender_id = %sender_id,
                count = entry.count_in_window,
                "Sender over rate limit"
            );
            SpamDecision::Blocked {
                first_in_window: entry.count_in_window == self.max_messages + 1,
            }
        }
    }
}

impl Default for AntiSpamFilter {
    fn default() -> Self {
        Self::new(RateLimitStore::new(), DEFAULT_MAX_MESSAGES, DEFAULT_WINDOW)
    }
}
