//! Test doubles for the completion and send seams.
//!
//! Available to this crate's tests and, through the `testing` feature, to
//! the channel crates' tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::completion::CompletionClient;
use crate::error::{ApiError, Result};
use crate::models::OutgoingReply;
use crate::relay::ReplySender;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

type ErrorFactory = Box<dyn Fn() -> ApiError + Send + Sync>;

/// Completion client returning a canned reply or a canned error.
pub struct MockCompletion {
    reply: Option<String>,
    error: Option<ErrorFactory>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    /// Always answers `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            error: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with the error built by `make_error`.
    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> ApiError + Send + Sync + 'static,
    {
        Self {
            reply: None,
            error: Some(Box::new(make_error)),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `generate_reply` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn generate_reply(&self, conversation_text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.prompts).push(conversation_text.to_string());

        match (&self.reply, &self.error) {
            (_, Some(make_error)) => Err(make_error()),
            (Some(reply), None) => Ok(reply.clone()),
            (None, None) => Err(ApiError::Malformed("mock has no reply".to_string())),
        }
    }
}

/// Sender that records replies instead of delivering them.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutgoingReply>>,
    fail: bool,
}

impl RecordingSender {
    /// Records every reply and reports success.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every reply and reports a rejected send.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Replies handed to the sender, in order.
    pub fn sent(&self) -> Vec<OutgoingReply> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl ReplySender for RecordingSender {
    async fn send_reply(&self, reply: &OutgoingReply) -> Result<()> {
        lock(&self.sent).push(reply.clone());
        if self.fail {
            return Err(ApiError::Rejected("recording sender set to fail".to_string()));
        }
        Ok(())
    }
}
