//! User-facing notifications (toasts).
//!
//! A [`Notifier`] is an explicit context object handed to every board; there is
//! no global queue. Views subscribe for live delivery and drop the
//! [`Subscription`] to stop receiving.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

const DEFAULT_HISTORY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub message: String,
}

struct Inner {
    sender: broadcast::Sender<Notification>,
    recent: Mutex<VecDeque<Notification>>,
    history: usize,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl Notifier {
    pub fn new(history: usize) -> Self {
        let (sender, _) = broadcast::channel(history.max(1) * 2);
        Self {
            inner: Arc::new(Inner {
                sender,
                recent: Mutex::new(VecDeque::with_capacity(history)),
                history,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn notify(&self, level: Level, message: impl Into<String>) -> Notification {
        let notification = Notification {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            level,
            message: message.into(),
        };
        debug!(level = ?notification.level, message = %notification.message, "Notification");

        {
            let mut recent = self.inner.recent.lock().unwrap_or_else(|e| e.into_inner());
            if recent.len() == self.inner.history {
                recent.pop_front();
            }
            if self.inner.history > 0 {
                recent.push_back(notification.clone());
            }
        }

        // No subscribers is fine; the history still has it.
        let _ = self.inner.sender.send(notification.clone());
        notification
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.notify(Level::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.notify(Level::Error, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.notify(Level::Info, message)
    }

    /// Most recent notifications, oldest first.
    pub fn recent(&self) -> Vec<Notification> {
        let recent = self.inner.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.inner.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

/// Live feed of notifications published after it was created.
pub struct Subscription {
    receiver: broadcast::Receiver<Notification>,
}

impl Subscription {
    /// Waits for the next notification. Returns `None` once the notifier is gone.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll for an already published notification.
    pub fn try_next(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) => return Some(notification),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
