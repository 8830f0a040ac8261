//! Session lifecycle event bus.
//!
//! Every session transition publishes a [`SessionEvent`] on a lightweight
//! publish/subscribe bus built on [`tokio::sync::broadcast`]. Presentation
//! collaborators — toast rendering, navigation — subscribe here; none of
//! them are part of the session manager's core contract.
//!
//! Events are wrapped in [`Arc`] so that broadcasting to multiple
//! subscribers does not require cloning the payload.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockauth_store::UserRecord;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A session lifecycle event.
///
/// Every variant carries enough context for subscribers to render a
/// notification or request a navigation without reading manager state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A new account was registered and its session started.
    Registered {
        /// The newly created user.
        user: UserRecord,
        /// When the registration completed.
        timestamp: DateTime<Utc>,
    },

    /// An existing account logged in.
    LoggedIn {
        /// The authenticated user.
        user: UserRecord,
        timestamp: DateTime<Utc>,
    },

    /// The current session ended.
    LoggedOut { timestamp: DateTime<Utc> },

    /// The active session's token was replaced.
    TokenRefreshed { timestamp: DateTime<Utc> },

    /// A login or registration attempt failed.
    AuthFailed {
        /// Which operation failed ("login" or "register").
        operation: String,
        /// Human-readable failure message for display.
        message: String,
        timestamp: DateTime<Utc>,
    },
}

// ---------------------------------------------------------------------------
// Session bus
// ---------------------------------------------------------------------------

/// Publish/subscribe bus for [`SessionEvent`]s.
///
/// Cheaply cloneable (`Arc`-backed) and `Send + Sync`. Subscribers
/// receive [`Arc<SessionEvent>`] references.
#[derive(Clone)]
pub struct SessionBus {
    inner: Arc<SessionBusInner>,
}

struct SessionBusInner {
    sender: broadcast::Sender<Arc<SessionEvent>>,
}

impl SessionBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// If a subscriber falls behind by more than `capacity` events, it
    /// will receive a [`broadcast::error::RecvError::Lagged`] error
    /// indicating how many events were missed.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(SessionBusInner { sender }),
        }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of receivers that will observe this event. If
    /// there are no active subscribers the event is silently dropped (a
    /// headless caller may well not care about toasts).
    pub fn publish(&self, event: SessionEvent) -> usize {
        let event = Arc::new(event);
        match self.inner.sender.send(event) {
            Ok(n) => {
                tracing::trace!(receivers = n, "session event published");
                n
            }
            Err(_) => {
                tracing::trace!("session event published but no active receivers");
                0
            }
        }
    }

    /// Create a new subscriber that will receive all future events.
    ///
    /// Events published *before* this call are **not** replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SessionEvent>> {
        self.inner.sender.subscribe()
    }

    /// Return the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
