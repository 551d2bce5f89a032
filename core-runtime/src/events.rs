//! # Event Bus System
//!
//! Provides an event-driven architecture for the Photo Backup Core using
//! `tokio::sync::broadcast`. This module enables decoupled communication
//! between core modules through typed events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for different domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, SyncEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Sync(SyncEvent::Started {
//!         pass_id: "pass-1".to_string(),
//!         direction: "upload".to_string(),
//!         total_items: 12,
//!     }))
//!     .ok();
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two types of
//! errors on the receive side:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates
//!   shutdown.
//!
//! Subscribers should handle `Lagged` gracefully and treat `Closed` as a
//! signal to exit.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event bus.
/// It wraps domain-specific event types for different modules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Identity and session events
    Identity(IdentityEvent),
    /// Backup/restore transfer events
    Sync(SyncEvent),
    /// Duplicate cleanup events
    Dedup(DedupEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Identity(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Dedup(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Identity(IdentityEvent::SessionInvalidated { .. }) => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Dedup(DedupEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Identity(IdentityEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Dedup(DedupEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Identity Events
// ============================================================================

/// Events related to the synchronization identity and session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum IdentityEvent {
    /// A device identity was derived and persisted for an email.
    SignedIn {
        /// Normalized login email.
        email: String,
        /// The derived device identity.
        device_id: String,
    },
    /// User signed out; the session token was cleared.
    SignedOut {
        /// Normalized login email.
        email: String,
    },
    /// A session token exists but no identity could be resolved; the session
    /// was invalidated and re-authentication is required.
    SessionInvalidated {
        /// Normalized login email, if one was remembered.
        email: Option<String>,
    },
}

impl IdentityEvent {
    fn description(&self) -> &str {
        match self {
            IdentityEvent::SignedIn { .. } => "Device identity resolved",
            IdentityEvent::SignedOut { .. } => "User signed out",
            IdentityEvent::SessionInvalidated { .. } => "Session invalidated",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Events related to backup (upload) and restore (download) passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Transfer pass initiated.
    Started {
        /// Unique identifier for this pass.
        pass_id: String,
        /// "upload" or "download".
        direction: String,
        /// Number of planned work items.
        total_items: u64,
    },
    /// Incremental progress update, emitted after each item.
    ///
    /// `percent` is `items_processed / total_items` as 0-100 and is
    /// monotonically non-decreasing within a pass. A value of 0 is emitted at
    /// pass start and again after the pass ends (the reset the presentation
    /// layer expects).
    Progress {
        /// The pass ID.
        pass_id: String,
        /// Number of items processed so far.
        items_processed: u64,
        /// Total items in the pass.
        total_items: u64,
        /// Progress percentage (0-100).
        percent: u8,
        /// Current phase (e.g., "uploading", "downloading").
        phase: String,
    },
    /// Pass finished; per-item failures are in the counts, not fatal.
    Completed {
        /// The pass ID.
        pass_id: String,
        /// Items transferred successfully.
        succeeded: u64,
        /// Uploads the server acknowledged as content-level duplicates.
        duplicates: u64,
        /// Items that failed and were skipped.
        failed: u64,
        /// Duration of the pass in seconds.
        duration_secs: u64,
    },
    /// Pass aborted before producing a work list (identity or remote-listing
    /// failure).
    Failed {
        /// The pass ID.
        pass_id: String,
        /// Human-readable error message.
        message: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Transfer pass started",
            SyncEvent::Progress { .. } => "Transfer in progress",
            SyncEvent::Completed { .. } => "Transfer pass completed",
            SyncEvent::Failed { .. } => "Transfer pass failed",
        }
    }
}

// ============================================================================
// Dedup Events
// ============================================================================

/// Events related to local duplicate detection and cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DedupEvent {
    /// Detection finished and a deletion plan is awaiting confirmation.
    PlanReady {
        /// Number of duplicate groups found.
        groups: u64,
        /// Number of assets marked for deletion.
        deletion_candidates: u64,
    },
    /// The user declined the deletion plan; nothing was deleted.
    Cancelled {
        /// Number of duplicate groups that were proposed.
        groups: u64,
    },
    /// The deletion batch completed.
    Completed {
        /// Number of duplicate groups resolved.
        groups: u64,
        /// Number of assets deleted.
        deleted: u64,
    },
    /// The deletion batch failed wholesale.
    Failed {
        /// Human-readable error message.
        message: String,
    },
}

impl DedupEvent {
    fn description(&self) -> &str {
        match self {
            DedupEvent::PlanReady { .. } => "Duplicate plan ready",
            DedupEvent::Cancelled { .. } => "Duplicate cleanup cancelled",
            DedupEvent::Completed { .. } => "Duplicate cleanup completed",
            DedupEvent::Failed { .. } => "Duplicate cleanup failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe());
///
/// // Only sync events
/// let mut sync_stream = stream.filter(|event| matches!(event, CoreEvent::Sync(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Receives the next event that passes the filter.
    ///
    /// Lagged errors are surfaced to the caller so slow consumers can decide
    /// how to handle missed events.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            match &self.filter {
                Some(f) if !f(&event) => continue,
                _ => return Ok(event),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let event = CoreEvent::Sync(SyncEvent::Started {
            pass_id: "p1".to_string(),
            direction: "upload".to_string(),
            total_items: 3,
        });
        bus.emit(event.clone()).unwrap();

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_all_events() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(CoreEvent::Identity(IdentityEvent::SignedOut {
            email: "user@example.com".to_string(),
        }))
        .unwrap();

        assert!(matches!(
            rx1.recv().await.unwrap(),
            CoreEvent::Identity(IdentityEvent::SignedOut { .. })
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            CoreEvent::Identity(IdentityEvent::SignedOut { .. })
        ));
    }

    #[tokio::test]
    async fn test_filtered_stream_skips_other_domains() {
        let bus = EventBus::new(16);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Dedup(_)));

        bus.emit(CoreEvent::Identity(IdentityEvent::SignedOut {
            email: "user@example.com".to_string(),
        }))
        .unwrap();
        bus.emit(CoreEvent::Dedup(DedupEvent::Cancelled { groups: 2 }))
            .unwrap();

        assert!(matches!(
            stream.recv().await.unwrap(),
            CoreEvent::Dedup(DedupEvent::Cancelled { groups: 2 })
        ));
    }

    #[test]
    fn test_severity_classification() {
        let failed = CoreEvent::Sync(SyncEvent::Failed {
            pass_id: "p1".to_string(),
            message: "remote listing failed".to_string(),
        });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let progress = CoreEvent::Sync(SyncEvent::Progress {
            pass_id: "p1".to_string(),
            items_processed: 1,
            total_items: 4,
            percent: 25,
            phase: "uploading".to_string(),
        });
        assert_eq!(progress.severity(), EventSeverity::Debug);
    }
}
