//! In-memory store for the current heart-rate reading.
//!
//! The store holds exactly one [`Reading`]. Writes replace it wholesale
//! under a write lock, so readers always see a value and timestamp that
//! were committed together.
//!
//! Every committed write is also queued for the sinks. The queue send
//! happens inside the same critical section as the write, which keeps
//! notification order identical to commit order.
//!
//! The queue is bounded. When slow sinks let it fill up, updates are
//! dropped with a warning instead of blocking writers. The last free slot
//! is kept for the shutdown reset, so that notification is never lost.

mod reading;

pub use reading::{Reading, Timestamp};

use crate::sink::{SinkDispatcher, SinkEvent, Sinks};
use parking_lot::RwLock;
use tokio::sync::mpsc::{error::TrySendError, Sender};

struct Inner {
    reading: Reading,
    notifier: Option<Sender<SinkEvent>>,
}

/// Single source of truth for the current reading.
pub struct ReadingStore {
    inner: RwLock<Inner>,
}

impl ReadingStore {
    /// Creates a store that forwards every change to `notifier`.
    pub fn new(notifier: Sender<SinkEvent>) -> Self {
        Self::with_notifier(Some(notifier))
    }

    /// Creates a store together with a dispatcher delivering to `sinks`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_sinks(sinks: Sinks) -> (Self, SinkDispatcher) {
        let (notifier, dispatcher) = SinkDispatcher::spawn(sinks);
        (Self::new(notifier), dispatcher)
    }

    /// Creates a store that never notifies anything.
    pub fn detached() -> Self {
        Self::with_notifier(None)
    }

    fn with_notifier(notifier: Option<Sender<SinkEvent>>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                reading: Reading::default(),
                notifier,
            }),
        }
    }

    /// Replaces the current reading. Last write wins.
    ///
    /// The realtime and durable log sinks are notified afterwards, in
    /// that order. Sink failures never affect the stored value.
    pub fn set(&self, value: f64, timestamp: Timestamp) {
        let mut inner = self.inner.write();
        inner.reading = Reading::new(value, timestamp);
        let event = SinkEvent::Update(inner.reading.clone());
        notify(&inner, event);
    }

    /// Returns a snapshot of the current reading.
    pub fn get(&self) -> Reading {
        self.inner.read().reading.clone()
    }

    /// Zeroes the value and tells the realtime sink transmission stopped.
    ///
    /// The timestamp of the last reading is kept.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.reading.value = 0.0;
        notify(&inner, SinkEvent::Reset);
    }

    /// Stops notifying sinks.
    ///
    /// Once closed, the dispatcher drains what is already queued and
    /// exits. Later writes still update the reading.
    pub fn close(&self) {
        self.inner.write().notifier.take();
    }
}

fn notify(inner: &Inner, event: SinkEvent) {
    let Some(notifier) = &inner.notifier else {
        return;
    };

    // Senders only ever run under the write lock, so capacity cannot shrink
    // between this check and the send.
    if matches!(event, SinkEvent::Update(_)) && notifier.capacity() <= 1 {
        tracing::warn!("Sink queue full; dropping update");
        return;
    }

    match notifier.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::warn!("Sink queue full; dropping notification");
        }
        Err(TrySendError::Closed(_)) => {
            tracing::warn!("Sink dispatcher is gone; dropping notification");
        }
    }
}
