//! Ordered, failure-isolated delivery of store notifications.

use super::Sinks;
use crate::store::Reading;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

/// Default number of events the dispatcher queue holds.
pub const QUEUE_CAPACITY: usize = 1024;

/// A change the sinks need to hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// A new reading was committed.
    Update(Reading),
    /// The relay stopped; the realtime sink should see zero.
    Reset,
}

/// Background task delivering [`SinkEvent`]s to the configured sinks.
///
/// Events are handled one at a time in the order they were queued. For an
/// update the realtime sink runs first, then the durable log sink.
pub struct SinkDispatcher {
    handle: JoinHandle<()>,
}

impl SinkDispatcher {
    /// Spawns the dispatcher with a queue of [`QUEUE_CAPACITY`] events.
    ///
    /// The task exits once every sender is dropped and the queue is empty.
    pub fn spawn(sinks: Sinks) -> (Sender<SinkEvent>, Self) {
        Self::spawn_with_capacity(sinks, QUEUE_CAPACITY)
    }

    /// Spawns the dispatcher with a queue of `capacity` events (at least 2).
    pub fn spawn_with_capacity(sinks: Sinks, capacity: usize) -> (Sender<SinkEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(2));
        let handle = tokio::spawn(run(sinks, rx));
        (tx, Self { handle })
    }

    /// Waits until all queued events have been delivered.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Sink dispatcher task failed");
        }
    }
}

async fn run(sinks: Sinks, mut rx: Receiver<SinkEvent>) {
    while let Some(event) = rx.recv().await {
        deliver(&sinks, event).await;
    }
    tracing::debug!("Sink dispatcher stopped");
}

async fn deliver(sinks: &Sinks, event: SinkEvent) {
    match event {
        SinkEvent::Update(reading) => {
            if let Err(e) = sinks
                .realtime
                .send(reading.value, Some(&reading.timestamp))
                .await
            {
                tracing::warn!(sink = sinks.realtime.name(), error = %e, "Realtime sink failed");
            }
            if let Err(e) = sinks.log.write(&reading.timestamp, reading.value).await {
                tracing::warn!(sink = sinks.log.name(), error = %e, "Log sink failed");
            }
        }
        SinkEvent::Reset => {
            if let Err(e) = sinks.realtime.send(0.0, None).await {
                tracing::warn!(sink = sinks.realtime.name(), error = %e, "Realtime sink reset failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::test_support::{Delivery, FailingSink, RecordingSink};
    use crate::store::Timestamp;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failing_realtime_sink_does_not_block_log() {
        let recorder = RecordingSink::default();
        let sinks = Sinks::new(Arc::new(FailingSink), Arc::new(recorder.clone()));
        let (tx, dispatcher) = SinkDispatcher::spawn(sinks);

        tx.send(SinkEvent::Update(Reading::new(64.0, Timestamp::from(1))))
            .await
            .unwrap();
        tx.send(SinkEvent::Reset).await.unwrap();
        tx.send(SinkEvent::Update(Reading::new(65.0, Timestamp::from(2))))
            .await
            .unwrap();
        drop(tx);
        dispatcher.join().await;

        assert_eq!(
            recorder.deliveries(),
            vec![
                Delivery::Log(Timestamp::from(1), 64.0),
                Delivery::Log(Timestamp::from(2), 65.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_join_drains_queue() {
        let recorder = RecordingSink::default();
        let (tx, dispatcher) = SinkDispatcher::spawn(recorder.sinks());

        for i in 0..50 {
            tx.send(SinkEvent::Update(Reading::new(i as f64, Timestamp::from(i))))
                .await
                .unwrap();
        }
        drop(tx);
        dispatcher.join().await;

        assert_eq!(recorder.deliveries().len(), 100);
    }
}
