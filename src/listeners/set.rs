//! # Non-blocking message fan-out to multiple listeners.
//!
//! ```text
//! emit(msg)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► listener1.on_*()
//!     │   (unbounded)        └──────► panic → ListenerPanicked
//!     ├──► [queue 2] ──► worker 2 ──► listener2.on_*()
//!     └──► [queue N] ──► worker N ──► listenerN.on_*()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` never waits for a listener.
//! - **Lossless**: every message reaches every listener exactly once.
//! - **Isolation**: a slow or panicking listener does not delay the others.
//! - **Backlog warning**: when a listener's backlog reaches
//!   [`Listener::backlog_warning`], `ListenerLagging` is published once per
//!   crossing.
//! - **Per-listener FIFO**; no ordering across listeners.
//! - **Drain on shutdown**: queued messages are still delivered.
//!
//! Workers use `catch_unwind` with `AssertUnwindSafe`: a listener that panics
//! while holding a lock may leave its own state inconsistent.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::events::{Bus, Event};
use crate::listeners::listener::{Listener, deliver};
use crate::message::StreamMessage;

struct ListenerChannel {
    name: &'static str,
    sender: mpsc::UnboundedSender<Arc<StreamMessage>>,
    pending: Arc<AtomicUsize>,
    warn_at: usize,
}

/// Fan-out coordinator: one unbounded queue and one worker per listener.
pub(crate) struct ListenerSet {
    channels: Vec<ListenerChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ListenerSet {
    /// Creates a new set and spawns one worker per listener.
    ///
    /// Must be called within a tokio runtime.
    pub(crate) fn new(listeners: Vec<Arc<dyn Listener>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(listeners.len());
        let mut workers = Vec::with_capacity(listeners.len());

        for listener in listeners {
            let name = listener.name();
            let warn_at = listener.backlog_warning();
            let (tx, mut rx) = mpsc::unbounded_channel::<Arc<StreamMessage>>();
            let pending = Arc::new(AtomicUsize::new(0));
            let worker_pending = Arc::clone(&pending);
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    let fut = deliver(listener.as_ref(), msg.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = if let Some(s) = panic.downcast_ref::<&'static str>() {
                            (*s).to_string()
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        warn!(target: "firehose::listeners", listener = name, panic = %info, "listener panicked");
                        worker_bus.publish(Event::listener_panicked(name, info));
                    }
                    worker_pending.fetch_sub(1, Ordering::AcqRel);
                }
            });
            channels.push(ListenerChannel {
                name,
                sender: tx,
                pending,
                warn_at,
            });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of listeners.
    pub(crate) fn len(&self) -> usize {
        self.channels.len()
    }

    /// Hands `msg` to every listener's queue without waiting.
    pub(crate) fn emit(&self, msg: StreamMessage) {
        let msg = Arc::new(msg);
        for channel in &self.channels {
            let pending = channel.pending.fetch_add(1, Ordering::AcqRel) + 1;
            if channel.sender.send(Arc::clone(&msg)).is_err() {
                channel.pending.fetch_sub(1, Ordering::AcqRel);
                warn!(target: "firehose::listeners", listener = channel.name, "listener worker is gone");
                continue;
            }
            if channel.warn_at > 0 && pending == channel.warn_at {
                warn!(target: "firehose::listeners", listener = channel.name, pending, "listener is lagging");
                self.bus
                    .publish(Event::listener_lagging(channel.name, pending));
            }
        }
    }

    /// Closes all queues and waits for workers to finish what is queued.
    pub(crate) async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::message::Status;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    #[derive(Default)]
    struct Recorder {
        limits: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Listener for Recorder {
        async fn on_track_limit(&self, n: u64) {
            self.limits.lock().unwrap().push(n);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Listener for Panicky {
        async fn on_track_limit(&self, n: u64) {
            if n == 1 {
                panic!("boom on {n}");
            }
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    /// Blocks every call until the gate is opened, then records.
    struct Gated {
        gate: Semaphore,
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Listener for Gated {
        async fn on_track_limit(&self, n: u64) {
            let _permit = self.gate.acquire().await.unwrap();
            self.seen.lock().unwrap().push(n);
        }
        fn name(&self) -> &'static str {
            "gated"
        }
        fn backlog_warning(&self) -> usize {
            64
        }
    }

    #[tokio::test]
    async fn test_every_listener_gets_each_message_in_order() {
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let set = ListenerSet::new(vec![a.clone(), b.clone()], Bus::new(16));
        assert_eq!(set.len(), 2);

        for n in 0..5 {
            set.emit(StreamMessage::TrackLimit(n));
        }
        set.shutdown().await;

        assert_eq!(*a.limits.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(*b.limits.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_panic_is_isolated_and_reported() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let set = ListenerSet::new(vec![Arc::new(Panicky), rec.clone()], bus);

        set.emit(StreamMessage::TrackLimit(1));
        set.emit(StreamMessage::TrackLimit(2));
        set.shutdown().await;

        assert_eq!(*rec.limits.lock().unwrap(), vec![1, 2]);
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ListenerPanicked);
        assert_eq!(ev.listener.as_deref(), Some("panicky"));
        assert!(ev.reason.as_deref().unwrap().contains("boom on 1"));
    }

    #[tokio::test]
    async fn test_stalled_listener_loses_nothing() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let gated = Arc::new(Gated {
            gate: Semaphore::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let rec = Arc::new(Recorder::default());
        let set = ListenerSet::new(vec![gated.clone(), rec.clone()], bus);

        for n in 0..1100 {
            set.emit(StreamMessage::TrackLimit(n));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gated.seen.lock().unwrap().is_empty());
        assert_eq!(rec.limits.lock().unwrap().len(), 1100);

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ListenerLagging);
        assert_eq!(ev.listener.as_deref(), Some("gated"));
        assert_eq!(ev.attempt, Some(64));

        gated.gate.add_permits(1);
        set.shutdown().await;
        assert_eq!(*gated.seen.lock().unwrap(), (0..1100).collect::<Vec<u64>>());

        // The recorder's worker never ran during the emit loop either.
        let ev = events.try_recv().unwrap();
        assert_eq!(ev.listener.as_deref(), Some("recorder"));
        assert_eq!(ev.attempt, Some(1024));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_statuses_are_shared_not_copied_per_listener() {
        struct Count(Mutex<u32>);
        #[async_trait]
        impl Listener for Count {
            async fn on_status(&self, _s: &Status) {
                *self.0.lock().unwrap() += 1;
            }
        }
        let c = Arc::new(Count(Mutex::new(0)));
        let set = ListenerSet::new(vec![c.clone()], Bus::new(4));
        let status: Status = serde_json::from_str(r#"{"id":1,"in_reply_to_status_id":null}"#).unwrap();
        set.emit(StreamMessage::Status(Box::new(status)));
        set.shutdown().await;
        assert_eq!(*c.0.lock().unwrap(), 1);
    }
}
