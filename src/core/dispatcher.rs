//! # Dispatcher: from raw lines to listener calls.
//!
//! ```text
//! LineReceiver ──► classify ──► decode ──► ListenerSet::emit
//!                     │            │
//!                     │            └─ error → DecodeFailed, line dropped
//!                     └─ KeepAlive / Unrecognized → skipped
//! ```
//!
//! Lines are handled strictly in queue order. A bad line never stops the
//! loop.

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::core::queue::LineReceiver;
use crate::events::{Bus, Event, EventKind};
use crate::listeners::ListenerSet;
use crate::message::{Classification, classify, decode};

pub(crate) struct Dispatcher {
    queue: LineReceiver,
    listeners: ListenerSet,
    bus: Bus,
}

impl Dispatcher {
    pub(crate) fn new(queue: LineReceiver, listeners: ListenerSet, bus: Bus) -> Self {
        Self {
            queue,
            listeners,
            bus,
        }
    }

    /// Runs until `token` is cancelled or the queue is closed and drained,
    /// then waits for listener workers to finish in-flight messages.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        loop {
            let line = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                line = self.queue.recv() => match line {
                    Some(line) => line,
                    None => break,
                },
            };
            self.dispatch(&line);

            // Drain what is already queued without parking again.
            while !token.is_cancelled() {
                match self.queue.poll() {
                    Some(line) => self.dispatch(&line),
                    None => break,
                }
            }
        }
        self.listeners.shutdown().await;
    }

    fn dispatch(&self, line: &str) {
        let class = classify(line);
        match class {
            Classification::KeepAlive => return,
            Classification::Unrecognized => {
                trace!(target: "firehose::dispatch", line, "unrecognized line skipped");
                return;
            }
            _ => {}
        }

        match decode(class, line) {
            Ok(Some(msg)) => self.listeners.emit(msg),
            Ok(None) => {}
            Err(err) => {
                debug!(
                    target: "firehose::dispatch",
                    class = class.as_str(),
                    error = %err,
                    "dropping undecodable line"
                );
                self.bus
                    .publish(Event::new(EventKind::DecodeFailed).with_reason(err.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::line_queue;
    use crate::listeners::Listener;
    use crate::message::{DeletionNotice, StallWarning, Status};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    #[async_trait]
    impl Listener for Log {
        async fn on_status(&self, s: &Status) {
            self.0.lock().unwrap().push(format!("status:{}", s.id));
        }
        async fn on_delete(&self, d: &DeletionNotice) {
            self.0.lock().unwrap().push(format!("delete:{}", d.status_id));
        }
        async fn on_track_limit(&self, n: u64) {
            self.0.lock().unwrap().push(format!("limit:{n}"));
        }
        async fn on_stall_warning(&self, w: &StallWarning) {
            self.0.lock().unwrap().push(format!("warning:{}", w.code));
        }
    }

    #[tokio::test]
    async fn test_dispatch_order_and_skips() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let log = Arc::new(Log::default());
        let (tx, rx) = line_queue();
        let dispatcher = Dispatcher::new(rx, ListenerSet::new(vec![log.clone()], bus.clone()), bus);

        for line in [
            "",
            r#"{"id":7,"text":"hi","in_reply_to_status_id":null}"#,
            r#"{"limit":{"track":5}}"#,
            r#"{"delete":{"status":{"id":7,"user_id":3}}}"#,
            "BOGUS",
            r#"{"limit":{"track":"many"}}"#,
            r#"{"warning":{"code":"FALLING_BEHIND","message":"m","percent_full":60}}"#,
        ] {
            tx.push(line.to_string());
        }
        drop(tx);
        dispatcher.run(CancellationToken::new()).await;

        assert_eq!(
            *log.0.lock().unwrap(),
            vec!["status:7", "limit:5", "delete:7", "warning:FALLING_BEHIND"]
        );
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::DecodeFailed);
    }

    #[tokio::test]
    async fn test_cancel_stops_before_queued_lines() {
        let bus = Bus::new(4);
        let log = Arc::new(Log::default());
        let (tx, rx) = line_queue();
        tx.push(r#"{"limit":{"track":1}}"#.to_string());
        let token = CancellationToken::new();
        token.cancel();

        Dispatcher::new(rx, ListenerSet::new(vec![log.clone()], bus.clone()), bus)
            .run(token)
            .await;
        assert!(log.0.lock().unwrap().is_empty());
    }
}
