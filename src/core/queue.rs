//! # Event queue between the reader and the dispatcher.
//!
//! Raw lines go in on the supervisor side and come out in the same order on
//! the dispatcher side. `push` never waits: the reader must never be slowed by
//! consumers. The queue is unbounded; memory is the only limit.

use tokio::sync::mpsc;

/// Producer side.
#[derive(Clone, Debug)]
pub(crate) struct LineSender {
    tx: mpsc::UnboundedSender<String>,
}

/// Consumer side.
#[derive(Debug)]
pub(crate) struct LineReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

/// Creates a connected queue pair.
pub(crate) fn line_queue() -> (LineSender, LineReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LineSender { tx }, LineReceiver { rx })
}

impl LineSender {
    /// Appends a line. Returns `false` if the consumer is gone.
    pub(crate) fn push(&self, line: String) -> bool {
        self.tx.send(line).is_ok()
    }
}

impl LineReceiver {
    /// Takes the oldest line without waiting.
    pub(crate) fn poll(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next line. `None` once all senders are gone and the
    /// queue is drained.
    pub(crate) async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_and_drain_after_sender_drop() {
        let (tx, mut rx) = line_queue();
        assert!(rx.poll().is_none());
        for l in ["a", "b", "c"] {
            assert!(tx.push(l.to_string()));
        }
        assert_eq!(rx.poll().as_deref(), Some("a"));
        drop(tx);
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
        assert_eq!(rx.recv().await.as_deref(), Some("c"));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_push_after_consumer_gone() {
        let (tx, rx) = line_queue();
        drop(rx);
        assert!(!tx.push("lost".into()));
    }
}
