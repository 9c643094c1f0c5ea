//! # Connection supervisor: keeps one logical stream alive.
//!
//! ```text
//! loop {
//!   ├─► no source?
//!   │     ├─► publish Connecting
//!   │     ├─► factory.open(request)  (cancellable)
//!   │     │     ├─ Ok  → publish Connected, reset backoff, read
//!   │     │     └─ Err → publish ConnectFailed ──┐
//!   ├─► source.next_line()            (cancellable)
//!   │     ├─ line  → queue.push, read again      │
//!   │     └─ fault → publish TransportFailed ────┤
//!   └─► backoff.record(kind)  ◄──────────────────┘
//!         ├─ After(d) → publish BackoffScheduled, sleep(d) (cancellable)
//!         └─ Exhausted → publish BackoffExhausted, stop
//! }
//! ```
//!
//! ## Rules
//! - Attempts are sequential; at most one source is open at a time.
//! - The stop signal is observed at every suspension point: open, read and sleep.
//! - A read that stays silent past `read_timeout` is a transport fault.
//! - Successful reads never touch the backoff state; only a successful open
//!   resets it.
//! - The attempt counter is monotonic over the lifetime of the stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::queue::LineSender;
use crate::core::state::{CloseReason, StateCell};
use crate::error::StreamFault;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{BackoffState, Retry};
use crate::source::{BoxLineSource, ConnectionRequest, FactoryRef};

enum Read {
    Line(String),
    Fault(StreamFault),
    Stopped,
}

pub(crate) struct Supervisor {
    factory: FactoryRef,
    request: ConnectionRequest,
    cfg: Arc<Config>,
    queue: LineSender,
    bus: Bus,
    state: StateCell,
}

impl Supervisor {
    pub(crate) fn new(
        factory: FactoryRef,
        request: ConnectionRequest,
        cfg: Arc<Config>,
        queue: LineSender,
        bus: Bus,
        state: StateCell,
    ) -> Self {
        Self {
            factory,
            request,
            cfg,
            queue,
            bus,
            state,
        }
    }

    /// Runs until `token` is cancelled or the refused regime gives up.
    ///
    /// Dropping `self` on return closes the queue, which lets the dispatcher
    /// drain and finish.
    pub(crate) async fn run(self, token: CancellationToken) -> CloseReason {
        let mut source: Option<BoxLineSource> = None;
        let mut backoff = BackoffState::new();
        let mut attempt: u32 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }

            let fault = match source.take() {
                Some(mut current) => match Self::read(&mut current, &token, self.cfg.read_limit()).await {
                    Read::Line(line) => {
                        if !self.queue.push(line) {
                            current.close();
                            break;
                        }
                        source = Some(current);
                        continue;
                    }
                    Read::Stopped => {
                        current.close();
                        break;
                    }
                    Read::Fault(fault) => {
                        current.close();
                        debug!(target: "firehose::supervisor", error = %fault, "stream read failed");
                        self.publish(Event::new(EventKind::TransportFailed).with_fault(&fault));
                        fault
                    }
                },
                None => {
                    attempt = attempt.saturating_add(1);
                    self.publish(Event::new(EventKind::Connecting).with_attempt(attempt));

                    let opened = tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        res = self.factory.open(&self.request) => res,
                    };
                    match opened {
                        Ok(current) => {
                            backoff.reset();
                            info!(
                                target: "firehose::supervisor",
                                factory = self.factory.name(),
                                attempt,
                                "stream connected"
                            );
                            self.publish(Event::new(EventKind::Connected).with_attempt(attempt));
                            source = Some(current);
                            continue;
                        }
                        Err(fault) => {
                            warn!(
                                target: "firehose::supervisor",
                                attempt,
                                kind = fault.as_label(),
                                error = %fault,
                                "connect failed"
                            );
                            self.publish(
                                Event::new(EventKind::ConnectFailed)
                                    .with_attempt(attempt)
                                    .with_fault(&fault),
                            );
                            fault
                        }
                    }
                }
            };

            let kind = fault.kind();
            match backoff.record(kind, self.cfg.backoff_for(kind)) {
                Retry::After(delay) => {
                    debug!(
                        target: "firehose::supervisor",
                        failures = backoff.failures(),
                        delay = ?delay,
                        "reconnect scheduled"
                    );
                    self.publish(
                        Event::new(EventKind::BackoffScheduled)
                            .with_fault(&fault)
                            .with_attempt(backoff.failures())
                            .with_delay(delay),
                    );
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = time::sleep(delay) => {}
                    }
                }
                Retry::Exhausted => {
                    warn!(
                        target: "firehose::supervisor",
                        failures = backoff.failures(),
                        status = ?fault.status(),
                        "refused too many times, giving up"
                    );
                    self.publish(
                        Event::new(EventKind::BackoffExhausted)
                            .with_fault(&fault)
                            .with_attempt(backoff.failures()),
                    );
                    return CloseReason::BackoffExhausted {
                        status: fault.status(),
                    };
                }
            }
        }

        CloseReason::Requested
    }

    async fn read(
        source: &mut BoxLineSource,
        token: &CancellationToken,
        limit: Option<Duration>,
    ) -> Read {
        let next = async {
            match limit {
                Some(limit) => match time::timeout(limit, source.next_line()).await {
                    Ok(res) => res,
                    Err(_) => Err(StreamFault::transport(format!(
                        "stream stalled: no data for {limit:?}"
                    ))),
                },
                None => source.next_line().await,
            }
        };
        tokio::select! {
            biased;
            _ = token.cancelled() => Read::Stopped,
            res = next => match res {
                Ok(line) => Read::Line(line),
                Err(fault) => Read::Fault(fault),
            },
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(next) = ev.implied_state() {
            self.state.set(next);
        }
        self.bus.publish(ev);
    }
}
