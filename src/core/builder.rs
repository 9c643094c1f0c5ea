//! # Stream wiring.
//!
//! [`StreamBuilder`] assembles the queue, listener set, dispatcher and
//! supervisor of one stream and spawns them; [`open`] is the one-call form.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::config::Config;
use crate::core::dispatcher::Dispatcher;
use crate::core::handle::{Shared, StreamHandle};
use crate::core::queue::line_queue;
use crate::core::state::{CloseReason, ConnectionState};
use crate::core::supervisor::Supervisor;
use crate::events::{Bus, Event, EventKind};
use crate::listeners::{Listener, ListenerSet};
use crate::source::{ConnectionRequest, FactoryRef};

/// Opens a stream with the given listeners and configuration.
///
/// Returns immediately; connecting happens in the background. Must be called
/// within a tokio runtime.
pub fn open(
    factory: FactoryRef,
    request: ConnectionRequest,
    listeners: Vec<Arc<dyn Listener>>,
    config: Config,
) -> StreamHandle {
    StreamBuilder::new(factory, request)
        .with_config(config)
        .with_listeners(listeners)
        .open()
}

/// Builder for a stream with optional settings.
pub struct StreamBuilder {
    factory: FactoryRef,
    request: ConnectionRequest,
    cfg: Config,
    listeners: Vec<Arc<dyn Listener>>,
}

impl StreamBuilder {
    /// Starts a builder with the default [`Config`] and no listeners.
    pub fn new(factory: FactoryRef, request: ConnectionRequest) -> Self {
        Self {
            factory,
            request,
            cfg: Config::default(),
            listeners: Vec::new(),
        }
    }

    /// Sets the configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replaces the listener list.
    pub fn with_listeners(mut self, listeners: Vec<Arc<dyn Listener>>) -> Self {
        self.listeners = listeners;
        self
    }

    /// Adds one listener.
    pub fn listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Spawns the supervisor and dispatcher and returns the handle.
    ///
    /// Must be called within a tokio runtime.
    pub fn open(self) -> StreamHandle {
        self.open_subscribed().0
    }

    /// Like [`open`](Self::open), also returning a lifecycle event receiver
    /// subscribed before the stream starts, so the first `Connecting` is
    /// never missed.
    pub fn open_subscribed(self) -> (StreamHandle, broadcast::Receiver<Event>) {
        let bus_capacity = self.cfg.bus_capacity_clamped();
        let bus = Bus::new(bus_capacity);
        let events = bus.subscribe();
        let shared = Arc::new(Shared::new(bus.clone()));
        let (tx, rx) = line_queue();

        let listeners = ListenerSet::new(self.listeners, bus.clone());
        let listener_count = listeners.len();
        let dispatcher = Dispatcher::new(rx, listeners, bus.clone());
        let supervisor = Supervisor::new(
            Arc::clone(&self.factory),
            self.request,
            Arc::new(self.cfg),
            tx,
            bus,
            shared.state.clone(),
        );

        info!(
            target: "firehose::stream",
            factory = self.factory.name(),
            listeners = listener_count,
            bus_capacity,
            "stream opening"
        );
        tokio::spawn(drive(supervisor, dispatcher, Arc::clone(&shared)));
        (StreamHandle::new(shared), events)
    }
}

/// Runs one stream to completion and performs the single transition to Closed.
async fn drive(supervisor: Supervisor, dispatcher: Dispatcher, shared: Arc<Shared>) {
    let token = shared.token.clone();
    let dispatch = tokio::spawn(dispatcher.run(token.clone()));

    let reason = supervisor.run(token.clone()).await;
    let _ = dispatch.await;
    token.cancel();

    let reason = *shared.reason.get_or_init(|| reason);
    let ev = match reason {
        CloseReason::Requested => Event::new(EventKind::Closed).with_reason("requested"),
        CloseReason::BackoffExhausted { status } => {
            let ev = Event::new(EventKind::Closed).with_reason("backoff exhausted");
            match status {
                Some(code) => ev.with_status(code),
                None => ev,
            }
        }
    };
    info!(target: "firehose::stream", reason = ?reason, "stream closed");
    shared.bus.publish(ev);
    shared.state.set(ConnectionState::Closed);
}
