//! Per-context delivery.
//!
//! Every context is served by one task that exclusively owns its
//! [`ResponseChannelConsumer`] (and so its parser). Buffers, handler
//! completions and lifecycle signals reach it through a single queue and are
//! processed one at a time, in arrival order.
//!
//! Abandoning a context stops consumption immediately: events still queued
//! are dropped (their buffers released), the parser and its unconsumed bytes
//! are discarded, and a handler completion that resolves later is ignored.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::channel::buffer::ConsumerBuffer;
use crate::channel::consumer::{Framing, ResponseChannelConsumer, ResponseConsumer};
use crate::http::parser::{ParseError, ParserLimits};
use crate::http::response::Response;
use crate::resource::route::Completes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

enum Event {
    Data(ConsumerBuffer),
    Completed(Response),
    Closed,
    Abandoned,
}

/// Why a context task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEnd {
    /// The stream ended normally.
    Closed,
    Abandoned,
    /// The stream carried malformed bytes.
    Failed(ParseError),
    /// Every handle was dropped without closing or abandoning.
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    pub id: ContextId,
    pub forwarded: usize,
    pub end: ContextEnd,
}

/// Sending side of a context's queue. Cheap to clone.
#[derive(Clone)]
pub struct ContextHandle {
    id: ContextId,
    tx: mpsc::UnboundedSender<Event>,
    abandoned: Arc<AtomicBool>,
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("id", &self.id)
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

impl ContextHandle {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::Acquire)
    }

    /// Queues an arriving buffer. Returns false, releasing the buffer, when
    /// the context no longer consumes.
    pub fn deliver(&self, buffer: ConsumerBuffer) -> bool {
        if self.is_abandoned() {
            trace!(context = %self.id, len = buffer.len(), "Buffer arrived after abandonment");
            return false;
        }
        self.tx.send(Event::Data(buffer)).is_ok()
    }

    /// Routes a handler's eventual response back to this context.
    ///
    /// The returned task yields whether the response was queued; a completion
    /// that resolves after abandonment is dropped silently.
    pub fn respond(&self, completes: Completes) -> JoinHandle<bool> {
        let id = self.id;
        let tx = self.tx.clone();
        let abandoned = Arc::clone(&self.abandoned);
        tokio::spawn(async move {
            let response = completes.await;
            if abandoned.load(Ordering::Acquire) {
                trace!(context = %id, status = response.status.as_u16(), "Dropping late completion");
                return false;
            }
            tx.send(Event::Completed(response)).is_ok()
        })
    }

    /// Signals the end of the byte stream. Returns false when the context
    /// task had already stopped.
    pub fn close(&self) -> bool {
        let sent = self.tx.send(Event::Closed).is_ok();
        if !sent {
            trace!(context = %self.id, "Close after context stopped");
        }
        sent
    }

    /// Stops all further consumption for this context.
    pub fn abandon(&self) {
        if !self.abandoned.swap(true, Ordering::AcqRel) {
            debug!(context = %self.id, "Context abandoned");
            if self.tx.send(Event::Abandoned).is_err() {
                trace!(context = %self.id, "Abandon after context stopped");
            }
        }
    }
}

/// Opens contexts with fresh identities.
#[derive(Debug)]
pub struct Contexts {
    next_id: AtomicU64,
    limits: ParserLimits,
}

impl Default for Contexts {
    fn default() -> Self {
        Self::new(ParserLimits::default())
    }
}

impl Contexts {
    pub fn new(limits: ParserLimits) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            limits,
        }
    }

    /// Starts a context whose first buffer begins with a status line.
    pub fn open<C: ResponseConsumer>(&self, downstream: C) -> (ContextHandle, JoinHandle<ContextSummary>) {
        self.open_with(downstream, Framing::Full)
    }

    pub fn open_with<C: ResponseConsumer>(
        &self,
        downstream: C,
        framing: Framing,
    ) -> (ContextHandle, JoinHandle<ContextSummary>) {
        let id = ContextId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let consumer = ResponseChannelConsumer::with_framing(downstream, framing, self.limits);
        spawn_context(id, consumer)
    }
}

/// Spawns the task serving context `id`.
pub fn spawn_context<C: ResponseConsumer>(
    id: ContextId,
    consumer: ResponseChannelConsumer<C>,
) -> (ContextHandle, JoinHandle<ContextSummary>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let abandoned = Arc::new(AtomicBool::new(false));
    let handle = ContextHandle {
        id,
        tx,
        abandoned: Arc::clone(&abandoned),
    };
    let task = tokio::spawn(run(id, rx, abandoned, consumer));
    (handle, task)
}

async fn run<C: ResponseConsumer>(
    id: ContextId,
    mut rx: mpsc::UnboundedReceiver<Event>,
    abandoned: Arc<AtomicBool>,
    mut consumer: ResponseChannelConsumer<C>,
) -> ContextSummary {
    debug!(context = %id, "Context started");
    let mut end = ContextEnd::Detached;

    while let Some(event) = rx.recv().await {
        if abandoned.load(Ordering::Acquire) {
            end = ContextEnd::Abandoned;
            break;
        }
        match event {
            Event::Data(buffer) => {
                if let Err(err) = consumer.consume(buffer) {
                    warn!(context = %id, error = %err, "Dropping context after parse failure");
                    end = ContextEnd::Failed(err);
                    break;
                }
            }
            Event::Completed(response) => consumer.forward(response),
            Event::Closed => {
                end = match consumer.close() {
                    Ok(_) => ContextEnd::Closed,
                    Err(err) => ContextEnd::Failed(err),
                };
                break;
            }
            Event::Abandoned => {
                end = ContextEnd::Abandoned;
                break;
            }
        }
    }

    // Queued events still hold pooled buffers; release them now.
    rx.close();
    while rx.try_recv().is_ok() {}

    let discarded = consumer.discard();
    debug!(
        context = %id,
        forwarded = consumer.forwarded(),
        discarded,
        end = ?end,
        "Context stopped"
    );
    ContextSummary {
        id,
        forwarded: consumer.forwarded(),
        end,
    }
}
