//! Holds native events back until the connection is ready, then hands them
//! to subscribers in arrival order.
//!
//! Readiness, the pending queue and the subscriber list share one lock, and
//! dispatch happens while it is held. A flush therefore always completes
//! before any event that arrives after readiness is delivered.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tokio::sync::mpsc;

use crate::{
    config::EventBufferPolicy,
    domain::entities::bridge_event::{BridgeEvent, BridgeEventReceiver},
};

pub struct EventBuffer {
    policy: EventBufferPolicy,
    state: Mutex<BufferState>,
}

#[derive(Default)]
struct BufferState {
    ready: bool,
    pending: VecDeque<BridgeEvent>,
    subscribers: Vec<mpsc::UnboundedSender<BridgeEvent>>,
}

impl BufferState {
    fn dispatch(&mut self, event: BridgeEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl EventBuffer {
    pub fn new(policy: EventBufferPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(BufferState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new subscriber. It receives events dispatched from now on;
    /// buffered events are included once they are flushed.
    pub fn subscribe(&self) -> BridgeEventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().subscribers.push(tx);
        rx
    }

    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    pub fn emit_or_buffer(&self, event: BridgeEvent) {
        let mut state = self.state();
        if state.ready {
            state.dispatch(event);
            return;
        }
        if let EventBufferPolicy::DropOldest { capacity } = self.policy {
            while state.pending.len() >= capacity.max(1) {
                if let Some(dropped) = state.pending.pop_front() {
                    tracing::warn!(
                        event = dropped.name(),
                        capacity,
                        "event buffer full before connection was ready, dropping oldest event"
                    );
                }
            }
        }
        state.pending.push_back(event);
    }

    /// Marks the connection ready and delivers every buffered event, oldest
    /// first. Returns the number of events flushed.
    pub(crate) fn mark_ready_and_flush(&self) -> usize {
        let mut state = self.state();
        state.ready = true;
        let pending = std::mem::take(&mut state.pending);
        let flushed = pending.len();
        for event in pending {
            state.dispatch(event);
        }
        if flushed > 0 {
            tracing::debug!(flushed, "flushed buffered events");
        }
        flushed
    }

    /// Back to not-ready, discarding anything still buffered.
    pub(crate) fn reset(&self) {
        let mut state = self.state();
        state.ready = false;
        let discarded = state.pending.len();
        state.pending.clear();
        if discarded > 0 {
            tracing::debug!(discarded, "discarded buffered events");
        }
    }
}
