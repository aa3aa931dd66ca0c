//! Core event types and the subscription bus.
//!
//! Both the dashboard composer and the workflow session manager notify
//! external listeners (UI, analytics) through [`EventBus`] so that neither
//! is coupled to its consumers. Listeners subscribe per [`EventKind`] and
//! receive a shared reference to the emitted [`Event`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::workflow::{PhotoAttachment, StepDirection, VisitSession, VisitStep};

/// High-level events published by the dashboard and workflow components.
#[derive(Debug, Clone)]
pub enum Event {
    /// The dashboard finished its initial composition.
    Composed {
        /// Visible module ids, in render (priority) order.
        module_ids: Vec<String>,
    },
    /// A background refresh produced a structurally different payload.
    ModuleDataChanged { module_id: String, payload: Value },
    /// A single module view was re-rendered in place.
    ModuleRendered { module_id: String },
    /// An in-progress session was adopted during startup recovery.
    SessionLoaded { session: VisitSession },
    /// A new visit session was started.
    SessionStarted { session: VisitSession },
    /// A step payload was saved.
    StepSaved {
        session_id: String,
        step: VisitStep,
    },
    /// Navigation moved the current step.
    StepChanged {
        session_id: String,
        step: VisitStep,
        direction: StepDirection,
    },
    /// A photo attachment was added.
    PhotoAdded {
        session_id: String,
        photo: PhotoAttachment,
    },
    /// The active session was completed.
    SessionCompleted { session: VisitSession },
    /// The active session was cancelled.
    SessionCancelled {
        session: VisitSession,
        reason: String,
    },
}

impl Event {
    /// Returns the kind used for subscription dispatch.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Composed { .. } => EventKind::Composed,
            Event::ModuleDataChanged { .. } => EventKind::ModuleDataChanged,
            Event::ModuleRendered { .. } => EventKind::ModuleRendered,
            Event::SessionLoaded { .. } => EventKind::SessionLoaded,
            Event::SessionStarted { .. } => EventKind::SessionStarted,
            Event::StepSaved { .. } => EventKind::StepSaved,
            Event::StepChanged { .. } => EventKind::StepChanged,
            Event::PhotoAdded { .. } => EventKind::PhotoAdded,
            Event::SessionCompleted { .. } => EventKind::SessionCompleted,
            Event::SessionCancelled { .. } => EventKind::SessionCancelled,
        }
    }
}

/// Discriminant of [`Event`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Composed,
    ModuleDataChanged,
    ModuleRendered,
    SessionLoaded,
    SessionStarted,
    StepSaved,
    StepChanged,
    PhotoAdded,
    SessionCompleted,
    SessionCancelled,
}

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(SubscriptionId, Callback)>>,
}

/// A minimal publish/subscribe bus.
///
/// Emission snapshots the subscriber list before invoking callbacks, so a
/// callback may subscribe or unsubscribe without deadlocking the bus.
#[derive(Default)]
pub struct EventBus {
    state: Mutex<BusState>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for one event kind.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state
            .listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Removes a previously registered callback. Unknown ids are ignored.
    pub fn off(&self, kind: EventKind, id: SubscriptionId) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(listeners) = state.listeners.get_mut(&kind) {
            listeners.retain(|(sub_id, _)| *sub_id != id);
        }
    }

    /// Delivers an event to every subscriber of its kind.
    pub fn emit(&self, event: Event) {
        let callbacks: Vec<Callback> = {
            let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            state
                .listeners
                .get(&event.kind())
                .map(|listeners| listeners.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };

        for callback in callbacks {
            callback(&event);
        }
    }
}
