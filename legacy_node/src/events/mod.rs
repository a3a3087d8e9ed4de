//! Ledger notifications
//! Append-only record of what the ledger did, plus optional listeners

use crate::common::Hash;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification emitted after a successful state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LegacyEvent {
    Created {
        key: Hash,
        owner_id: u64,
        content_ref: String,
        rules: String,
    },
    Unlocked {
        key: Hash,
        owner_id: u64,
    },
}

impl LegacyEvent {
    pub fn key(&self) -> &Hash {
        match self {
            LegacyEvent::Created { key, .. } | LegacyEvent::Unlocked { key, .. } => key,
        }
    }

    pub fn owner_id(&self) -> u64 {
        match self {
            LegacyEvent::Created { owner_id, .. } | LegacyEvent::Unlocked { owner_id, .. } => {
                *owner_id
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LegacyEvent::Created { .. } => "created",
            LegacyEvent::Unlocked { .. } => "unlocked",
        }
    }
}

type Listener = Box<dyn Fn(&LegacyEvent) + Send + Sync>;

/// Append-only event log with listener callbacks
#[derive(Default)]
pub struct EventLog {
    events: Vec<LegacyEvent>,
    listeners: Vec<Listener>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked on every subsequent emission
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&LegacyEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Append an event and notify listeners in registration order
    pub fn emit(&mut self, event: LegacyEvent) {
        debug!("Emitting {} event for {}", event.name(), event.key());
        for listener in &self.listeners {
            listener(&event);
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[LegacyEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&LegacyEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand all buffered events to the caller, leaving listeners in place
    pub fn drain(&mut self) -> Vec<LegacyEvent> {
        std::mem::take(&mut self.events)
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.events)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
