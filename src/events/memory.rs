//! In-memory validation event log.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{EventStore, EventStoreError};
use crate::models::ValidationEvent;

/// Bounded FIFO event log held in process memory.
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<VecDeque<ValidationEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, event: &ValidationEvent, capacity: usize) -> Result<(), EventStoreError> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push_back(event.clone());
        while events.len() > capacity {
            events.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ValidationEvent>, EventStoreError> {
        let events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(events.iter().rev().take(limit).cloned().collect())
    }
}
