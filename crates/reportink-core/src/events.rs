//! Change notifications emitted by the editor.
//!
//! The engine never calls back into the host. Components push events into
//! an [`EventQueue`] and the host drains it after each input event, the same
//! way sync events are polled from the collaboration client.

use crate::element::ElementId;
use std::collections::VecDeque;

/// Events observable by the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The selection set changed; carries the full ordered set.
    SelectionChanged(Vec<ElementId>),
    /// The undo or redo stack changed.
    HistoryChanged,
    /// The realized (visible) element set changed.
    ElementsRealized {
        added: Vec<ElementId>,
        removed: Vec<ElementId>,
        updated: Vec<ElementId>,
    },
    /// Element data changed (geometry, properties, membership).
    ElementsChanged(Vec<ElementId>),
}

/// FIFO of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: VecDeque<EditorEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EditorEvent) {
        // Consecutive history notifications carry no extra information.
        if event == EditorEvent::HistoryChanged && self.pending.back() == Some(&EditorEvent::HistoryChanged) {
            return;
        }
        self.pending.push_back(event);
    }

    pub fn extend(&mut self, other: &mut EventQueue) {
        while let Some(event) = other.pending.pop_front() {
            self.push(event);
        }
    }

    pub fn drain(&mut self) -> Vec<EditorEvent> {
        self.pending.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
