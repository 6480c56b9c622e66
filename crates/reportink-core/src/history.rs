//! Snapshot-based undo/redo history.
//!
//! Every user-visible mutation is recorded as a [`Command`] carrying the
//! state of the affected elements *before* the mutation. The state *after*
//! the mutation is captured lazily, at the moment the command is undone, so
//! recording a command never has to clone the store.

use crate::element::{Element, ElementId};
use crate::error::HistoryError;
use crate::events::{EditorEvent, EventQueue};
use crate::store::ElementStore;
use serde_json::Value;
use std::collections::VecDeque;

/// Maximum number of undo steps kept by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// What a command did to its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Add,
    Remove,
    Move,
    Resize,
    PropertyChange,
    ZOrder,
    Alignment,
}

/// How a command is reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Add,
    Remove,
    Geometry,
    Property,
}

impl CommandKind {
    fn family(self) -> Family {
        match self {
            CommandKind::Add => Family::Add,
            CommandKind::Remove => Family::Remove,
            CommandKind::Move | CommandKind::Resize | CommandKind::ZOrder | CommandKind::Alignment => {
                Family::Geometry
            }
            CommandKind::PropertyChange => Family::Property,
        }
    }
}

/// Full state of one element at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSnapshot {
    pub element: Element,
    /// Store position at capture time, used to re-insert removed elements.
    pub position: Option<usize>,
}

impl ElementSnapshot {
    /// Snapshot an element that is not (or no longer) tracked by a store.
    pub fn of(element: &Element) -> Self {
        Self {
            element: element.clone(),
            position: None,
        }
    }

    /// Snapshot an element as it currently is in the store.
    pub fn capture(store: &ElementStore, id: ElementId) -> Option<Self> {
        let position = store.position(id)?;
        Some(Self {
            element: store.as_slice()[position].clone(),
            position: Some(position),
        })
    }

    /// Snapshot every id present in the store, skipping unknown ids.
    pub fn capture_all(store: &ElementStore, ids: &[ElementId]) -> Vec<Self> {
        ids.iter().filter_map(|&id| Self::capture(store, id)).collect()
    }

    pub fn id(&self) -> ElementId {
        self.element.id()
    }
}

/// A reversible record of one mutating operation.
#[derive(Debug, Clone)]
pub struct Command {
    pub kind: CommandKind,
    pub description: String,
    pub element_ids: Vec<ElementId>,
    pub before: Vec<ElementSnapshot>,
    /// Filled when the command is undone.
    pub after: Option<Vec<ElementSnapshot>>,
    pub metadata: Option<Value>,
}

impl Command {
    fn new(kind: CommandKind, description: String, before: Vec<ElementSnapshot>, metadata: Option<Value>) -> Self {
        Self {
            kind,
            description,
            element_ids: before.iter().map(ElementSnapshot::id).collect(),
            before,
            after: None,
            metadata,
        }
    }

    fn require_present(&self, store: &ElementStore) -> Result<(), HistoryError> {
        match self.element_ids.iter().find(|&&id| !store.contains(id)) {
            Some(&id) => Err(HistoryError::MissingElement(id)),
            None => Ok(()),
        }
    }

    fn require_absent(&self, store: &ElementStore) -> Result<(), HistoryError> {
        match self.element_ids.iter().find(|&&id| store.contains(id)) {
            Some(&id) => Err(HistoryError::AlreadyPresent(id)),
            None => Ok(()),
        }
    }

    /// Revert the command, capturing the current state as "after" first.
    ///
    /// Validation runs before any mutation so a failure leaves the store
    /// untouched.
    fn revert(&mut self, store: &mut ElementStore) -> Result<(), HistoryError> {
        match self.kind.family() {
            Family::Add => {
                self.require_present(store)?;
                self.after = Some(ElementSnapshot::capture_all(store, &self.element_ids));
                for &id in &self.element_ids {
                    store.remove(id);
                }
            }
            Family::Remove => {
                self.require_absent(store)?;
                self.after = Some(Vec::new());
                insert_snapshots(store, &self.before);
            }
            Family::Geometry => {
                self.require_present(store)?;
                self.after = Some(ElementSnapshot::capture_all(store, &self.element_ids));
                restore_geometry(store, &self.before);
            }
            Family::Property => {
                self.require_present(store)?;
                self.after = Some(ElementSnapshot::capture_all(store, &self.element_ids));
                restore_properties(store, &self.before);
            }
        }
        Ok(())
    }

    /// Re-apply the command, re-capturing "before" from the current state.
    fn reapply(&mut self, store: &mut ElementStore) -> Result<(), HistoryError> {
        match self.kind.family() {
            Family::Add => {
                self.require_absent(store)?;
                let after = self.after.as_ref().ok_or(HistoryError::MissingAfterState)?;
                let source = if after.is_empty() { &self.before } else { after };
                insert_snapshots(store, source);
            }
            Family::Remove => {
                self.require_present(store)?;
                self.before = ElementSnapshot::capture_all(store, &self.element_ids);
                for &id in &self.element_ids {
                    store.remove(id);
                }
            }
            Family::Geometry => {
                self.require_present(store)?;
                let after = self.after.as_ref().ok_or(HistoryError::MissingAfterState)?;
                self.before = ElementSnapshot::capture_all(store, &self.element_ids);
                restore_geometry(store, after);
            }
            Family::Property => {
                self.require_present(store)?;
                let after = self.after.as_ref().ok_or(HistoryError::MissingAfterState)?;
                self.before = ElementSnapshot::capture_all(store, &self.element_ids);
                restore_properties(store, after);
            }
        }
        Ok(())
    }
}

fn insert_snapshots(store: &mut ElementStore, snapshots: &[ElementSnapshot]) {
    // Ascending positions reproduce the original ordering.
    let mut ordered: Vec<&ElementSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.position.unwrap_or(usize::MAX));
    for snapshot in ordered {
        match snapshot.position {
            Some(position) => store.insert(position, snapshot.element.clone()),
            None => store.add(snapshot.element.clone()),
        }
    }
}

fn restore_geometry(store: &mut ElementStore, snapshots: &[ElementSnapshot]) {
    for snapshot in snapshots {
        if let Some(element) = store.get_mut(snapshot.id()) {
            element.set_geometry(snapshot.element.geometry());
            element.z_index = snapshot.element.z_index;
        }
    }
}

fn restore_properties(store: &mut ElementStore, snapshots: &[ElementSnapshot]) {
    for snapshot in snapshots {
        if let Some(element) = store.get_mut(snapshot.id()) {
            element.name = snapshot.element.name.clone();
            element.properties = snapshot.element.properties.clone();
            element.value = snapshot.element.value.clone();
            element.edit_state = snapshot.element.edit_state;
        }
    }
}

/// Bounded linear undo/redo history.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    capacity: usize,
    pub(crate) events: EventQueue,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create a history keeping at most `capacity` undo steps (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
            events: EventQueue::new(),
        }
    }

    /// Record a finalized operation.
    ///
    /// `before` holds the affected elements as they were before the
    /// mutation. Returns `false` without touching either stack when there
    /// is nothing to record.
    pub fn record(
        &mut self,
        kind: CommandKind,
        description: impl Into<String>,
        before: Vec<ElementSnapshot>,
        metadata: Option<Value>,
    ) -> bool {
        if before.is_empty() {
            return false;
        }

        let command = Command::new(kind, description.into(), before, metadata);
        log::debug!("Recording {:?} '{}' ({} elements)", command.kind, command.description, command.element_ids.len());
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        self.trim();
        self.events.push(EditorEvent::HistoryChanged);
        true
    }

    /// Undo the most recent command.
    ///
    /// Returns `false` if there was nothing to undo or the command could not
    /// be applied. A failed command is dropped from the history.
    pub fn undo(&mut self, store: &mut ElementStore) -> bool {
        let Some(mut command) = self.undo_stack.pop_back() else {
            return false;
        };

        let result = command.revert(store);
        self.events.push(EditorEvent::HistoryChanged);
        match result {
            Ok(()) => {
                log::debug!("Undo '{}'", command.description);
                self.events.push(EditorEvent::ElementsChanged(command.element_ids.clone()));
                self.redo_stack.push(command);
                true
            }
            Err(err) => {
                log::warn!("Undo of '{}' failed, dropping it: {}", command.description, err);
                false
            }
        }
    }

    /// Redo the most recently undone command.
    pub fn redo(&mut self, store: &mut ElementStore) -> bool {
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };

        let result = command.reapply(store);
        self.events.push(EditorEvent::HistoryChanged);
        match result {
            Ok(()) => {
                log::debug!("Redo '{}'", command.description);
                self.events.push(EditorEvent::ElementsChanged(command.element_ids.clone()));
                self.undo_stack.push_back(command);
                self.trim();
                true
            }
            Err(err) => {
                log::warn!("Redo of '{}' failed, dropping it: {}", command.description, err);
                false
            }
        }
    }

    /// Forget every recorded command.
    pub fn clear(&mut self) {
        if self.undo_stack.is_empty() && self.redo_stack.is_empty() {
            return;
        }
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.events.push(EditorEvent::HistoryChanged);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the command `undo` would revert.
    pub fn last_action_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.description.as_str())
    }

    /// Description of the command `redo` would re-apply.
    pub fn next_action_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.description.as_str())
    }

    /// Undo descriptions, newest first.
    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.undo_stack.iter().rev().map(|c| c.description.as_str()).collect()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        if self.trim() {
            self.events.push(EditorEvent::HistoryChanged);
        }
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain()
    }

    fn trim(&mut self) -> bool {
        let mut evicted = false;
        while self.undo_stack.len() > self.capacity {
            if let Some(oldest) = self.undo_stack.pop_front() {
                log::debug!("History full, evicting '{}'", oldest.description);
                evicted = true;
            }
        }
        evicted
    }
}
