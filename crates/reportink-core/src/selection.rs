//! Selected-element set and the box selection state machine.

use crate::element::ElementId;
use crate::events::{EditorEvent, EventQueue};
use crate::geometry::{self, Geometry};
use crate::input::Modifiers;
use crate::store::ElementStore;
use kurbo::Point;

/// Box selection gesture state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Idle,
    Selecting {
        origin: Point,
        current: Point,
        additive: bool,
        /// Set once the box has grown past click size.
        dragged: bool,
        /// Selection when the gesture started, restored on cancel.
        initial: Vec<ElementId>,
    },
}

/// Tracks which elements are selected.
///
/// The selection is an ordered set of ids that is always a subset of the
/// store it was built against. Changes are reported as
/// [`EditorEvent::SelectionChanged`] when a box gesture ends and after each
/// discrete operation, not on every pointer move.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: Vec<ElementId>,
    state: SelectionState,
    pub(crate) events: EventQueue,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> &[ElementId] {
        &self.selected
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting { .. })
    }

    /// Rectangle of the box being dragged, for drawing the rubber band.
    pub fn selection_box(&self) -> Option<Geometry> {
        match &self.state {
            SelectionState::Selecting { origin, current, .. } => Some(Geometry::from_corners(*origin, *current)),
            SelectionState::Idle => None,
        }
    }

    /// Begin a box selection at `point`. Returns `false` if one is already
    /// in progress.
    pub fn start_selection(&mut self, point: Point, modifiers: Modifiers) -> bool {
        if self.is_selecting() {
            return false;
        }
        self.state = SelectionState::Selecting {
            origin: point,
            current: point,
            additive: modifiers.is_additive(),
            dragged: false,
            initial: self.selected.clone(),
        };
        true
    }

    /// Extend the box to `point` and re-derive the selection.
    ///
    /// Plain mode rebuilds the set from the box alone. Additive mode only
    /// appends elements newly touched by the box and never removes any.
    /// A box that has stayed click-sized and hits nothing leaves the
    /// selection untouched.
    pub fn update_selection(&mut self, point: Point, store: &ElementStore) -> bool {
        let SelectionState::Selecting {
            origin,
            current,
            additive,
            dragged,
            ..
        } = &mut self.state
        else {
            return false;
        };
        *current = point;

        let click = geometry::is_click(*origin, point);
        if !click {
            *dragged = true;
        }
        let hits: Vec<ElementId> = store
            .iter()
            .filter(|e| geometry::box_hits(*origin, point, &e.geometry()))
            .map(|e| e.id())
            .collect();
        if hits.is_empty() && click && !*dragged {
            return false;
        }

        let next = if *additive {
            let mut next = self.selected.clone();
            for id in hits {
                if !next.contains(&id) {
                    next.push(id);
                }
            }
            next
        } else {
            hits
        };

        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    /// Finish the box selection and report the resulting set.
    pub fn end_selection(&mut self) -> bool {
        if !self.is_selecting() {
            return false;
        }
        self.state = SelectionState::Idle;
        self.notify();
        true
    }

    /// Abort the box selection, restoring the selection it started from.
    pub fn cancel_selection(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            SelectionState::Selecting { initial, .. } => {
                if initial != self.selected {
                    self.selected = initial;
                    self.notify();
                }
                true
            }
            SelectionState::Idle => false,
        }
    }

    pub fn add_to_selection(&mut self, id: ElementId, store: &ElementStore) -> bool {
        if self.is_selected(id) || !store.contains(id) {
            return false;
        }
        self.selected.push(id);
        self.notify();
        true
    }

    pub fn remove_from_selection(&mut self, id: ElementId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|&s| s != id);
        if self.selected.len() == before {
            return false;
        }
        self.notify();
        true
    }

    pub fn toggle_selection(&mut self, id: ElementId, store: &ElementStore) -> bool {
        if self.is_selected(id) {
            self.remove_from_selection(id)
        } else {
            self.add_to_selection(id, store)
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        self.selected.clear();
        self.notify();
        true
    }

    /// Select every element in store order.
    pub fn select_all(&mut self, store: &ElementStore) -> bool {
        self.replace(store.ids())
    }

    /// Replace the selection, dropping unknown and duplicate ids.
    pub fn set_selection(&mut self, ids: &[ElementId], store: &ElementStore) -> bool {
        let mut next = Vec::with_capacity(ids.len());
        for &id in ids {
            if store.contains(id) && !next.contains(&id) {
                next.push(id);
            }
        }
        self.replace(next)
    }

    /// Point selection of the topmost element under `point`.
    ///
    /// Plain clicks select only the hit element (or clear on a miss);
    /// additive clicks toggle it.
    pub fn select_at(&mut self, point: Point, modifiers: Modifiers, store: &ElementStore) -> Option<ElementId> {
        let hit = store.topmost_at(point);
        match (hit, modifiers.is_additive()) {
            (Some(id), true) => {
                self.toggle_selection(id, store);
            }
            (Some(id), false) => {
                self.replace(vec![id]);
            }
            (None, false) => {
                self.clear_selection();
            }
            (None, true) => {}
        }
        hit
    }

    /// Drop ids that are no longer in the store.
    pub fn retain_existing(&mut self, store: &ElementStore) -> bool {
        let before = self.selected.len();
        self.selected.retain(|&id| store.contains(id));
        if let SelectionState::Selecting { initial, .. } = &mut self.state {
            initial.retain(|&id| store.contains(id));
        }
        if self.selected.len() == before {
            return false;
        }
        self.notify();
        true
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain()
    }

    fn replace(&mut self, next: Vec<ElementId>) -> bool {
        if next == self.selected {
            return false;
        }
        self.selected = next;
        self.notify();
        true
    }

    fn notify(&mut self) {
        log::debug!("Selection changed: {} elements", self.selected.len());
        self.events.push(EditorEvent::SelectionChanged(self.selected.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind};

    fn store_ab() -> (ElementStore, ElementId, ElementId) {
        let a = Element::new(ElementKind::Rectangle, Geometry::new(0.0, 0.0, 50.0, 50.0));
        let b = Element::new(ElementKind::Rectangle, Geometry::new(100.0, 100.0, 50.0, 50.0));
        let (id_a, id_b) = (a.id(), b.id());
        let mut store = ElementStore::new();
        store.add(a);
        store.add(b);
        (store, id_a, id_b)
    }

    #[test]
    fn test_box_selection_grows_and_shrinks() {
        let (store, a, b) = store_ab();
        let mut selection = SelectionManager::new();

        assert!(selection.start_selection(Point::ZERO, Modifiers::NONE));
        selection.update_selection(Point::new(60.0, 60.0), &store);
        assert_eq!(selection.selected(), &[a]);

        selection.update_selection(Point::new(160.0, 160.0), &store);
        assert_eq!(selection.selected(), &[a, b]);

        selection.update_selection(Point::new(10.0, 10.0), &store);
        assert_eq!(selection.selected(), &[a]);

        assert!(selection.drain_events().is_empty());
        assert!(selection.end_selection());
        assert_eq!(selection.drain_events(), vec![EditorEvent::SelectionChanged(vec![a])]);
        assert!(!selection.is_selecting());
    }

    #[test]
    fn test_additive_box_keeps_existing() {
        let (store, a, b) = store_ab();
        let mut selection = SelectionManager::new();
        selection.add_to_selection(b, &store);

        selection.start_selection(Point::new(-5.0, -5.0), Modifiers::ctrl());
        selection.update_selection(Point::new(20.0, 20.0), &store);
        assert_eq!(selection.selected(), &[b, a]);

        // Shrinking the box away from a keeps it.
        selection.update_selection(Point::new(-4.0, 30.0), &store);
        assert_eq!(selection.selected(), &[b, a]);
        selection.end_selection();
        assert_eq!(selection.selected(), &[b, a]);
    }

    #[test]
    fn test_box_shrunk_back_to_click_size_selects_nothing() {
        let (store, a, _) = store_ab();
        let mut selection = SelectionManager::new();

        selection.start_selection(Point::new(55.0, 55.0), Modifiers::NONE);
        selection.update_selection(Point::new(10.0, 10.0), &store);
        assert_eq!(selection.selected(), &[a]);

        assert!(selection.update_selection(Point::new(56.0, 56.0), &store));
        assert!(selection.is_empty());
        selection.end_selection();
        assert_eq!(selection.drain_events(), vec![EditorEvent::SelectionChanged(vec![])]);
    }

    #[test]
    fn test_click_on_empty_space_is_noop() {
        let (store, _, b) = store_ab();
        let mut selection = SelectionManager::new();
        selection.add_to_selection(b, &store);
        selection.drain_events();

        selection.start_selection(Point::new(300.0, 300.0), Modifiers::NONE);
        assert!(!selection.update_selection(Point::new(301.0, 301.0), &store));
        assert_eq!(selection.selected(), &[b]);
    }

    #[test]
    fn test_click_inside_selects() {
        let (store, a, _) = store_ab();
        let mut selection = SelectionManager::new();
        selection.start_selection(Point::new(10.0, 10.0), Modifiers::NONE);
        selection.update_selection(Point::new(11.0, 10.0), &store);
        assert_eq!(selection.selected(), &[a]);
    }

    #[test]
    fn test_box_inside_element_selects_it() {
        let (store, a, _) = store_ab();
        let mut selection = SelectionManager::new();
        selection.start_selection(Point::new(10.0, 10.0), Modifiers::NONE);
        selection.update_selection(Point::new(20.0, 20.0), &store);
        assert_eq!(selection.selected(), &[a]);
    }

    #[test]
    fn test_start_while_selecting_is_refused() {
        let mut selection = SelectionManager::new();
        assert!(selection.start_selection(Point::ZERO, Modifiers::NONE));
        assert!(!selection.start_selection(Point::new(5.0, 5.0), Modifiers::NONE));
    }

    #[test]
    fn test_cancel_restores_initial() {
        let (store, a, b) = store_ab();
        let mut selection = SelectionManager::new();
        selection.add_to_selection(b, &store);
        selection.drain_events();

        selection.start_selection(Point::ZERO, Modifiers::NONE);
        selection.update_selection(Point::new(60.0, 60.0), &store);
        assert_eq!(selection.selected(), &[a]);

        assert!(selection.cancel_selection());
        assert_eq!(selection.selected(), &[b]);
        assert_eq!(selection.drain_events(), vec![EditorEvent::SelectionChanged(vec![b])]);
    }

    #[test]
    fn test_discrete_operations() {
        let (store, a, b) = store_ab();
        let mut selection = SelectionManager::new();

        assert!(selection.add_to_selection(a, &store));
        assert!(!selection.add_to_selection(a, &store));
        assert!(!selection.add_to_selection(uuid::Uuid::new_v4(), &store));
        assert!(selection.toggle_selection(b, &store));
        assert_eq!(selection.selected(), &[a, b]);
        assert!(selection.toggle_selection(a, &store));
        assert_eq!(selection.selected(), &[b]);
        assert!(selection.remove_from_selection(b));
        assert!(!selection.remove_from_selection(b));
        assert!(!selection.clear_selection());

        assert!(selection.select_all(&store));
        assert_eq!(selection.len(), 2);
        assert!(selection.clear_selection());
        assert!(selection.is_empty());
        assert_eq!(selection.drain_events().len(), 6);
    }

    #[test]
    fn test_set_selection_filters() {
        let (store, a, b) = store_ab();
        let mut selection = SelectionManager::new();
        let ghost = uuid::Uuid::new_v4();
        selection.set_selection(&[b, ghost, a, b], &store);
        assert_eq!(selection.selected(), &[b, a]);
    }

    #[test]
    fn test_select_at() {
        let (store, a, b) = store_ab();
        let mut selection = SelectionManager::new();

        assert_eq!(selection.select_at(Point::new(10.0, 10.0), Modifiers::NONE, &store), Some(a));
        assert_eq!(selection.select_at(Point::new(110.0, 110.0), Modifiers::shift(), &store), Some(b));
        assert_eq!(selection.selected(), &[a, b]);

        // Additive miss keeps, plain miss clears.
        selection.select_at(Point::new(500.0, 500.0), Modifiers::shift(), &store);
        assert_eq!(selection.len(), 2);
        selection.select_at(Point::new(500.0, 500.0), Modifiers::NONE, &store);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_existing() {
        let (mut store, a, b) = store_ab();
        let mut selection = SelectionManager::new();
        selection.select_all(&store);
        store.remove(a);
        assert!(selection.retain_existing(&store));
        assert_eq!(selection.selected(), &[b]);
        assert!(!selection.retain_existing(&store));
    }
}
