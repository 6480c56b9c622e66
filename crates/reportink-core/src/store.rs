//! Ordered element storage for the active document.

use crate::element::{Element, ElementId};
use kurbo::Point;

/// Owns the authoritative list of editable elements.
///
/// Store order is insertion order and is the iteration order used by
/// snapping and box selection. Lookups are linear scans; documents are
/// expected to hold at most a few hundred elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Append an element at the end of the store.
    pub fn add(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Insert an element at `index` (clamped to the current length).
    pub fn insert(&mut self, index: usize, element: Element) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
    }

    /// Remove an element, returning it together with its former position.
    pub fn remove(&mut self, id: ElementId) -> Option<(usize, Element)> {
        let index = self.position(id)?;
        Some((index, self.elements.remove(index)))
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.position(id).is_some()
    }

    /// Index of an element in store order.
    pub fn position(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(Element::id).collect()
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    pub fn max_z_index(&self) -> Option<i32> {
        self.elements.iter().map(|e| e.z_index).max()
    }

    pub fn min_z_index(&self) -> Option<i32> {
        self.elements.iter().map(|e| e.z_index).min()
    }

    /// Z-index for a newly added element: max + 1, or 1 for an empty store.
    pub fn next_z_index(&self) -> i32 {
        self.max_z_index().map_or(1, |z| z.saturating_add(1))
    }

    /// Elements sorted back to front: by z-index, then by store position.
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        // sort_by_key is stable, so equal z-indices keep store order.
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    /// Frontmost element containing `point`.
    pub fn topmost_at(&self, point: Point) -> Option<ElementId> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|e| e.geometry().contains(point))
            .map(Element::id)
    }
}
