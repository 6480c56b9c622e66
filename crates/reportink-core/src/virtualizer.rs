//! Viewport virtualization: keeps only visible elements realized.

use crate::element::ElementId;
use crate::geometry::Geometry;
use std::collections::HashSet;

/// Changes to the realized set produced by one recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealizationDelta {
    /// Newly visible; the host creates visuals for these.
    pub added: Vec<ElementId>,
    /// No longer visible or gone; the host destroys their visuals.
    pub removed: Vec<ElementId>,
    /// Still visible; the host refreshes position and size in place.
    pub updated: Vec<ElementId>,
}

impl RealizationDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Expand `viewport` by `buffer` on every side.
pub fn expand_viewport(viewport: Geometry, buffer: f64) -> Geometry {
    let buffer = buffer.max(0.0);
    Geometry::new(
        viewport.x - buffer,
        viewport.y - buffer,
        viewport.width + buffer * 2.0,
        viewport.height + buffer * 2.0,
    )
}

/// Tracks which elements currently have a live visual.
#[derive(Debug, Clone, Default)]
pub struct Virtualizer {
    realized: Vec<ElementId>,
    lookup: HashSet<ElementId>,
}

impl Virtualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Realized ids in source order.
    pub fn realized(&self) -> &[ElementId] {
        &self.realized
    }

    pub fn is_realized(&self, id: ElementId) -> bool {
        self.lookup.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.realized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realized.is_empty()
    }

    fn visible(
        items: impl IntoIterator<Item = (ElementId, Geometry)>,
        viewport: Geometry,
        buffer: f64,
        enabled: bool,
    ) -> Vec<ElementId> {
        let area = expand_viewport(viewport, buffer);
        items
            .into_iter()
            .filter(|(_, geometry)| !enabled || area.intersects(geometry))
            .map(|(id, _)| id)
            .collect()
    }

    /// Diff the realized set against the items visible in `viewport`.
    ///
    /// With virtualization disabled every item is visible, so only items
    /// missing from the source are removed.
    pub fn recompute(
        &mut self,
        items: impl IntoIterator<Item = (ElementId, Geometry)>,
        viewport: Geometry,
        buffer: f64,
        enabled: bool,
    ) -> RealizationDelta {
        let visible = Self::visible(items, viewport, buffer, enabled);
        let next: HashSet<ElementId> = visible.iter().copied().collect();

        let mut delta = RealizationDelta {
            removed: self.realized.iter().copied().filter(|id| !next.contains(id)).collect(),
            ..RealizationDelta::default()
        };
        for &id in &visible {
            if self.lookup.contains(&id) {
                delta.updated.push(id);
            } else {
                delta.added.push(id);
            }
        }

        log::debug!(
            "Virtualizer: {} added, {} removed, {} updated",
            delta.added.len(),
            delta.removed.len(),
            delta.updated.len()
        );
        self.realized = visible;
        self.lookup = next;
        delta
    }

    /// Drop every visual and realize the visible items from scratch, for
    /// when the item source itself was replaced.
    pub fn rebuild(
        &mut self,
        items: impl IntoIterator<Item = (ElementId, Geometry)>,
        viewport: Geometry,
        buffer: f64,
        enabled: bool,
    ) -> RealizationDelta {
        let removed = std::mem::take(&mut self.realized);
        self.lookup.clear();
        let mut delta = self.recompute(items, viewport, buffer, enabled);
        delta.removed = removed;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_outside_element_not_realized() {
        let inside = (Uuid::new_v4(), Geometry::new(10.0, 10.0, 20.0, 20.0));
        let outside = (Uuid::new_v4(), Geometry::new(200.0, 200.0, 10.0, 10.0));
        let mut virtualizer = Virtualizer::new();

        let delta = virtualizer.recompute([inside, outside], Geometry::new(0.0, 0.0, 100.0, 100.0), 0.0, true);
        assert_eq!(delta.added, vec![inside.0]);
        assert!(!virtualizer.is_realized(outside.0));

        let delta = virtualizer.recompute([inside, outside], Geometry::new(150.0, 150.0, 100.0, 100.0), 0.0, true);
        assert_eq!(delta.added, vec![outside.0]);
        assert_eq!(delta.removed, vec![inside.0]);
        assert!(delta.updated.is_empty());

        let delta = virtualizer.recompute([inside, outside], Geometry::new(0.0, 0.0, 100.0, 100.0), 0.0, true);
        assert_eq!(delta.removed, vec![outside.0]);
        assert_eq!(virtualizer.realized(), &[inside.0]);
    }

    #[test]
    fn test_survivors_are_updated_not_recreated() {
        let item = (Uuid::new_v4(), Geometry::new(10.0, 10.0, 20.0, 20.0));
        let mut virtualizer = Virtualizer::new();
        virtualizer.recompute([item], Geometry::new(0.0, 0.0, 100.0, 100.0), 0.0, true);
        let delta = virtualizer.recompute([item], Geometry::new(5.0, 5.0, 100.0, 100.0), 0.0, true);
        assert_eq!(delta.updated, vec![item.0]);
        assert!(delta.added.is_empty());
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn test_buffer_extends_viewport() {
        let item = (Uuid::new_v4(), Geometry::new(120.0, 10.0, 20.0, 20.0));
        let mut virtualizer = Virtualizer::new();
        let viewport = Geometry::new(0.0, 0.0, 100.0, 100.0);
        assert!(virtualizer.recompute([item], viewport, 10.0, true).added.is_empty());
        assert_eq!(virtualizer.recompute([item], viewport, 30.0, true).added, vec![item.0]);
    }

    #[test]
    fn test_disabled_realizes_everything() {
        let near = (Uuid::new_v4(), Geometry::new(0.0, 0.0, 20.0, 20.0));
        let far = (Uuid::new_v4(), Geometry::new(5000.0, 5000.0, 20.0, 20.0));
        let mut virtualizer = Virtualizer::new();
        let viewport = Geometry::new(0.0, 0.0, 100.0, 100.0);

        let delta = virtualizer.recompute([near, far], viewport, 0.0, false);
        assert_eq!(delta.added, vec![near.0, far.0]);

        // Only removal from the source unrealizes.
        let delta = virtualizer.recompute([near], viewport, 0.0, false);
        assert_eq!(delta.removed, vec![far.0]);
        assert_eq!(delta.updated, vec![near.0]);
    }

    #[test]
    fn test_rebuild_recreates() {
        let item = (Uuid::new_v4(), Geometry::new(10.0, 10.0, 20.0, 20.0));
        let mut virtualizer = Virtualizer::new();
        let viewport = Geometry::new(0.0, 0.0, 100.0, 100.0);
        virtualizer.recompute([item], viewport, 0.0, true);

        let delta = virtualizer.rebuild([item], viewport, 0.0, true);
        assert_eq!(delta.removed, vec![item.0]);
        assert_eq!(delta.added, vec![item.0]);
        assert!(delta.updated.is_empty());
    }
}
