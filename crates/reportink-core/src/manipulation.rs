//! Drag and resize gesture controllers.
//!
//! Controllers never touch the store directly. They capture the original
//! state on press, compute candidate geometries on every move, and hand the
//! original snapshots back on release so the caller can record one command
//! for the whole gesture.

use crate::element::{ElementId, MIN_ELEMENT_HEIGHT, MIN_ELEMENT_WIDTH};
use crate::error::{EditorError, EditorResult};
use crate::geometry::{self, Geometry};
use crate::handles::HandleKind;
use crate::history::ElementSnapshot;
use crate::snap::{self, SnapEngine};
use crate::store::ElementStore;
use kurbo::{Point, Size, Vec2};

/// Limits applied to every candidate geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    /// Grid spacing; 0 disables grid snapping.
    pub grid_size: f64,
    /// Area elements must stay inside, if any.
    pub container: Option<Size>,
    /// Margin kept from the container edges.
    pub padding: f64,
    pub min_width: f64,
    pub min_height: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            grid_size: 0.0,
            container: None,
            padding: 0.0,
            min_width: MIN_ELEMENT_WIDTH,
            min_height: MIN_ELEMENT_HEIGHT,
        }
    }
}

impl Constraints {
    pub fn with_grid(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_container(mut self, container: Size, padding: f64) -> Self {
        self.container = Some(container);
        self.padding = padding;
        self
    }

    /// Keep `geometry` inside the container, if one is set.
    pub fn clamp_to_bounds(&self, geometry: Geometry) -> Geometry {
        match self.container {
            Some(container) => geometry::clamp_to_container(geometry, container, self.padding),
            None => geometry,
        }
    }

    /// Pull the edges `handle` moves back inside the container. The fixed
    /// edges stay where they are.
    pub fn clamp_resize_to_bounds(&self, geometry: Geometry, handle: HandleKind) -> Geometry {
        let Some(container) = self.container else {
            return geometry;
        };
        let (mut left, mut top) = (geometry.x, geometry.y);
        let (mut right, mut bottom) = (geometry.right(), geometry.bottom());
        if handle.moves_left() {
            left = left.max(self.padding).min(right);
        }
        if handle.moves_right() {
            right = right.min(container.width - self.padding).max(left);
        }
        if handle.moves_top() {
            top = top.max(self.padding).min(bottom);
        }
        if handle.moves_bottom() {
            bottom = bottom.min(container.height - self.padding).max(top);
        }
        Geometry::new(left, top, right - left, bottom - top)
    }
}

/// Optional snap-while-dragging source.
pub type SnapSource<'a> = Option<(&'a mut SnapEngine, &'a ElementStore)>;

/// An in-progress drag.
#[derive(Debug, Clone)]
pub struct DragGesture {
    pub start_point: Point,
    pub current_point: Point,
    /// Element under the pointer; snapping is computed for it.
    pub anchor: ElementId,
    /// Every dragged element as it was on press.
    pub originals: Vec<ElementSnapshot>,
}

impl DragGesture {
    pub fn ids(&self) -> Vec<ElementId> {
        self.originals.iter().map(ElementSnapshot::id).collect()
    }

    fn anchor_geometry(&self) -> Option<Geometry> {
        self.originals
            .iter()
            .find(|s| s.id() == self.anchor)
            .map(|s| s.element.geometry())
    }
}

/// Moves one or more elements by the pointer delta.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    gesture: Option<DragGesture>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn gesture(&self) -> Option<&DragGesture> {
        self.gesture.as_ref()
    }

    /// Start dragging `ids` with `anchor` under the pointer.
    ///
    /// Read-only elements among `ids` stay where they are; a read-only
    /// anchor refuses the gesture.
    pub fn begin(&mut self, point: Point, anchor: ElementId, ids: &[ElementId], store: &ElementStore) -> EditorResult<()> {
        if self.is_active() {
            return Err(EditorError::GestureActive);
        }
        let element = store.get(anchor).ok_or(EditorError::ElementNotFound(anchor))?;
        if !element.can_move() {
            return Err(EditorError::ReadOnly(anchor));
        }

        let mut targets: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| store.get(id).is_some_and(|e| e.can_move()))
            .collect();
        if !targets.contains(&anchor) {
            targets.insert(0, anchor);
        }

        log::debug!("Drag started with {} elements", targets.len());
        self.gesture = Some(DragGesture {
            start_point: point,
            current_point: point,
            anchor,
            originals: ElementSnapshot::capture_all(store, &targets),
        });
        Ok(())
    }

    /// Compute the geometry of every dragged element for pointer `point`.
    ///
    /// The anchor is moved by the raw delta, then snapped (grid or snap
    /// engine); every element follows the anchor's effective delta and is
    /// clamped to the container.
    pub fn update(&mut self, point: Point, constraints: &Constraints, snap: SnapSource<'_>) -> Vec<(ElementId, Geometry)> {
        let Some(gesture) = self.gesture.as_mut() else {
            return Vec::new();
        };
        gesture.current_point = point;
        let Some(anchor) = gesture.anchor_geometry() else {
            return Vec::new();
        };

        let candidate = anchor.translated(point - gesture.start_point);
        let snapped = match snap {
            Some((engine, store)) => engine.suggest(candidate, &gesture.ids(), store).geometry,
            None => Geometry {
                x: snap::snap_value(candidate.x, constraints.grid_size),
                y: snap::snap_value(candidate.y, constraints.grid_size),
                ..candidate
            },
        };
        let delta: Vec2 = snapped.origin() - anchor.origin();

        gesture
            .originals
            .iter()
            .map(|s| (s.id(), constraints.clamp_to_bounds(s.element.geometry().translated(delta))))
            .collect()
    }

    /// Finish the drag, returning the original snapshots.
    pub fn release(&mut self) -> Option<Vec<ElementSnapshot>> {
        self.gesture.take().map(|g| g.originals)
    }

    /// Abort without producing a command.
    pub fn cancel(&mut self) -> bool {
        self.gesture.take().is_some()
    }
}

/// An in-progress resize.
#[derive(Debug, Clone)]
pub struct ResizeGesture {
    pub start_point: Point,
    pub current_point: Point,
    pub handle: HandleKind,
    pub original: ElementSnapshot,
}

/// Resizes one element through one of its eight handles.
#[derive(Debug, Clone, Default)]
pub struct ResizeController {
    gesture: Option<ResizeGesture>,
}

/// Move the edges selected by `handle` by `delta`, keeping the others fixed.
pub fn project_resize(original: Geometry, handle: HandleKind, delta: Vec2) -> Geometry {
    let (mut left, mut top) = (original.x, original.y);
    let (mut right, mut bottom) = (original.right(), original.bottom());
    if handle.moves_left() {
        left += delta.x;
    }
    if handle.moves_right() {
        right += delta.x;
    }
    if handle.moves_top() {
        top += delta.y;
    }
    if handle.moves_bottom() {
        bottom += delta.y;
    }
    Geometry::new(left, top, right - left, bottom - top)
}

/// Enforce the minimum size, growing away from the fixed edge.
pub fn enforce_min_size(geometry: Geometry, handle: HandleKind, min_width: f64, min_height: f64) -> Geometry {
    let mut result = geometry;
    if result.width < min_width {
        if handle.moves_left() {
            result.x = geometry.right() - min_width;
        }
        result.width = min_width;
    }
    if result.height < min_height {
        if handle.moves_top() {
            result.y = geometry.bottom() - min_height;
        }
        result.height = min_height;
    }
    result
}

impl ResizeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn gesture(&self) -> Option<&ResizeGesture> {
        self.gesture.as_ref()
    }

    /// Start resizing `id` through `handle`. Locked and read-only elements
    /// refuse the gesture.
    pub fn begin(&mut self, point: Point, id: ElementId, handle: HandleKind, store: &ElementStore) -> EditorResult<()> {
        if self.is_active() {
            return Err(EditorError::GestureActive);
        }
        let original = ElementSnapshot::capture(store, id).ok_or(EditorError::ElementNotFound(id))?;
        if !original.element.can_resize() {
            return Err(EditorError::Locked(id));
        }

        log::debug!("Resize started on {:?}", handle);
        self.gesture = Some(ResizeGesture {
            start_point: point,
            current_point: point,
            handle,
            original,
        });
        Ok(())
    }

    /// Compute the resized geometry for pointer `point`.
    ///
    /// Order: project the delta, snap, enforce the minimum size, clamp to
    /// the container.
    pub fn update(&mut self, point: Point, constraints: &Constraints, snap: SnapSource<'_>) -> Option<(ElementId, Geometry)> {
        let gesture = self.gesture.as_mut()?;
        gesture.current_point = point;

        let id = gesture.original.id();
        let projected = project_resize(gesture.original.element.geometry(), gesture.handle, point - gesture.start_point);
        let snapped = match snap {
            Some((engine, store)) => engine.suggest_resize(projected, gesture.handle, &[id], store).geometry,
            None => snap::snap_geometry_to_grid(projected, constraints.grid_size),
        };
        let sized = enforce_min_size(snapped, gesture.handle, constraints.min_width, constraints.min_height);
        Some((id, constraints.clamp_resize_to_bounds(sized, gesture.handle)))
    }

    /// Finish the resize, returning the original snapshot.
    pub fn release(&mut self) -> Option<ElementSnapshot> {
        self.gesture.take().map(|g| g.original)
    }

    pub fn cancel(&mut self) -> bool {
        self.gesture.take().is_some()
    }
}
