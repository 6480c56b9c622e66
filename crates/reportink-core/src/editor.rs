//! Editor facade: one instance of every editing component for an open
//! document.
//!
//! All mutation goes through [`Editor`]. Each operation updates the store,
//! records a command where the change is user-visible, keeps the selection
//! and realized set consistent, and queues [`EditorEvent`]s that the host
//! drains with [`Editor::drain_events`].

use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::element::{EditState, Element, ElementId, ElementKind};
use crate::error::{ConfigError, EditorError, EditorResult};
use crate::events::{EditorEvent, EventQueue};
use crate::geometry::{self, Alignment, Distribution, Geometry, SizeMatch};
use crate::handles::{self, Handle, HandleKind, HANDLE_HIT_TOLERANCE};
use crate::history::{CommandKind, ElementSnapshot, History};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::manipulation::{Constraints, DragController, ResizeController};
use crate::selection::SelectionManager;
use crate::snap::{self, SnapEngine, SnapGuide, SnapMode};
use crate::store::ElementStore;
use crate::throttle::{FrameThrottle, Instant};
use crate::virtualizer::Virtualizer;
use kurbo::{Point, Size, Vec2};
use serde_json::Value;
use std::time::Duration;

/// Which gesture the pointer is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PointerMode {
    #[default]
    Idle,
    BoxSelect,
    Drag,
    Resize,
}

/// Interactive layout editor for one document.
#[derive(Debug)]
pub struct Editor {
    /// Document metadata; its element list lives in `store` while editing.
    document: Document,
    store: ElementStore,
    history: History,
    selection: SelectionManager,
    drag: DragController,
    resize: ResizeController,
    snap: SnapEngine,
    camera: Camera,
    screen_size: Option<Size>,
    viewport: Geometry,
    virtualizer: Virtualizer,
    throttle: FrameThrottle,
    config: EditorConfig,
    events: EventQueue,
    pointer: PointerMode,
    /// Geometry changed during a gesture without recomputing the realized
    /// set; the next tick or gesture end catches up.
    realization_stale: bool,
}

fn page_geometry(document: &Document) -> Geometry {
    let size = document.display_size();
    Geometry::new(0.0, 0.0, size.width, size.height)
}

fn describe_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "Align left",
        Alignment::Right => "Align right",
        Alignment::Top => "Align top",
        Alignment::Bottom => "Align bottom",
        Alignment::CenterHorizontal => "Align centers horizontally",
        Alignment::CenterVertical => "Align centers vertically",
    }
}

impl Editor {
    /// Open `document` with the default configuration.
    pub fn new(document: Document) -> Self {
        Self::open(document, EditorConfig::default())
    }

    /// Open `document` with `config`, rejecting out-of-range settings.
    pub fn with_config(document: Document, config: EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::open(document, config))
    }

    fn open(mut document: Document, config: EditorConfig) -> Self {
        let elements = std::mem::take(&mut document.elements);
        log::info!("Opening document '{}' with {} elements", document.name, elements.len());

        let mut editor = Self {
            viewport: page_geometry(&document),
            document,
            store: ElementStore::from_elements(elements),
            history: History::new(config.history_capacity),
            selection: SelectionManager::new(),
            drag: DragController::new(),
            resize: ResizeController::new(),
            snap: SnapEngine::new(config.snap_mode, config.grid_size, config.snap_distance),
            camera: Camera::new().with_dpi(config.dpi),
            screen_size: None,
            virtualizer: Virtualizer::new(),
            throttle: FrameThrottle::new(Duration::from_millis(config.frame_interval_ms)),
            config,
            events: EventQueue::new(),
            pointer: PointerMode::Idle,
            realization_stale: false,
        };
        editor.rebuild_realization();
        editor
    }

    /// Snapshot of the document including the current elements.
    pub fn document(&self) -> Document {
        let mut document = self.document.clone();
        document.elements = self.store.as_slice().to_vec();
        document
    }

    /// Close the editor and hand the document back.
    pub fn into_document(self) -> Document {
        let mut document = self.document;
        document.elements = self.store.into_elements();
        document
    }

    /// Replace the open document. History and selection are reset.
    pub fn load_document(&mut self, mut document: Document) {
        self.cancel_gesture();
        self.store = ElementStore::from_elements(std::mem::take(&mut document.elements));
        log::info!("Loaded document '{}' with {} elements", document.name, self.store.len());
        self.viewport = page_geometry(&document);
        self.document = document;
        self.history.clear();
        self.selection.clear_selection();
        // The rebuild below covers any viewport change still waiting for a frame.
        self.throttle.cancel();
        self.rebuild_realization();
        self.sync_events();
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.store.get(id)
    }

    pub fn elements(&self) -> &[Element] {
        self.store.as_slice()
    }

    pub fn fixed_elements(&self) -> &[Element] {
        &self.document.fixed_elements
    }

    pub fn selection(&self) -> &[ElementId] {
        self.selection.selected()
    }

    pub fn selection_box(&self) -> Option<Geometry> {
        self.selection.selection_box()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Geometry {
        self.viewport
    }

    /// Ids that currently have a live visual.
    pub fn realized(&self) -> &[ElementId] {
        self.virtualizer.realized()
    }

    /// Alignment guides of the current gesture.
    pub fn snap_guides(&self) -> &[SnapGuide] {
        self.snap.guides()
    }

    pub fn set_snap_mode(&mut self, mode: SnapMode) {
        self.config.snap_mode = mode;
        self.snap.mode = mode;
    }

    /// Switch to the next snap mode: none, grid, elements, all.
    pub fn cycle_snap_mode(&mut self) -> SnapMode {
        let mode = self.config.snap_mode.next();
        self.set_snap_mode(mode);
        mode
    }

    /// Resize handles to draw around the selected resizable elements.
    pub fn selection_handles(&self) -> Vec<Handle> {
        self.selection
            .selected()
            .iter()
            .filter_map(|&id| self.store.get(id))
            .filter(|e| e.can_resize())
            .flat_map(|e| handles::handles_for(&e.geometry()))
            .collect()
    }

    pub fn set_grid_size(&mut self, grid_size: f64) {
        let grid_size = grid_size.max(0.0);
        self.config.grid_size = grid_size;
        self.snap.grid_size = grid_size;
    }

    /// Take every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.sync_events();
        self.events.drain()
    }

    // --- Internal bookkeeping ---

    fn sync_events(&mut self) {
        self.events.extend(&mut self.history.events);
        self.events.extend(&mut self.selection.events);
    }

    /// Common tail of every mutation.
    fn after_mutation(&mut self, changed: Vec<ElementId>) {
        self.sync_events();
        if !changed.is_empty() {
            self.events.push(EditorEvent::ElementsChanged(changed));
        }
        self.selection.retain_existing(&self.store);
        self.sync_events();
        self.realize();
    }

    fn items(&self) -> Vec<(ElementId, Geometry)> {
        self.store.iter().map(|e| (e.id(), e.geometry())).collect()
    }

    fn push_realization(&mut self, delta: crate::virtualizer::RealizationDelta) {
        if !delta.is_empty() {
            self.events.push(EditorEvent::ElementsRealized {
                added: delta.added,
                removed: delta.removed,
                updated: delta.updated,
            });
        }
    }

    fn realize(&mut self) {
        self.realization_stale = false;
        let items = self.items();
        let delta = self.virtualizer.recompute(
            items,
            self.viewport,
            self.config.viewport_buffer,
            self.config.virtualization_enabled,
        );
        self.push_realization(delta);
    }

    fn rebuild_realization(&mut self) {
        self.realization_stale = false;
        let items = self.items();
        let delta = self.virtualizer.rebuild(
            items,
            self.viewport,
            self.config.viewport_buffer,
            self.config.virtualization_enabled,
        );
        self.push_realization(delta);
    }

    fn constraints(&self) -> Constraints {
        Constraints::default()
            .with_grid(self.config.effective_grid())
            .with_container(self.document.display_size(), self.config.canvas_padding)
    }

    fn require_all(&self, ids: &[ElementId]) -> EditorResult<()> {
        match ids.iter().find(|&&id| !self.store.contains(id)) {
            Some(&id) => Err(EditorError::ElementNotFound(id)),
            None => Ok(()),
        }
    }

    fn describe(&self, verb: &str, ids: &[ElementId]) -> String {
        match ids {
            [id] => match self.store.get(*id) {
                Some(element) => format!("{verb} {}", element.name),
                None => format!("{verb} element"),
            },
            _ => format!("{verb} {} elements", ids.len()),
        }
    }

    /// Apply new geometries and record one command for the ones that
    /// actually changed.
    fn commit_geometry(&mut self, kind: CommandKind, description: String, changes: Vec<(ElementId, Geometry)>) -> bool {
        let ids: Vec<ElementId> = changes.iter().map(|(id, _)| *id).collect();
        let before = ElementSnapshot::capture_all(&self.store, &ids);
        for (id, geometry) in changes {
            if let Some(element) = self.store.get_mut(id) {
                element.set_geometry(geometry);
            }
        }
        self.record_changed(kind, description, before)
    }

    /// Record the snapshots whose geometry or z-index differ from the
    /// store, returning whether anything was recorded.
    fn record_changed(&mut self, kind: CommandKind, description: String, before: Vec<ElementSnapshot>) -> bool {
        let changed: Vec<ElementSnapshot> = before
            .into_iter()
            .filter(|s| {
                self.store
                    .get(s.id())
                    .is_some_and(|e| e.geometry() != s.element.geometry() || e.z_index != s.element.z_index)
            })
            .collect();
        if changed.is_empty() {
            return false;
        }
        let ids: Vec<ElementId> = changed.iter().map(ElementSnapshot::id).collect();
        self.history.record(kind, description, changed, None);
        self.after_mutation(ids);
        true
    }

    /// Selected elements that satisfy `allowed`, in selection order.
    fn selected_where(&self, allowed: impl Fn(&Element) -> bool) -> Vec<(ElementId, Geometry)> {
        self.selection
            .selected()
            .iter()
            .filter_map(|&id| self.store.get(id))
            .filter(|e| allowed(e))
            .map(|e| (e.id(), e.geometry()))
            .collect()
    }

    // --- Element operations ---

    /// Add an element on top of the stack.
    pub fn add_element(&mut self, mut element: Element) -> EditorResult<ElementId> {
        let id = element.id();
        if self.store.contains(id) {
            return Err(EditorError::DuplicateElement(id));
        }
        element.z_index = self.store.next_z_index();
        let description = format!("Add {}", element.name);
        self.store.add(element);

        let snapshot = ElementSnapshot::capture_all(&self.store, &[id]);
        self.history.record(CommandKind::Add, description, snapshot, None);
        self.after_mutation(vec![id]);
        Ok(id)
    }

    /// Create an element of `kind` with its default size at `position`,
    /// snapped to the grid.
    pub fn create_element(&mut self, kind: ElementKind, position: Point) -> EditorResult<ElementId> {
        let position = snap::snap_point(position, self.config.effective_grid());
        self.add_element(Element::at(kind, position))
    }

    /// Remove elements as one undoable step. Returns the number removed.
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> EditorResult<usize> {
        self.require_all(ids)?;
        let mut unique: Vec<ElementId> = Vec::with_capacity(ids.len());
        for &id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            return Ok(0);
        }

        let description = self.describe("Delete", &unique);
        let before = ElementSnapshot::capture_all(&self.store, &unique);
        for &id in &unique {
            self.store.remove(id);
        }
        self.history.record(CommandKind::Remove, description, before, None);
        self.after_mutation(unique.clone());
        Ok(unique.len())
    }

    pub fn remove_selected(&mut self) -> EditorResult<usize> {
        let ids = self.selection.selected().to_vec();
        self.remove_elements(&ids)
    }

    /// Duplicate elements with the configured offset and select the copies.
    pub fn clone_elements(&mut self, ids: &[ElementId]) -> EditorResult<Vec<ElementId>> {
        self.require_all(ids)?;
        let offset = Vec2::new(self.config.clone_offset, self.config.clone_offset);
        let copies: Vec<Element> = ids
            .iter()
            .filter_map(|&id| self.store.get(id))
            .map(|e| e.duplicate(offset))
            .collect();
        if copies.is_empty() {
            return Ok(Vec::new());
        }

        let description = self.describe("Duplicate", ids);
        let mut new_ids = Vec::with_capacity(copies.len());
        for mut copy in copies {
            copy.z_index = self.store.next_z_index();
            new_ids.push(copy.id());
            self.store.add(copy);
        }
        let snapshots = ElementSnapshot::capture_all(&self.store, &new_ids);
        self.history.record(CommandKind::Add, description, snapshots, None);
        self.selection.set_selection(&new_ids, &self.store);
        self.after_mutation(new_ids.clone());
        Ok(new_ids)
    }

    pub fn clone_selected(&mut self) -> EditorResult<Vec<ElementId>> {
        let ids = self.selection.selected().to_vec();
        self.clone_elements(&ids)
    }

    /// Apply a non-geometric change, recording it if `change` reports one.
    fn change_element(
        &mut self,
        id: ElementId,
        description: String,
        change: impl FnOnce(&mut Element) -> bool,
    ) -> EditorResult<bool> {
        let before = ElementSnapshot::capture(&self.store, id).ok_or(EditorError::ElementNotFound(id))?;
        let element = self.store.get_mut(id).ok_or(EditorError::ElementNotFound(id))?;
        if !change(element) {
            return Ok(false);
        }
        self.history.record(CommandKind::PropertyChange, description, vec![before], None);
        self.after_mutation(vec![id]);
        Ok(true)
    }

    /// Set a property, returning the previous value.
    pub fn set_property(&mut self, id: ElementId, key: &str, value: Value) -> EditorResult<Option<Value>> {
        let mut previous = None;
        self.change_element(id, format!("Change {key}"), |element| {
            if element.property(key) == Some(&value) {
                previous = Some(value);
                return false;
            }
            previous = element.set_property(key, value);
            true
        })?;
        Ok(previous)
    }

    pub fn set_name(&mut self, id: ElementId, name: impl Into<String>) -> EditorResult<bool> {
        let name = name.into();
        self.change_element(id, "Rename element".to_string(), |element| {
            if element.name == name {
                return false;
            }
            element.name = name;
            true
        })
    }

    /// Set the live preview value.
    pub fn set_value(&mut self, id: ElementId, value: Option<Value>) -> EditorResult<bool> {
        self.change_element(id, "Change value".to_string(), |element| {
            if element.value == value {
                return false;
            }
            element.value = value;
            true
        })
    }

    pub fn set_edit_state(&mut self, id: ElementId, edit_state: EditState) -> EditorResult<bool> {
        self.change_element(id, "Change edit state".to_string(), |element| {
            if element.edit_state == edit_state {
                return false;
            }
            element.edit_state = edit_state;
            true
        })
    }

    // --- Layout operations on the selection ---

    /// Align the movable selected elements. Needs at least two.
    pub fn align_selected(&mut self, alignment: Alignment) -> bool {
        let (ids, mut rects): (Vec<ElementId>, Vec<Geometry>) = self.selected_where(Element::can_move).into_iter().unzip();
        if !geometry::align(&mut rects, alignment) {
            return false;
        }
        let changes = ids.into_iter().zip(rects).collect();
        self.commit_geometry(CommandKind::Alignment, describe_alignment(alignment).to_string(), changes)
    }

    /// Evenly space the movable selected elements. Needs at least three.
    pub fn distribute_selected(&mut self, distribution: Distribution) -> bool {
        let (ids, mut rects): (Vec<ElementId>, Vec<Geometry>) = self.selected_where(Element::can_move).into_iter().unzip();
        if !geometry::distribute(&mut rects, distribution) {
            return false;
        }
        let description = match distribution {
            Distribution::Horizontal => "Distribute horizontally",
            Distribution::Vertical => "Distribute vertically",
        };
        let changes = ids.into_iter().zip(rects).collect();
        self.commit_geometry(CommandKind::Alignment, description.to_string(), changes)
    }

    /// Give the resizable selected elements the largest width/height.
    pub fn match_size_selected(&mut self, mode: SizeMatch) -> bool {
        let (ids, mut rects): (Vec<ElementId>, Vec<Geometry>) = self.selected_where(Element::can_resize).into_iter().unzip();
        if !geometry::match_size(&mut rects, mode) {
            return false;
        }
        let description = match mode {
            SizeMatch::Width => "Make same width",
            SizeMatch::Height => "Make same height",
            SizeMatch::Both => "Make same size",
        };
        let changes = ids.into_iter().zip(rects).collect();
        self.commit_geometry(CommandKind::Resize, description.to_string(), changes)
    }

    /// Move the movable elements among `ids` by `delta`, kept on the page.
    pub fn nudge(&mut self, ids: &[ElementId], delta: Vec2) -> EditorResult<bool> {
        self.require_all(ids)?;
        let constraints = self.constraints();
        let changes: Vec<(ElementId, Geometry)> = ids
            .iter()
            .filter_map(|&id| self.store.get(id))
            .filter(|e| e.can_move())
            .map(|e| (e.id(), constraints.clamp_to_bounds(e.geometry().translated(delta))))
            .collect();
        let moved: Vec<ElementId> = changes.iter().map(|(id, _)| *id).collect();
        let description = self.describe("Nudge", &moved);
        Ok(self.commit_geometry(CommandKind::Move, description, changes))
    }

    /// Nudge the selection one step in `direction` (unit components).
    pub fn nudge_selected(&mut self, direction: Vec2, large: bool) -> bool {
        let step = if large { self.config.nudge_large_step } else { self.config.nudge_step };
        let ids = self.selection.selected().to_vec();
        self.nudge(&ids, direction * step).unwrap_or(false)
    }

    // --- Z-order ---

    fn paint_ordered(&self, ids: &[ElementId]) -> Vec<ElementId> {
        self.store
            .paint_order()
            .into_iter()
            .map(Element::id)
            .filter(|id| ids.contains(id))
            .collect()
    }

    fn commit_z_order(&mut self, description: &str, changes: Vec<(ElementId, i32)>) -> bool {
        let ids: Vec<ElementId> = changes.iter().map(|(id, _)| *id).collect();
        let before = ElementSnapshot::capture_all(&self.store, &ids);
        for (id, z_index) in changes {
            if let Some(element) = self.store.get_mut(id) {
                element.z_index = z_index;
            }
        }
        self.record_changed(CommandKind::ZOrder, description.to_string(), before)
    }

    /// Stack `ids` above every other element, keeping their relative order.
    pub fn bring_to_front(&mut self, ids: &[ElementId]) -> EditorResult<bool> {
        self.require_all(ids)?;
        let targets = self.paint_ordered(ids);
        let Some(others_max) = self.store.iter().filter(|e| !ids.contains(&e.id())).map(|e| e.z_index).max() else {
            return Ok(false);
        };
        if targets.iter().all(|&id| self.store.get(id).is_some_and(|e| e.z_index > others_max)) {
            return Ok(false);
        }

        let mut z_index = others_max;
        let changes = targets
            .into_iter()
            .map(|id| {
                z_index = z_index.saturating_add(1);
                (id, z_index)
            })
            .collect();
        Ok(self.commit_z_order("Bring to front", changes))
    }

    /// Stack `ids` below every other element, keeping their relative order.
    pub fn send_to_back(&mut self, ids: &[ElementId]) -> EditorResult<bool> {
        self.require_all(ids)?;
        let targets = self.paint_ordered(ids);
        let Some(others_min) = self.store.iter().filter(|e| !ids.contains(&e.id())).map(|e| e.z_index).min() else {
            return Ok(false);
        };
        if targets.iter().all(|&id| self.store.get(id).is_some_and(|e| e.z_index < others_min)) {
            return Ok(false);
        }

        let count = i32::try_from(targets.len()).unwrap_or(i32::MAX);
        let mut z_index = others_min.saturating_sub(count);
        let changes = targets
            .into_iter()
            .map(|id| {
                let assigned = z_index;
                z_index = z_index.saturating_add(1);
                (id, assigned)
            })
            .collect();
        Ok(self.commit_z_order("Send to back", changes))
    }

    pub fn bring_selected_to_front(&mut self) -> bool {
        let ids = self.selection.selected().to_vec();
        self.bring_to_front(&ids).unwrap_or(false)
    }

    pub fn send_selected_to_back(&mut self) -> bool {
        let ids = self.selection.selected().to_vec();
        self.send_to_back(&ids).unwrap_or(false)
    }

    // --- History ---

    /// Undo the last command. Refused while a gesture is in progress.
    pub fn undo(&mut self) -> bool {
        if self.is_gesture_active() {
            return false;
        }
        let done = self.history.undo(&mut self.store);
        self.after_mutation(Vec::new());
        done
    }

    pub fn redo(&mut self) -> bool {
        if self.is_gesture_active() {
            return false;
        }
        let done = self.history.redo(&mut self.store);
        self.after_mutation(Vec::new());
        done
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.last_action_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.next_action_description()
    }

    // --- Selection ---

    /// Start a box selection at a page point.
    pub fn start_box_selection(&mut self, point: Point, modifiers: Modifiers) -> bool {
        if self.drag.is_active() || self.resize.is_active() {
            return false;
        }
        self.selection.start_selection(point, modifiers)
    }

    pub fn update_box_selection(&mut self, point: Point) -> bool {
        self.selection.update_selection(point, &self.store)
    }

    pub fn end_box_selection(&mut self) -> bool {
        let ended = self.selection.end_selection();
        self.sync_events();
        ended
    }

    pub fn cancel_box_selection(&mut self) -> bool {
        let cancelled = self.selection.cancel_selection();
        self.sync_events();
        cancelled
    }

    pub fn select_at(&mut self, point: Point, modifiers: Modifiers) -> Option<ElementId> {
        let hit = self.selection.select_at(point, modifiers, &self.store);
        self.sync_events();
        hit
    }

    pub fn select_all(&mut self) -> bool {
        let changed = self.selection.select_all(&self.store);
        self.sync_events();
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear_selection();
        self.sync_events();
        changed
    }

    pub fn set_selection(&mut self, ids: &[ElementId]) -> bool {
        let changed = self.selection.set_selection(ids, &self.store);
        self.sync_events();
        changed
    }

    pub fn add_to_selection(&mut self, id: ElementId) -> bool {
        let changed = self.selection.add_to_selection(id, &self.store);
        self.sync_events();
        changed
    }

    pub fn remove_from_selection(&mut self, id: ElementId) -> bool {
        let changed = self.selection.remove_from_selection(id);
        self.sync_events();
        changed
    }

    pub fn toggle_selection(&mut self, id: ElementId) -> bool {
        let changed = self.selection.toggle_selection(id, &self.store);
        self.sync_events();
        changed
    }

    // --- Gestures ---

    pub fn is_gesture_active(&self) -> bool {
        self.drag.is_active() || self.resize.is_active() || self.selection.is_selecting()
    }

    /// Start dragging from `anchor`. A selected anchor drags the whole
    /// selection; otherwise only the anchor moves.
    pub fn begin_drag(&mut self, point: Point, anchor: ElementId) -> EditorResult<()> {
        if self.is_gesture_active() {
            return Err(EditorError::GestureActive);
        }
        let ids = if self.selection.is_selected(anchor) {
            self.selection.selected().to_vec()
        } else {
            vec![anchor]
        };
        self.drag.begin(point, anchor, &ids, &self.store)
    }

    /// Move the dragged elements for the pointer at `point`. Nothing is
    /// recorded until [`end_drag`](Self::end_drag), and the realized set is
    /// refreshed on the next [`tick`](Self::tick) or at the end of the drag.
    pub fn update_drag(&mut self, point: Point) -> bool {
        let constraints = self.constraints();
        let moved = self.drag.update(point, &constraints, Some((&mut self.snap, &self.store)));
        self.apply_transient(moved)
    }

    /// Finish the drag, recording one move command if anything moved.
    pub fn end_drag(&mut self) -> bool {
        let Some(originals) = self.drag.release() else {
            return false;
        };
        self.snap.clear_guides();
        let ids: Vec<ElementId> = originals.iter().map(ElementSnapshot::id).collect();
        let description = self.describe("Move", &ids);
        let recorded = self.record_changed(CommandKind::Move, description, originals);
        self.catch_up_realization();
        recorded
    }

    /// Abort the drag. Elements keep their last transient geometry.
    pub fn cancel_drag(&mut self) -> bool {
        self.snap.clear_guides();
        let cancelled = self.drag.cancel();
        self.catch_up_realization();
        cancelled
    }

    pub fn begin_resize(&mut self, point: Point, id: ElementId, handle: HandleKind) -> EditorResult<()> {
        if self.is_gesture_active() {
            return Err(EditorError::GestureActive);
        }
        self.resize.begin(point, id, handle, &self.store)
    }

    pub fn update_resize(&mut self, point: Point) -> bool {
        let constraints = self.constraints();
        let resized = self.resize.update(point, &constraints, Some((&mut self.snap, &self.store)));
        self.apply_transient(resized.into_iter().collect())
    }

    pub fn end_resize(&mut self) -> bool {
        let Some(original) = self.resize.release() else {
            return false;
        };
        self.snap.clear_guides();
        let description = self.describe("Resize", &[original.id()]);
        let recorded = self.record_changed(CommandKind::Resize, description, vec![original]);
        self.catch_up_realization();
        recorded
    }

    pub fn cancel_resize(&mut self) -> bool {
        self.snap.clear_guides();
        let cancelled = self.resize.cancel();
        self.catch_up_realization();
        cancelled
    }

    /// Abort whatever gesture is running without recording anything.
    pub fn cancel_gesture(&mut self) -> bool {
        let cancelled = self.cancel_drag() | self.cancel_resize() | self.cancel_box_selection();
        if cancelled {
            log::debug!("Gesture cancelled");
        }
        self.pointer = PointerMode::Idle;
        cancelled
    }

    fn apply_transient(&mut self, changes: Vec<(ElementId, Geometry)>) -> bool {
        if changes.is_empty() {
            return false;
        }
        let ids: Vec<ElementId> = changes.iter().map(|(id, _)| *id).collect();
        for (id, geometry) in changes {
            if let Some(element) = self.store.get_mut(id) {
                element.set_geometry(geometry);
            }
        }
        self.events.push(EditorEvent::ElementsChanged(ids));
        self.realization_stale = true;
        true
    }

    fn catch_up_realization(&mut self) {
        if self.realization_stale {
            self.realize();
        }
    }

    /// Resize handle under a page point, on a selected resizable element.
    fn handle_at(&self, point: Point) -> Option<(ElementId, HandleKind)> {
        let tolerance = self.camera.px_to_mm(HANDLE_HIT_TOLERANCE);
        self.selection
            .selected()
            .iter()
            .filter_map(|&id| self.store.get(id))
            .filter(|e| e.can_resize())
            .find_map(|e| handles::hit_test_handle(&e.geometry(), point, tolerance).map(|h| (e.id(), h)))
    }

    /// Dispatch a pointer event in screen coordinates.
    ///
    /// Press on a selection handle resizes, press on an element selects and
    /// drags it, press on empty page starts a box selection. Returns whether
    /// the event was consumed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                modifiers,
            } => {
                if self.pointer != PointerMode::Idle || self.is_gesture_active() {
                    return false;
                }
                let point = self.camera.screen_to_world(position);
                self.press(point, modifiers);
                true
            }
            PointerEvent::Move { position } => {
                let point = self.camera.screen_to_world(position);
                match self.pointer {
                    PointerMode::Idle => false,
                    PointerMode::BoxSelect => self.update_box_selection(point),
                    PointerMode::Drag => self.update_drag(point),
                    PointerMode::Resize => self.update_resize(point),
                }
            }
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => {
                let point = self.camera.screen_to_world(position);
                let mode = std::mem::take(&mut self.pointer);
                match mode {
                    PointerMode::Idle => return false,
                    PointerMode::BoxSelect => {
                        self.update_box_selection(point);
                        self.end_box_selection();
                    }
                    PointerMode::Drag => {
                        self.update_drag(point);
                        self.end_drag();
                    }
                    PointerMode::Resize => {
                        self.update_resize(point);
                        self.end_resize();
                    }
                }
                true
            }
            PointerEvent::CaptureLost => self.cancel_gesture(),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => false,
        }
    }

    fn press(&mut self, point: Point, modifiers: Modifiers) {
        if let Some((id, handle)) = self.handle_at(point) {
            match self.begin_resize(point, id, handle) {
                Ok(()) => {
                    self.pointer = PointerMode::Resize;
                    return;
                }
                Err(err) => log::debug!("Resize refused: {err}"),
            }
        }

        let Some(id) = self.store.topmost_at(point) else {
            if self.start_box_selection(point, modifiers) {
                self.pointer = PointerMode::BoxSelect;
            }
            return;
        };

        if modifiers.is_additive() {
            self.toggle_selection(id);
            if !self.selection.is_selected(id) {
                return;
            }
        } else if !self.selection.is_selected(id) {
            self.set_selection(&[id]);
        }

        match self.begin_drag(point, id) {
            Ok(()) => self.pointer = PointerMode::Drag,
            Err(err) => log::debug!("Drag refused: {err}"),
        }
    }

    // --- Viewport ---

    fn request_realization(&mut self, now: Instant) {
        if self.throttle.request(now) {
            self.realize();
        }
    }

    fn viewport_from_camera(&mut self, now: Instant) {
        if let Some(size) = self.screen_size {
            self.viewport = self.camera.visible_rect(size);
            self.request_realization(now);
        }
    }

    /// Set the visible page rectangle directly. Recomputes are coalesced
    /// to one per frame; call [`tick`](Self::tick) to flush.
    pub fn set_viewport(&mut self, viewport: Geometry, now: Instant) {
        self.viewport = viewport;
        self.request_realization(now);
    }

    /// Set the screen size in device pixels; the viewport follows the camera.
    pub fn set_screen_size(&mut self, size: Size, now: Instant) {
        self.screen_size = Some(size);
        self.viewport_from_camera(now);
    }

    pub fn set_zoom(&mut self, zoom: f64, now: Instant) {
        self.camera.set_zoom(zoom);
        self.viewport_from_camera(now);
    }

    pub fn zoom_at(&mut self, screen_point: Point, factor: f64, now: Instant) {
        self.camera.zoom_at(screen_point, factor);
        self.viewport_from_camera(now);
    }

    pub fn pan(&mut self, delta: Vec2, now: Instant) {
        self.camera.pan(delta);
        self.viewport_from_camera(now);
    }

    /// Zoom and centre the camera on the page. Needs a screen size.
    pub fn zoom_to_fit(&mut self, padding: f64, now: Instant) -> bool {
        let Some(size) = self.screen_size else {
            return false;
        };
        self.camera.fit_to_bounds(page_geometry(&self.document), size, padding);
        self.viewport_from_camera(now);
        true
    }

    pub fn set_dpi(&mut self, dpi: f64, now: Instant) {
        self.camera.set_dpi(dpi);
        self.config.dpi = self.camera.dpi;
        self.viewport_from_camera(now);
    }

    pub fn set_virtualization(&mut self, enabled: bool) {
        self.config.virtualization_enabled = enabled;
        self.realize();
    }

    /// Run deferred realization work whose frame interval has elapsed:
    /// pending viewport changes and geometry moved by a running gesture.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = self.throttle.poll(now) || (self.realization_stale && self.throttle.request(now));
        if due {
            self.realize();
        }
        due
    }
}
