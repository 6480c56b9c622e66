//! Snap functionality for aligning elements to the grid and to each other.

use crate::element::ElementId;
use crate::geometry::Geometry;
use crate::handles::HandleKind;
use crate::store::ElementStore;
use kurbo::{Line, Point};
use serde::{Deserialize, Serialize};

/// Default grid size in logical units (millimetres).
pub const DEFAULT_GRID_SIZE: f64 = 5.0;

/// Default distance within which element snapping is applied.
pub const DEFAULT_SNAP_DISTANCE: f64 = 4.0;

/// Snap mode for aligning elements to the grid or to other elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapMode {
    /// No snapping.
    None,
    /// Snap to grid lines.
    #[default]
    Grid,
    /// Snap to other elements' edges and centres.
    Elements,
    /// Snap to both grid and elements.
    All,
}

impl SnapMode {
    /// Cycle to the next snap mode.
    pub fn next(self) -> Self {
        match self {
            SnapMode::None => SnapMode::Grid,
            SnapMode::Grid => SnapMode::Elements,
            SnapMode::Elements => SnapMode::All,
            SnapMode::All => SnapMode::None,
        }
    }

    /// Check if grid snapping is enabled.
    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    /// Check if element snapping is enabled.
    pub fn snaps_to_elements(self) -> bool {
        matches!(self, SnapMode::Elements | SnapMode::All)
    }

    /// Check if any snapping is enabled.
    pub fn is_enabled(self) -> bool {
        self != SnapMode::None
    }
}

/// Snap a single value to the grid, rounding half up.
///
/// A grid size that is not a positive finite number disables snapping.
pub fn snap_value(value: f64, grid_size: f64) -> f64 {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return value;
    }
    (value / grid_size + 0.5).floor() * grid_size
}

/// Snap a point to the nearest grid intersection.
pub fn snap_point(point: Point, grid_size: f64) -> Point {
    Point::new(snap_value(point.x, grid_size), snap_value(point.y, grid_size))
}

/// Snap position and size independently to the grid.
pub fn snap_geometry_to_grid(geometry: Geometry, grid_size: f64) -> Geometry {
    Geometry::new(
        snap_value(geometry.x, grid_size),
        snap_value(geometry.y, grid_size),
        snap_value(geometry.width, grid_size),
        snap_value(geometry.height, grid_size),
    )
}

/// Orientation of an alignment guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// A vertical line at a fixed x.
    Vertical,
    /// A horizontal line at a fixed y.
    Horizontal,
}

/// A visual alignment guide drawn while snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    pub axis: GuideAxis,
    /// x for vertical guides, y for horizontal ones.
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

impl SnapGuide {
    pub fn line(&self) -> Line {
        match self.axis {
            GuideAxis::Vertical => Line::new((self.position, self.start), (self.position, self.end)),
            GuideAxis::Horizontal => Line::new((self.start, self.position), (self.end, self.position)),
        }
    }
}

/// One axis of an element snap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSnap {
    /// Element snapped against.
    pub target: ElementId,
    /// Coordinate of the matched edge or centre.
    pub position: f64,
    /// Translation to apply on this axis.
    pub offset: f64,
}

/// Result of snapping a moving rectangle against other elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSnap {
    pub x: Option<AxisSnap>,
    pub y: Option<AxisSnap>,
    pub guides: Vec<SnapGuide>,
}

impl ElementSnap {
    pub fn is_snapped(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// Translate `geometry` by the snap offsets.
    pub fn apply(&self, geometry: Geometry) -> Geometry {
        let mut snapped = geometry;
        if let Some(x) = self.x {
            snapped.x += x.offset;
        }
        if let Some(y) = self.y {
            snapped.y += y.offset;
        }
        snapped
    }
}

/// Candidate alignments on one axis, in priority order.
///
/// Each pair is (moving coordinate, other coordinate): start-start, end-end,
/// start-end, end-start, centre-centre.
fn axis_candidates(start: f64, end: f64, other_start: f64, other_end: f64) -> [(f64, f64); 5] {
    [
        (start, other_start),
        (end, other_end),
        (start, other_end),
        (end, other_start),
        ((start + end) / 2.0, (other_start + other_end) / 2.0),
    ]
}

fn first_within(candidates: [(f64, f64); 5], threshold: f64) -> Option<(f64, f64)> {
    candidates
        .into_iter()
        .find(|(from, to)| (to - from).abs() <= threshold)
        .map(|(from, to)| (to, to - from))
}

/// Snap a moving rectangle to the edges and centres of other elements.
///
/// Elements are scanned in the given order and the first one with an edge
/// or centre within `threshold` wins for each axis, even if a later element
/// is closer.
pub fn snap_to_elements<'a>(
    moving: &Geometry,
    others: impl IntoIterator<Item = (ElementId, &'a Geometry)>,
    threshold: f64,
) -> ElementSnap {
    let mut x: Option<(AxisSnap, Geometry)> = None;
    let mut y: Option<(AxisSnap, Geometry)> = None;

    for (id, other) in others {
        if x.is_none() {
            let candidates = axis_candidates(moving.x, moving.right(), other.x, other.right());
            if let Some((position, offset)) = first_within(candidates, threshold) {
                x = Some((AxisSnap { target: id, position, offset }, *other));
            }
        }
        if y.is_none() {
            let candidates = axis_candidates(moving.y, moving.bottom(), other.y, other.bottom());
            if let Some((position, offset)) = first_within(candidates, threshold) {
                y = Some((AxisSnap { target: id, position, offset }, *other));
            }
        }
        if x.is_some() && y.is_some() {
            break;
        }
    }

    let mut snap = ElementSnap {
        x: x.map(|(s, _)| s),
        y: y.map(|(s, _)| s),
        guides: Vec::new(),
    };
    let snapped = snap.apply(*moving);
    if let Some((axis, other)) = x {
        snap.guides.push(SnapGuide {
            axis: GuideAxis::Vertical,
            position: axis.position,
            start: snapped.y.min(other.y),
            end: snapped.bottom().max(other.bottom()),
        });
    }
    if let Some((axis, other)) = y {
        snap.guides.push(SnapGuide {
            axis: GuideAxis::Horizontal,
            position: axis.position,
            start: snapped.x.min(other.x),
            end: snapped.right().max(other.right()),
        });
    }
    snap
}

fn edge_within(edge: f64, targets: [f64; 2], threshold: f64) -> Option<f64> {
    targets.into_iter().find(|t| (t - edge).abs() <= threshold)
}

/// Result of a snap suggestion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub geometry: Geometry,
    /// Whether the x axis was aligned to another element.
    pub snapped_x: bool,
    /// Whether the y axis was aligned to another element.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(geometry: Geometry) -> Self {
        Self {
            geometry,
            snapped_x: false,
            snapped_y: false,
        }
    }

    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap-while-dragging helper combining grid and element snapping.
///
/// Keeps the guide lines of the last suggestion until the gesture ends.
#[derive(Debug, Clone)]
pub struct SnapEngine {
    pub mode: SnapMode,
    pub grid_size: f64,
    pub snap_distance: f64,
    guides: Vec<SnapGuide>,
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::new(SnapMode::default(), DEFAULT_GRID_SIZE, DEFAULT_SNAP_DISTANCE)
    }
}

impl SnapEngine {
    pub fn new(mode: SnapMode, grid_size: f64, snap_distance: f64) -> Self {
        Self {
            mode,
            grid_size,
            snap_distance,
            guides: Vec::new(),
        }
    }

    /// Guide lines produced by the last suggestion.
    pub fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }

    pub fn clear_guides(&mut self) {
        self.guides.clear();
    }

    fn grid(&self) -> f64 {
        if self.mode.snaps_to_grid() { self.grid_size } else { 0.0 }
    }

    /// Suggest a snapped position for a dragged rectangle.
    ///
    /// Element snapping takes priority; axes left unsnapped fall back to the
    /// grid. Elements listed in `exclude` (the ones being dragged) are not
    /// snap targets.
    pub fn suggest(&mut self, candidate: Geometry, exclude: &[ElementId], store: &ElementStore) -> SnapResult {
        self.guides.clear();
        let mut result = SnapResult::none(candidate);

        if self.mode.snaps_to_elements() {
            let geometries: Vec<(ElementId, Geometry)> = store
                .iter()
                .filter(|e| !exclude.contains(&e.id()))
                .map(|e| (e.id(), e.geometry()))
                .collect();
            let snap = snap_to_elements(&candidate, geometries.iter().map(|(id, g)| (*id, g)), self.snap_distance);
            result.geometry = snap.apply(candidate);
            result.snapped_x = snap.x.is_some();
            result.snapped_y = snap.y.is_some();
            self.guides = snap.guides;
        }

        let grid = self.grid();
        if !result.snapped_x {
            result.geometry.x = snap_value(result.geometry.x, grid);
        }
        if !result.snapped_y {
            result.geometry.y = snap_value(result.geometry.y, grid);
        }
        result
    }

    /// Suggest a snapped rectangle for a resize through `handle`.
    ///
    /// The grid applies to position and size; element snapping then moves
    /// only the edges the handle drags onto nearby element edges.
    pub fn suggest_resize(
        &mut self,
        candidate: Geometry,
        handle: HandleKind,
        exclude: &[ElementId],
        store: &ElementStore,
    ) -> SnapResult {
        self.guides.clear();
        let mut result = SnapResult::none(snap_geometry_to_grid(candidate, self.grid()));
        if !self.mode.snaps_to_elements() {
            return result;
        }

        let (mut left, mut top) = (result.geometry.x, result.geometry.y);
        let (mut right, mut bottom) = (result.geometry.right(), result.geometry.bottom());

        let x_edge = if handle.moves_left() {
            Some(candidate.x)
        } else if handle.moves_right() {
            Some(candidate.right())
        } else {
            None
        };
        let y_edge = if handle.moves_top() {
            Some(candidate.y)
        } else if handle.moves_bottom() {
            Some(candidate.bottom())
        } else {
            None
        };

        for element in store.iter().filter(|e| !exclude.contains(&e.id())) {
            let other = element.geometry();

            if !result.snapped_x {
                if let Some(target) = x_edge.and_then(|edge| edge_within(edge, [other.x, other.right()], self.snap_distance)) {
                    if handle.moves_left() {
                        left = target;
                    } else {
                        right = target;
                    }
                    result.snapped_x = true;
                    self.guides.push(SnapGuide {
                        axis: GuideAxis::Vertical,
                        position: target,
                        start: top.min(other.y),
                        end: bottom.max(other.bottom()),
                    });
                }
            }

            if !result.snapped_y {
                if let Some(target) = y_edge.and_then(|edge| edge_within(edge, [other.y, other.bottom()], self.snap_distance)) {
                    if handle.moves_top() {
                        top = target;
                    } else {
                        bottom = target;
                    }
                    result.snapped_y = true;
                    self.guides.push(SnapGuide {
                        axis: GuideAxis::Horizontal,
                        position: target,
                        start: left.min(other.x),
                        end: right.max(other.right()),
                    });
                }
            }
        }

        result.geometry = Geometry::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind};
    use uuid::Uuid;

    #[test]
    fn test_snap_value_rounds_half_up() {
        assert!((snap_value(13.5, 10.0) - 10.0).abs() < f64::EPSILON);
        assert!((snap_value(16.5, 10.0) - 20.0).abs() < f64::EPSILON);
        assert!((snap_value(15.0, 10.0) - 20.0).abs() < f64::EPSILON);
        assert!((snap_value(-15.0, 10.0) - -10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_value_zero_grid_is_identity() {
        assert!((snap_value(13.37, 0.0) - 13.37).abs() < f64::EPSILON);
        assert!((snap_value(13.37, -5.0) - 13.37).abs() < f64::EPSILON);
        assert!((snap_value(13.37, f64::NAN) - 13.37).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_geometry_to_grid() {
        let snapped = snap_geometry_to_grid(Geometry::new(12.0, 27.0, 98.0, 31.0), 10.0);
        assert_eq!(snapped, Geometry::new(10.0, 30.0, 100.0, 30.0));
    }

    #[test]
    fn test_snap_mode_cycle() {
        assert_eq!(SnapMode::None.next(), SnapMode::Grid);
        assert_eq!(SnapMode::All.next(), SnapMode::None);
        assert!(SnapMode::All.snaps_to_grid());
        assert!(SnapMode::All.snaps_to_elements());
        assert!(!SnapMode::Grid.snaps_to_elements());
        assert!(!SnapMode::None.is_enabled());
    }

    #[test]
    fn test_snap_to_element_left_edge() {
        let other = Geometry::new(100.0, 200.0, 50.0, 50.0);
        let id = Uuid::new_v4();
        let moving = Geometry::new(103.0, 0.0, 40.0, 40.0);
        let snap = snap_to_elements(&moving, [(id, &other)], 5.0);

        let x = snap.x.unwrap();
        assert_eq!(x.target, id);
        assert!((x.offset - -3.0).abs() < f64::EPSILON);
        assert!(snap.y.is_none());
        assert_eq!(snap.apply(moving).x, 100.0);
        assert_eq!(snap.guides.len(), 1);
        assert_eq!(snap.guides[0].axis, GuideAxis::Vertical);
        assert!((snap.guides[0].start - 0.0).abs() < f64::EPSILON);
        assert!((snap.guides[0].end - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_threshold_is_inclusive() {
        let other = Geometry::new(0.0, 0.0, 50.0, 50.0);
        let moving = Geometry::new(300.0, 55.0, 50.0, 50.0);
        let snap = snap_to_elements(&moving, [(Uuid::new_v4(), &other)], 5.0);
        // Top of moving is exactly 5 away from the bottom of other.
        assert!((snap.y.unwrap().offset - -5.0).abs() < f64::EPSILON);
        assert!(snap.x.is_none());
    }

    #[test]
    fn test_first_element_in_order_wins() {
        // Both candidates are in range; the second is closer but loses.
        let first = Geometry::new(104.0, 500.0, 30.0, 30.0);
        let second = Geometry::new(101.0, 800.0, 30.0, 30.0);
        let (id_first, id_second) = (Uuid::new_v4(), Uuid::new_v4());
        let moving = Geometry::new(100.0, 0.0, 30.0, 30.0);

        let snap = snap_to_elements(&moving, [(id_first, &first), (id_second, &second)], 5.0);
        assert_eq!(snap.x.unwrap().target, id_first);

        let snap = snap_to_elements(&moving, [(id_second, &second), (id_first, &first)], 5.0);
        assert_eq!(snap.x.unwrap().target, id_second);
    }

    #[test]
    fn test_centre_alignment() {
        let other = Geometry::new(0.0, 0.0, 100.0, 100.0);
        // Edges are far apart, centres are 2 apart.
        let moving = Geometry::new(28.0, 300.0, 40.0, 40.0);
        let snap = snap_to_elements(&moving, [(Uuid::new_v4(), &other)], 3.0);
        assert!((snap.apply(moving).center().x - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_engine_grid_only() {
        let mut engine = SnapEngine::new(SnapMode::Grid, 10.0, 4.0);
        let store = ElementStore::new();
        let result = engine.suggest(Geometry::new(13.0, 27.0, 33.0, 33.0), &[], &store);
        assert_eq!(result.geometry, Geometry::new(10.0, 30.0, 33.0, 33.0));
        assert!(!result.is_snapped());
        assert!(engine.guides().is_empty());
    }

    #[test]
    fn test_engine_prefers_elements_then_grid() {
        let mut store = ElementStore::new();
        store.add(Element::new(ElementKind::Rectangle, Geometry::new(102.0, 400.0, 50.0, 50.0)));
        let mut engine = SnapEngine::new(SnapMode::All, 10.0, 4.0);

        let result = engine.suggest(Geometry::new(99.0, 47.0, 30.0, 30.0), &[], &store);
        assert!((result.geometry.x - 102.0).abs() < f64::EPSILON);
        assert!((result.geometry.y - 50.0).abs() < f64::EPSILON);
        assert!(result.snapped_x);
        assert!(!result.snapped_y);
        assert_eq!(engine.guides().len(), 1);

        engine.clear_guides();
        assert!(engine.guides().is_empty());
    }

    #[test]
    fn test_engine_ignores_excluded() {
        let mut store = ElementStore::new();
        let dragged = Element::new(ElementKind::Rectangle, Geometry::new(100.0, 100.0, 50.0, 50.0));
        let id = dragged.id();
        store.add(dragged);
        let mut engine = SnapEngine::new(SnapMode::Elements, 10.0, 4.0);

        let result = engine.suggest(Geometry::new(101.0, 101.0, 50.0, 50.0), &[id], &store);
        assert!(!result.is_snapped());
        assert_eq!(result.geometry, Geometry::new(101.0, 101.0, 50.0, 50.0));
    }

    #[test]
    fn test_engine_resize_snaps_dragged_edge() {
        let mut store = ElementStore::new();
        store.add(Element::new(ElementKind::Rectangle, Geometry::new(200.0, 0.0, 50.0, 50.0)));
        let mut engine = SnapEngine::new(SnapMode::Elements, 10.0, 4.0);

        // Right edge at 197 snaps to the other's left edge at 200.
        let result = engine.suggest_resize(
            Geometry::new(100.0, 300.0, 97.0, 40.0),
            HandleKind::Right,
            &[],
            &store,
        );
        assert!(result.snapped_x);
        assert_eq!(result.geometry, Geometry::new(100.0, 300.0, 100.0, 40.0));
    }

    #[test]
    fn test_guide_line() {
        let guide = SnapGuide {
            axis: GuideAxis::Horizontal,
            position: 10.0,
            start: 0.0,
            end: 40.0,
        };
        let line = guide.line();
        assert_eq!(line.p0, Point::new(0.0, 10.0));
        assert_eq!(line.p1, Point::new(40.0, 10.0));
    }
}
