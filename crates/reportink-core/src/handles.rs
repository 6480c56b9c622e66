//! Resize handle layout and hit-testing.

use crate::geometry::Geometry;
use kurbo::Point;

/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// One of the eight resize handles around an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl HandleKind {
    /// All handles, clockwise from the top-left corner.
    pub const ALL: [HandleKind; 8] = [
        HandleKind::TopLeft,
        HandleKind::Top,
        HandleKind::TopRight,
        HandleKind::Right,
        HandleKind::BottomRight,
        HandleKind::Bottom,
        HandleKind::BottomLeft,
        HandleKind::Left,
    ];

    pub fn moves_left(self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::Left | HandleKind::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, HandleKind::TopRight | HandleKind::Right | HandleKind::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::Top | HandleKind::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, HandleKind::BottomLeft | HandleKind::Bottom | HandleKind::BottomRight)
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            HandleKind::TopLeft | HandleKind::TopRight | HandleKind::BottomLeft | HandleKind::BottomRight
        )
    }

    /// Position of this handle on `geometry`.
    pub fn position(self, geometry: &Geometry) -> Point {
        let center = geometry.center();
        let x = if self.moves_left() {
            geometry.x
        } else if self.moves_right() {
            geometry.right()
        } else {
            center.x
        };
        let y = if self.moves_top() {
            geometry.y
        } else if self.moves_bottom() {
            geometry.bottom()
        } else {
            center.y
        };
        Point::new(x, y)
    }
}

/// A positioned handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
}

/// Lay out all eight handles for an element.
pub fn handles_for(geometry: &Geometry) -> [Handle; 8] {
    HandleKind::ALL.map(|kind| Handle {
        kind,
        position: kind.position(geometry),
    })
}

/// Find the handle under `point`, if any.
///
/// Corners are tested before edges so a small element still resizes
/// diagonally from its corners.
pub fn hit_test_handle(geometry: &Geometry, point: Point, tolerance: f64) -> Option<HandleKind> {
    let hit = |kind: &HandleKind| {
        let position = kind.position(geometry);
        (position.x - point.x).abs() <= tolerance && (position.y - point.y).abs() <= tolerance
    };
    HandleKind::ALL
        .iter()
        .filter(|k| k.is_corner())
        .chain(HandleKind::ALL.iter().filter(|k| !k.is_corner()))
        .copied()
        .find(|k| hit(k))
}
