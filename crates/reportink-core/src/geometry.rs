//! Geometry kernel: pure operations over element rectangles.
//!
//! Everything here works on [`Geometry`] values (x, y, width, height in
//! logical units) and never touches the element store. Callers copy the
//! geometry out, run the kernel, and write the results back.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Selection boxes smaller than this on both axes are treated as clicks.
pub const MIN_BOX_EXTENT: f64 = 3.0;

/// Position and size of an element in logical units (millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a geometry from two arbitrary corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::from_rect(Rect::from_points(p1, p2))
    }

    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Get the geometry as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Inclusive point containment (points on the border count).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// True when `other` lies completely inside this geometry.
    pub fn contains_rect(&self, other: &Geometry) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when the two rectangles overlap with a positive area.
    pub fn intersects(&self, other: &Geometry) -> bool {
        self.as_rect().intersect(other.as_rect()).area() > 0.0
    }
}

impl From<Rect> for Geometry {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

/// Multi-element alignment modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Right,
    Top,
    Bottom,
    /// Share a common x-centre (mean of the centres).
    CenterHorizontal,
    /// Share a common y-centre (mean of the centres).
    CenterVertical,
}

/// Distribution axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distribution {
    Horizontal,
    Vertical,
}

/// Which dimensions `match_size` equalises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeMatch {
    Width,
    Height,
    Both,
}

/// Align every rectangle to a common edge or centre.
///
/// Returns `false` (and leaves the input untouched) when fewer than two
/// rectangles are supplied.
pub fn align(rects: &mut [Geometry], alignment: Alignment) -> bool {
    if rects.len() < 2 {
        return false;
    }

    let count = rects.len() as f64;
    match alignment {
        Alignment::Left => {
            let target = rects.iter().map(|r| r.x).fold(f64::INFINITY, f64::min);
            rects.iter_mut().for_each(|r| r.x = target);
        }
        Alignment::Right => {
            let target = rects.iter().map(Geometry::right).fold(f64::NEG_INFINITY, f64::max);
            rects.iter_mut().for_each(|r| r.x = target - r.width);
        }
        Alignment::Top => {
            let target = rects.iter().map(|r| r.y).fold(f64::INFINITY, f64::min);
            rects.iter_mut().for_each(|r| r.y = target);
        }
        Alignment::Bottom => {
            let target = rects.iter().map(Geometry::bottom).fold(f64::NEG_INFINITY, f64::max);
            rects.iter_mut().for_each(|r| r.y = target - r.height);
        }
        Alignment::CenterHorizontal => {
            let target = rects.iter().map(|r| r.center().x).sum::<f64>() / count;
            rects.iter_mut().for_each(|r| r.x = target - r.width / 2.0);
        }
        Alignment::CenterVertical => {
            let target = rects.iter().map(|r| r.center().y).sum::<f64>() / count;
            rects.iter_mut().for_each(|r| r.y = target - r.height / 2.0);
        }
    }
    true
}

/// Evenly space rectangle centres along an axis.
///
/// The rectangles are ordered by their leading coordinate (stable, so ties
/// keep input order). The first and last keep their positions; every interior
/// centre is moved onto an evenly spaced point between them. Requires at
/// least three rectangles, otherwise returns `false`.
pub fn distribute(rects: &mut [Geometry], distribution: Distribution) -> bool {
    if rects.len() < 3 {
        return false;
    }

    let key = |r: &Geometry| match distribution {
        Distribution::Horizontal => r.x,
        Distribution::Vertical => r.y,
    };
    let mut order: Vec<usize> = (0..rects.len()).collect();
    order.sort_by(|&a, &b| key(&rects[a]).partial_cmp(&key(&rects[b])).unwrap_or(Ordering::Equal));

    let axis_center = |r: &Geometry| match distribution {
        Distribution::Horizontal => r.center().x,
        Distribution::Vertical => r.center().y,
    };
    let first = axis_center(&rects[order[0]]);
    let last = axis_center(&rects[order[order.len() - 1]]);
    let step = (last - first) / (order.len() - 1) as f64;

    for (slot, &index) in order.iter().enumerate().skip(1).take(order.len() - 2) {
        let center = first + step * slot as f64;
        let rect = &mut rects[index];
        match distribution {
            Distribution::Horizontal => rect.x = center - rect.width / 2.0,
            Distribution::Vertical => rect.y = center - rect.height / 2.0,
        }
    }
    true
}

/// Set every rectangle to the largest width and/or height in the set.
pub fn match_size(rects: &mut [Geometry], mode: SizeMatch) -> bool {
    if rects.len() < 2 {
        return false;
    }

    let max_width = rects.iter().map(|r| r.width).fold(f64::NEG_INFINITY, f64::max);
    let max_height = rects.iter().map(|r| r.height).fold(f64::NEG_INFINITY, f64::max);
    for rect in rects.iter_mut() {
        if matches!(mode, SizeMatch::Width | SizeMatch::Both) {
            rect.width = max_width;
        }
        if matches!(mode, SizeMatch::Height | SizeMatch::Both) {
            rect.height = max_height;
        }
    }
    true
}

/// Bounding box of all rectangles, or `None` for an empty input.
pub fn union_bounds<'a>(rects: impl IntoIterator<Item = &'a Geometry>) -> Option<Geometry> {
    let mut result: Option<Rect> = None;
    for rect in rects {
        let bounds = rect.as_rect();
        result = Some(match result {
            Some(r) => r.union(bounds),
            None => bounds,
        });
    }
    result.map(Geometry::from_rect)
}

/// Enforce a minimum width and height.
pub fn clamp_min_size(geometry: Geometry, min_width: f64, min_height: f64) -> Geometry {
    Geometry {
        width: geometry.width.max(min_width),
        height: geometry.height.max(min_height),
        ..geometry
    }
}

/// Keep a rectangle inside `container` minus `padding` on every side.
///
/// The size is shrunk first if it cannot fit, then the position is clamped.
pub fn clamp_to_container(geometry: Geometry, container: Size, padding: f64) -> Geometry {
    let max_width = (container.width - padding * 2.0).max(0.0);
    let max_height = (container.height - padding * 2.0).max(0.0);
    let width = geometry.width.min(max_width);
    let height = geometry.height.min(max_height);
    Geometry {
        x: geometry.x.clamp(padding, padding + max_width - width),
        y: geometry.y.clamp(padding, padding + max_height - height),
        width,
        height,
    }
}

/// Decide whether a selection box drawn from `origin` to `current` selects
/// an element.
///
/// A box below [`MIN_BOX_EXTENT`] on both axes is a click: it matches only
/// when `origin` lies inside the element. Otherwise any positive-area overlap
/// or full containment (either direction) matches.
pub fn box_hits(origin: Point, current: Point, element: &Geometry) -> bool {
    if is_click(origin, current) {
        return element.contains(origin);
    }
    let selection = Geometry::from_corners(origin, current);
    selection.intersects(element) || selection.contains_rect(element) || element.contains_rect(&selection)
}

/// True when the drag from `origin` to `current` is too small to be a box.
pub fn is_click(origin: Point, current: Point) -> bool {
    (current.x - origin.x).abs() < MIN_BOX_EXTENT && (current.y - origin.y).abs() < MIN_BOX_EXTENT
}
