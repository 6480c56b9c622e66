//! Camera module for pan/zoom transforms between device pixels and page units.

use crate::geometry::Geometry;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Default device resolution.
pub const DEFAULT_DPI: f64 = 96.0;

/// Camera manages the view transform for the page canvas.
///
/// Elements live in millimetres. The camera maps them to device pixels
/// through the DPI factor and the user zoom, then applies the pan offset
/// (in pixels).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset in device pixels (pan)
    pub offset: Vec2,
    /// User zoom level (1.0 = 100%)
    pub zoom: f64,
    /// Device resolution in dots per inch
    pub dpi: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            dpi: DEFAULT_DPI,
            min_zoom: 0.1,
            max_zoom: 8.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.set_dpi(dpi);
        self
    }

    /// Set the device resolution. Non-positive values are ignored.
    pub fn set_dpi(&mut self, dpi: f64) {
        if dpi.is_finite() && dpi > 0.0 {
            self.dpi = dpi;
        }
    }

    /// Device pixels per millimetre at the current zoom.
    pub fn scale(&self) -> f64 {
        self.dpi / MM_PER_INCH * self.zoom
    }

    /// Transform from page millimetres to device pixels.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale())
    }

    /// Transform from device pixels to page millimetres.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a length in millimetres to device pixels (zoom included).
    pub fn mm_to_px(&self, mm: f64) -> f64 {
        mm * self.scale()
    }

    /// Convert a length in device pixels to millimetres (zoom included).
    pub fn px_to_mm(&self, px: f64) -> f64 {
        px / self.scale()
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set the zoom level directly, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Keep world_point under screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Logical rectangle visible in a screen of the given pixel size.
    pub fn visible_rect(&self, screen_size: Size) -> Geometry {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(screen_size.width, screen_size.height));
        Geometry::from_corners(top_left, bottom_right)
    }

    /// Reset pan and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Fit the camera to show `bounds` inside a screen of `viewport` pixels.
    pub fn fit_to_bounds(&mut self, bounds: Geometry, viewport: Size, padding: f64) {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            self.reset();
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let base = self.dpi / MM_PER_INCH;
        let zoom_x = padded.width / (bounds.width * base);
        let zoom_y = padded.height / (bounds.height * base);
        self.zoom = zoom_x.min(zoom_y).clamp(self.min_zoom, self.max_zoom);

        let center = bounds.center();
        let scale = self.scale();
        self.offset = Vec2::new(
            viewport.width / 2.0 - center.x * scale,
            viewport.height / 2.0 - center.y * scale,
        );
    }
}
