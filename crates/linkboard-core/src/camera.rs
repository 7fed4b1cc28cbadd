//! Scene pan/zoom transform.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom level shown as "100%" in the UI.
pub const DEFAULT_ZOOM_PERCENT: f64 = 100.0;
/// Zoom change per wheel notch, in percent.
pub const WHEEL_ZOOM_STEP: f64 = 5.0;
/// Zoom change per zoom button press, in percent.
pub const BUTTON_ZOOM_STEP: f64 = 10.0;

/// Camera manages the view transform for the scene.
///
/// It converts between world coordinates (card layout) and screen
/// coordinates (where endpoints are registered and the pointer lives).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan)
    pub offset: Vec2,
    /// Current zoom level in percent
    pub zoom_percent: f64,
    /// Minimum allowed zoom level in percent
    pub min_zoom_percent: f64,
    /// Maximum allowed zoom level in percent
    pub max_zoom_percent: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom_percent: DEFAULT_ZOOM_PERCENT,
            min_zoom_percent: 10.0,
            max_zoom_percent: 300.0,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zoom as a scale factor (1.0 at 100%).
    pub fn scale(&self) -> f64 {
        self.zoom_percent / 100.0
    }

    /// World to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale())
    }

    /// Screen to world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale()) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Change the zoom by `amount` percent, clamped to the allowed range.
    pub fn adjust_zoom(&mut self, amount: f64) {
        self.zoom_percent =
            (self.zoom_percent + amount).clamp(self.min_zoom_percent, self.max_zoom_percent);
    }

    /// Apply a wheel event. Scrolling down (positive delta) zooms out.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y > 0.0 {
            self.adjust_zoom(-WHEEL_ZOOM_STEP);
        } else {
            self.adjust_zoom(WHEEL_ZOOM_STEP);
        }
    }

    pub fn zoom_in(&mut self) {
        self.adjust_zoom(BUTTON_ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.adjust_zoom(-BUTTON_ZOOM_STEP);
    }

    /// Set the zoom, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, zoom_percent: f64) {
        let new_zoom = zoom_percent.clamp(self.min_zoom_percent, self.max_zoom_percent);
        if (new_zoom - self.zoom_percent).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom_percent = new_zoom;

        // Adjust offset so world_point stays at screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom_percent = DEFAULT_ZOOM_PERCENT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_offset() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(50.0, 100.0);
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_world_to_screen_with_zoom() {
        let mut camera = Camera::new();
        camera.zoom_percent = 200.0;
        let screen = camera.world_to_screen(Point::new(50.0, 100.0));
        assert!((screen.x - 100.0).abs() < f64::EPSILON);
        assert!((screen.y - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        camera.zoom_percent = 150.0;

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_wheel_steps_and_clamps() {
        let mut camera = Camera::new();
        camera.wheel(1.0);
        assert!((camera.zoom_percent - 95.0).abs() < f64::EPSILON);
        camera.wheel(-1.0);
        camera.wheel(-1.0);
        assert!((camera.zoom_percent - 105.0).abs() < f64::EPSILON);

        for _ in 0..100 {
            camera.zoom_out();
        }
        assert!((camera.zoom_percent - 10.0).abs() < f64::EPSILON);
        for _ in 0..100 {
            camera.zoom_in();
        }
        assert!((camera.zoom_percent - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut camera = Camera::new();
        let anchor = Point::new(200.0, 100.0);
        let world = camera.screen_to_world(anchor);
        camera.zoom_at(anchor, 250.0);
        let back = camera.world_to_screen(world);
        assert!((back.x - anchor.x).abs() < 1e-9);
        assert!((back.y - anchor.y).abs() < 1e-9);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert!((camera.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((camera.offset.y - 20.0).abs() < f64::EPSILON);
    }
}
