//! Coordinate helpers: points, sizes, the canvas zoom, and fit math.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative, or not finite.
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    #[must_use]
    pub fn scaled(self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }

    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Canvas zoom. The canvas element is sized in screen pixels and the scene
/// is drawn through this uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point { x: screen.x / self.zoom, y: screen.y / self.zoom }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point { x: world.x * self.zoom, y: world.y * self.zoom }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }
}

/// Largest uniform scale at which `content` still fits inside `bounds`.
///
/// Returns 0 when either size is degenerate.
#[must_use]
pub fn fit_scale(content: Size, bounds: Size) -> f64 {
    if content.is_degenerate() || bounds.is_degenerate() {
        return 0.0;
    }
    (bounds.width / content.width).min(bounds.height / content.height)
}

/// Zoom and canvas size that show `content` inside `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

/// Fit `content` (the background's displayed size) into a `target` box by
/// matching its longer axis and keeping its aspect ratio.
///
/// A 1000×500 background in a 400×400 box yields zoom 0.4 and a 400×200 canvas.
#[must_use]
pub fn fit_viewport(content: Size, target: Size) -> Viewport {
    if content.is_degenerate() {
        return Viewport { zoom: 1.0, width: target.width, height: target.height };
    }
    if content.width >= content.height {
        let zoom = target.width / content.width;
        Viewport { zoom, width: target.width, height: content.height * zoom }
    } else {
        let zoom = target.height / content.height;
        Viewport { zoom, width: content.width * zoom, height: target.height }
    }
}
