//! Hit-testing: which drawable, and which part of it, lies under a point.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point, Size};
use crate::consts::HANDLE_RADIUS_PX;
use crate::doc::{Drawable, DrawableId, MetricsCache, Scene};

/// Which part of an object was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

const ALL_ANCHORS: [ResizeAnchor; 8] = [
    ResizeAnchor::N,
    ResizeAnchor::Ne,
    ResizeAnchor::E,
    ResizeAnchor::Se,
    ResizeAnchor::S,
    ResizeAnchor::Sw,
    ResizeAnchor::W,
    ResizeAnchor::Nw,
];

const CORNER_ANCHORS: [ResizeAnchor; 4] = [ResizeAnchor::Ne, ResizeAnchor::Se, ResizeAnchor::Sw, ResizeAnchor::Nw];

impl ResizeAnchor {
    #[must_use]
    pub fn is_corner(self) -> bool {
        matches!(self, Self::Ne | Self::Se | Self::Sw | Self::Nw)
    }

    /// Direction of the handle from the object center, each axis in `-1..=1`.
    #[must_use]
    pub fn direction(self) -> (f64, f64) {
        match self {
            Self::N => (0.0, -1.0),
            Self::Ne => (1.0, -1.0),
            Self::E => (1.0, 0.0),
            Self::Se => (1.0, 1.0),
            Self::S => (0.0, 1.0),
            Self::Sw => (-1.0, 1.0),
            Self::W => (-1.0, 0.0),
            Self::Nw => (-1.0, -1.0),
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub object_id: DrawableId,
    pub part: HitPart,
}

/// Resize handles a drawable exposes. Text only gets corners so every
/// resize is uniform.
#[must_use]
pub fn handles_for(drawable: &Drawable) -> &'static [ResizeAnchor] {
    if drawable.is_text() { &CORNER_ANCHORS } else { &ALL_ANCHORS }
}

/// Express `world_pt` in the drawable's local frame: origin at its center,
/// axes rotated with it.
#[must_use]
pub fn to_local(world_pt: Point, drawable: &Drawable) -> Point {
    let dx = world_pt.x - drawable.x;
    let dy = world_pt.y - drawable.y;
    let (sin, cos) = (-drawable.rotation.to_radians()).sin_cos();
    Point::new(dx * cos - dy * sin, dx * sin + dy * cos)
}

fn half_extent(drawable: &Drawable, metrics: &MetricsCache) -> Size {
    drawable
        .display_size(metrics.get(&drawable.id).copied())
        .scaled(0.5)
}

/// Local-frame position of a handle.
#[must_use]
pub fn handle_position(drawable: &Drawable, metrics: &MetricsCache, anchor: ResizeAnchor) -> Point {
    let half = half_extent(drawable, metrics);
    let (sx, sy) = anchor.direction();
    Point::new(sx * half.width.abs(), sy * half.height.abs())
}

/// Test which object (if any) is under `world_pt`, checking the selected
/// object's handles first. Objects that are not selectable never hit.
#[must_use]
pub fn hit_test(
    world_pt: Point,
    scene: &Scene,
    metrics: &MetricsCache,
    camera: &Camera,
    selected_id: Option<DrawableId>,
) -> Option<Hit> {
    let radius = camera.screen_dist_to_world(HANDLE_RADIUS_PX);

    if let Some(selected) = selected_id.and_then(|id| scene.get(&id)).filter(|d| d.selectable) {
        let local = to_local(world_pt, selected);
        for &anchor in handles_for(selected) {
            if local.distance(handle_position(selected, metrics, anchor)) <= radius {
                return Some(Hit { object_id: selected.id, part: HitPart::ResizeHandle(anchor) });
            }
        }
    }

    scene
        .top_down()
        .filter(|d| d.selectable)
        .find(|d| contains(world_pt, d, metrics))
        .map(|d| Hit { object_id: d.id, part: HitPart::Body })
}

/// Whether `world_pt` lies inside the drawable's rotated bounding box.
#[must_use]
pub fn contains(world_pt: Point, drawable: &Drawable, metrics: &MetricsCache) -> bool {
    let local = to_local(world_pt, drawable);
    let half = half_extent(drawable, metrics);
    local.x.abs() <= half.width.abs() && local.y.abs() <= half.height.abs()
}
