#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{ImageProps, TextAlign, TextProps};

fn image_at(x: f64, y: f64, w: f64, h: f64) -> Drawable {
    Drawable::image(ImageProps { src: "sticker.png".into(), width: w, height: h }, x, y, 1.0)
}

fn text_at(x: f64, y: f64) -> Drawable {
    Drawable::text(
        TextProps {
            text: "hello".into(),
            font_family: "Impact".into(),
            font_size: 20,
            fill: "#FFFFFF".into(),
            stroke: "#000000".into(),
            stroke_width: 1.0,
            text_align: TextAlign::Center,
        },
        x,
        y,
    )
}

fn background(w: f64, h: f64) -> Drawable {
    let mut bg = image_at(w / 2.0, h / 2.0, w, h);
    bg.is_background = true;
    bg.selectable = false;
    bg
}

// =============================================================
// ResizeAnchor
// =============================================================

#[test]
fn corners_are_corners() {
    assert!(ResizeAnchor::Ne.is_corner());
    assert!(ResizeAnchor::Sw.is_corner());
    assert!(!ResizeAnchor::N.is_corner());
    assert!(!ResizeAnchor::W.is_corner());
}

#[test]
fn anchor_directions() {
    assert_eq!(ResizeAnchor::Se.direction(), (1.0, 1.0));
    assert_eq!(ResizeAnchor::W.direction(), (-1.0, 0.0));
}

#[test]
fn text_exposes_only_corner_handles() {
    let handles = handles_for(&text_at(0.0, 0.0));
    assert_eq!(handles.len(), 4);
    assert!(handles.iter().all(|a| a.is_corner()));
}

#[test]
fn image_exposes_all_handles() {
    assert_eq!(handles_for(&image_at(0.0, 0.0, 10.0, 10.0)).len(), 8);
}

// =============================================================
// Geometry
// =============================================================

#[test]
fn to_local_unrotated_is_offset() {
    let img = image_at(100.0, 50.0, 20.0, 20.0);
    assert_eq!(to_local(Point::new(110.0, 45.0), &img), Point::new(10.0, -5.0));
}

#[test]
fn to_local_undoes_rotation() {
    let mut img = image_at(0.0, 0.0, 20.0, 20.0);
    img.rotation = 90.0;
    let local = to_local(Point::new(0.0, 10.0), &img);
    assert!((local.x - 10.0).abs() < 1e-9);
    assert!(local.y.abs() < 1e-9);
}

#[test]
fn contains_respects_scale() {
    let mut img = image_at(100.0, 100.0, 20.0, 20.0);
    let metrics = MetricsCache::new();
    assert!(!contains(Point::new(115.0, 100.0), &img, &metrics));
    img.scale_x = 2.0;
    assert!(contains(Point::new(115.0, 100.0), &img, &metrics));
}

#[test]
fn contains_uses_measured_text_bounds() {
    let text = text_at(0.0, 0.0);
    let mut metrics = MetricsCache::new();
    metrics.insert(text.id, Size::new(200.0, 20.0));
    assert!(contains(Point::new(90.0, 0.0), &text, &metrics));
}

// =============================================================
// hit_test
// =============================================================

#[test]
fn hit_empty_scene_is_none() {
    let scene = Scene::new(800.0, 450.0);
    assert!(hit_test(Point::new(1.0, 1.0), &scene, &MetricsCache::new(), &Camera::default(), None).is_none());
}

#[test]
fn background_is_never_hit() {
    let mut scene = Scene::new(800.0, 450.0);
    scene.set_background(background(800.0, 450.0));
    assert!(hit_test(Point::new(400.0, 225.0), &scene, &MetricsCache::new(), &Camera::default(), None).is_none());
}

#[test]
fn topmost_object_wins() {
    let mut scene = Scene::new(800.0, 450.0);
    let lower = image_at(100.0, 100.0, 50.0, 50.0);
    let upper = image_at(110.0, 110.0, 50.0, 50.0);
    let upper_id = upper.id;
    scene.push(lower);
    scene.push(upper);
    let hit = hit_test(Point::new(105.0, 105.0), &scene, &MetricsCache::new(), &Camera::default(), None);
    assert_eq!(hit, Some(Hit { object_id: upper_id, part: HitPart::Body }));
}

#[test]
fn selected_handle_beats_body() {
    let mut scene = Scene::new(800.0, 450.0);
    let img = image_at(100.0, 100.0, 40.0, 40.0);
    let id = img.id;
    scene.push(img);
    let hit = hit_test(Point::new(120.0, 120.0), &scene, &MetricsCache::new(), &Camera::default(), Some(id));
    assert_eq!(hit, Some(Hit { object_id: id, part: HitPart::ResizeHandle(ResizeAnchor::Se) }));
}

#[test]
fn handles_ignored_without_selection() {
    let mut scene = Scene::new(800.0, 450.0);
    let img = image_at(100.0, 100.0, 40.0, 40.0);
    let id = img.id;
    scene.push(img);
    let hit = hit_test(Point::new(120.0, 120.0), &scene, &MetricsCache::new(), &Camera::default(), None);
    assert_eq!(hit, Some(Hit { object_id: id, part: HitPart::Body }));
}

#[test]
fn text_edge_handle_position_is_not_a_handle() {
    let mut scene = Scene::new(800.0, 450.0);
    let text = text_at(100.0, 100.0);
    let id = text.id;
    let mut metrics = MetricsCache::new();
    metrics.insert(id, Size::new(100.0, 20.0));
    scene.push(text);
    // East edge midpoint: a handle on images, plain body on text.
    let hit = hit_test(Point::new(150.0, 100.0), &scene, &metrics, &Camera::default(), Some(id));
    assert_eq!(hit, Some(Hit { object_id: id, part: HitPart::Body }));
}

#[test]
fn handle_radius_shrinks_with_zoom_in() {
    let mut scene = Scene::new(800.0, 450.0);
    let img = image_at(100.0, 100.0, 40.0, 40.0);
    let id = img.id;
    scene.push(img);
    let far = Point::new(126.0, 126.0);
    let zoomed_out = Camera { zoom: 0.5 };
    let zoomed_in = Camera { zoom: 4.0 };
    assert!(matches!(
        hit_test(far, &scene, &MetricsCache::new(), &zoomed_out, Some(id)),
        Some(Hit { part: HitPart::ResizeHandle(ResizeAnchor::Se), .. })
    ));
    assert!(hit_test(far, &scene, &MetricsCache::new(), &zoomed_in, Some(id)).is_none());
}
