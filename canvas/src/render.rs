//! Rendering: draws the scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads engine state and produces pixels; it never mutates the scene.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::Size;
use crate::consts::{HANDLE_RADIUS_PX, LINE_HEIGHT_RATIO};
use crate::doc::{Drawable, DrawableKind, ImageProps, TextAlign, TextProps};
use crate::engine::EngineCore;
use crate::hit;

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;

const SELECTION_COLOUR: &str = "#1E90FF";

/// Painted in place of an image whose pixels have not arrived yet.
const PLACEHOLDER_FILL: &str = "rgba(128, 128, 128, 0.25)";

/// Per-frame inputs that live outside the core.
pub struct Frame<'a> {
    /// Decoded images keyed by drawable `src`.
    pub images: &'a HashMap<String, HtmlImageElement>,
    /// Draw the selection outline and handles. Off for exports.
    pub chrome: bool,
}

/// Draw the full scene: canvas fill, drawables in paint order, then selection UI.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, core: &EngineCore, frame: &Frame<'_>) -> Result<(), JsValue> {
    let zoom = core.camera.zoom;
    let world = core.world_size();

    ctx.set_transform(zoom, 0.0, 0.0, zoom, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, world.width, world.height);
    if let Some(fill) = &core.scene.background_fill {
        ctx.set_fill_style_str(fill);
        ctx.fill_rect(0.0, 0.0, world.width, world.height);
    }

    for d in core.scene.objects() {
        let measured = core.cached_metrics(&d.id);
        match &d.kind {
            DrawableKind::Text(text) => draw_text(ctx, d, text, measured)?,
            DrawableKind::Image(img) => draw_image(ctx, d, img, frame.images.get(&img.src))?,
        }
    }

    if frame.chrome {
        if let Some(selected) = core.selected() {
            let size = selected.display_size(core.cached_metrics(&selected.id));
            draw_selection(ctx, selected, size, core.metrics(), zoom)?;
        }
    }
    Ok(())
}

/// CSS font shorthand for a text drawable.
#[must_use]
pub fn font_string(text: &TextProps) -> String {
    format!("{}px {}", text.font_size, text.font_family)
}

/// Measure the unscaled bounds of a text drawable's lines.
///
/// # Errors
///
/// Returns `Err` if the context rejects the measurement.
pub fn measure_text(ctx: &CanvasRenderingContext2d, text: &TextProps) -> Result<Size, JsValue> {
    ctx.save();
    ctx.set_font(&font_string(text));
    let mut widest: f64 = 0.0;
    let mut rows = 0_u32;
    for line in text.text.split('\n') {
        widest = widest.max(ctx.measure_text(line)?.width());
        rows += 1;
    }
    ctx.restore();
    let line_height = f64::from(text.font_size) * LINE_HEIGHT_RATIO;
    Ok(Size::new(widest + text.stroke_width, f64::from(rows) * line_height))
}

// =============================================================
// Drawables
// =============================================================

fn draw_text(
    ctx: &CanvasRenderingContext2d,
    d: &Drawable,
    text: &TextProps,
    measured: Option<Size>,
) -> Result<(), JsValue> {
    let base = d.base_size(measured);
    let line_height = f64::from(text.font_size) * LINE_HEIGHT_RATIO;
    let lines: Vec<&str> = text.text.split('\n').collect();
    let x = match text.text_align {
        TextAlign::Left | TextAlign::Justify => -base.width / 2.0,
        TextAlign::Center => 0.0,
        TextAlign::Right => base.width / 2.0,
    };

    ctx.save();
    translate_and_rotate(ctx, d)?;
    ctx.scale(d.scale_x, d.scale_y)?;
    ctx.set_font(&font_string(text));
    ctx.set_text_align(text.text_align.as_css());
    ctx.set_text_baseline("middle");
    ctx.set_line_join("round");
    ctx.set_fill_style_str(&text.fill);
    ctx.set_stroke_style_str(&text.stroke);
    ctx.set_line_width(text.stroke_width);

    let mut y = -base.height / 2.0 + line_height / 2.0;
    for line in lines {
        if text.stroke_width > 0.0 {
            ctx.stroke_text(line, x, y)?;
        }
        ctx.fill_text(line, x, y)?;
        y += line_height;
    }
    ctx.restore();
    Ok(())
}

fn draw_image(
    ctx: &CanvasRenderingContext2d,
    d: &Drawable,
    img: &ImageProps,
    pixels: Option<&HtmlImageElement>,
) -> Result<(), JsValue> {
    let (w, h) = (img.width, img.height);

    ctx.save();
    translate_and_rotate(ctx, d)?;
    ctx.scale(d.scale_x, d.scale_y)?;
    match pixels {
        Some(el) => ctx.draw_image_with_html_image_element_and_dw_and_dh(el, -w / 2.0, -h / 2.0, w, h)?,
        None => {
            ctx.set_fill_style_str(PLACEHOLDER_FILL);
            ctx.fill_rect(-w / 2.0, -h / 2.0, w, h);
        }
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Selection UI
// =============================================================

fn draw_selection(
    ctx: &CanvasRenderingContext2d,
    d: &Drawable,
    size: Size,
    metrics: &crate::doc::MetricsCache,
    zoom: f64,
) -> Result<(), JsValue> {
    let dash_world = SELECTION_DASH_PX / zoom;
    let handle_world = HANDLE_RADIUS_PX / zoom;

    ctx.save();
    translate_and_rotate(ctx, d)?;
    ctx.set_stroke_style_str(SELECTION_COLOUR);
    ctx.set_line_width(1.0 / zoom);

    let dash_array = js_sys::Array::new();
    dash_array.push(&dash_world.into());
    dash_array.push(&dash_world.into());
    ctx.set_line_dash(&dash_array)?;
    ctx.stroke_rect(-size.width / 2.0, -size.height / 2.0, size.width, size.height);
    ctx.set_line_dash(&js_sys::Array::new())?;

    // Handles sit in the object's local frame so they rotate with it.
    ctx.set_fill_style_str("#fff");
    for &anchor in hit::handles_for(d) {
        let pos = hit::handle_position(d, metrics, anchor);
        let (x, y, side) = (pos.x - handle_world / 2.0, pos.y - handle_world / 2.0, handle_world);
        ctx.fill_rect(x, y, side, side);
        ctx.stroke_rect(x, y, side, side);
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

/// Translate to the drawable's center and rotate by its rotation angle.
fn translate_and_rotate(ctx: &CanvasRenderingContext2d, d: &Drawable) -> Result<(), JsValue> {
    ctx.translate(d.x, d.y)?;
    ctx.rotate(d.rotation.to_radians())?;
    Ok(())
}
