//! Shared numeric constants for the canvas crate.

// ── Layout ──────────────────────────────────────────────────────

/// Editor box on desktop layouts, in CSS pixels.
pub const DESKTOP_EDITOR_WIDTH: f64 = 800.0;
pub const DESKTOP_EDITOR_HEIGHT: f64 = 450.0;

/// Editor box on mobile / narrow layouts, in CSS pixels.
pub const MOBILE_EDITOR_WIDTH: f64 = 400.0;
pub const MOBILE_EDITOR_HEIGHT: f64 = 400.0;

// ── Text ────────────────────────────────────────────────────────

/// Font size given to freshly added text.
pub const DEFAULT_FONT_SIZE: u32 = 30;

/// Upper bound accepted by the property bridge.
pub const MAX_FONT_SIZE: u32 = 500;

/// Upper bound for outline width accepted by the property bridge.
pub const MAX_STROKE_WIDTH: f64 = 50.0;

/// Longest font family name accepted by the property bridge.
pub const MAX_FONT_FAMILY_LEN: usize = 64;

/// Line height as a multiple of font size, used when no measured metrics exist.
pub const LINE_HEIGHT_RATIO: f64 = 1.16;

/// Average glyph advance as a multiple of font size, used for estimates.
pub const GLYPH_WIDTH_RATIO: f64 = 0.6;

// ── Clipboard ───────────────────────────────────────────────────

/// Offset applied to a pasted clone, in world units on both axes.
pub const PASTE_OFFSET: f64 = 10.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for resize handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Smallest scale factor a gesture may produce.
pub const MIN_SCALE: f64 = 0.01;
