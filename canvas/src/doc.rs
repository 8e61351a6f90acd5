//! Scene model: drawables, their properties, and the ordered scene.
//!
//! This module defines the data types that describe what is on the canvas
//! (`Drawable`, `DrawableKind`), the live paint-ordered container that owns
//! them (`Scene`), and the portable JSON form used for storage and reload
//! (`SceneDocument`).
//!
//! Paint order is the position in `Scene::objects` (index 0 is painted first).
//! A background drawable, when present, always sits at index 0 and is never
//! selectable. `Scene` keeps that invariant on every mutation and
//! `Scene::from_document` restores it for documents written elsewhere.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Size;
use crate::consts::{DEFAULT_FONT_SIZE, GLYPH_WIDTH_RATIO, LINE_HEIGHT_RATIO};

/// Unique identifier for a drawable.
pub type DrawableId = Uuid;

/// Measured, unscaled glyph bounds of text drawables, keyed by id.
pub type MetricsCache = HashMap<DrawableId, Size>;

/// Current scene document format version.
pub const FORMAT_VERSION: u32 = 1;

/// Errors raised while reading or writing a scene document.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported scene format version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("scene has {0} background objects; at most one is allowed")]
    MultipleBackgrounds(usize),
}

// =============================================================
// Drawables
// =============================================================

/// Horizontal alignment of text lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
    Justify,
}

impl TextAlign {
    /// Value accepted by the 2D context `textAlign` property.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left | Self::Justify => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Attributes specific to text drawables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    /// Content; may contain `\n` line breaks.
    pub text: String,
    pub font_family: String,
    /// Font size in world units. Always an integer; scale gestures are folded
    /// back into this value.
    pub font_size: u32,
    /// Fill colour as a CSS colour string.
    pub fill: String,
    /// Outline colour as a CSS colour string.
    pub stroke: String,
    /// Outline width in world units.
    pub stroke_width: f64,
    #[serde(default)]
    pub text_align: TextAlign,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "New textbox".into(),
            font_family: "Impact".into(),
            font_size: DEFAULT_FONT_SIZE,
            fill: "#FFFFFF".into(),
            stroke: "#000000".into(),
            stroke_width: 1.0,
            text_align: TextAlign::Center,
        }
    }
}

impl TextProps {
    /// Rough unscaled bounding size, used until real glyph metrics are measured.
    #[must_use]
    pub fn estimated_size(&self) -> Size {
        let size = f64::from(self.font_size);
        let lines: Vec<&str> = self.text.split('\n').collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let (cols, rows) = (longest as f64, lines.len() as f64);
        Size::new(cols * size * GLYPH_WIDTH_RATIO, rows * size * LINE_HEIGHT_RATIO)
    }
}

/// Attributes specific to image drawables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProps {
    /// URL or stored path the pixels are fetched from.
    pub src: String,
    /// Natural pixel width.
    pub width: f64,
    /// Natural pixel height.
    pub height: f64,
}

/// The variant part of a drawable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawableKind {
    Text(TextProps),
    Image(ImageProps),
}

fn unit_scale() -> f64 {
    1.0
}

fn default_selectable() -> bool {
    true
}

/// An addressable object on the canvas.
///
/// `x` / `y` locate the object's center in world coordinates (origin at the
/// canvas top-left). Rotation is clockwise in degrees around that center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub id: DrawableId,
    pub x: f64,
    pub y: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    #[serde(default)]
    pub rotation: f64,
    /// Marks the single bottommost, non-interactive background object.
    #[serde(default)]
    pub is_background: bool,
    /// Whether pointer picks and hit-tests may land on this object.
    #[serde(default = "default_selectable")]
    pub selectable: bool,
    #[serde(flatten)]
    pub kind: DrawableKind,
}

impl Drawable {
    /// Build a selectable text drawable centered at `(x, y)`.
    #[must_use]
    pub fn text(props: TextProps, x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            is_background: false,
            selectable: true,
            kind: DrawableKind::Text(props),
        }
    }

    /// Build a selectable image drawable centered at `(x, y)` with a uniform scale.
    #[must_use]
    pub fn image(props: ImageProps, x: f64, y: f64, scale: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            scale_x: scale,
            scale_y: scale,
            rotation: 0.0,
            is_background: false,
            selectable: true,
            kind: DrawableKind::Image(props),
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, DrawableKind::Text(_))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            DrawableKind::Text(t) => Some(t),
            DrawableKind::Image(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextProps> {
        match &mut self.kind {
            DrawableKind::Text(t) => Some(t),
            DrawableKind::Image(_) => None,
        }
    }

    #[must_use]
    pub fn as_image(&self) -> Option<&ImageProps> {
        match &self.kind {
            DrawableKind::Image(i) => Some(i),
            DrawableKind::Text(_) => None,
        }
    }

    /// Unscaled size. Text uses `measured` glyph bounds when available.
    #[must_use]
    pub fn base_size(&self, measured: Option<Size>) -> Size {
        match &self.kind {
            DrawableKind::Image(img) => Size::new(img.width, img.height),
            DrawableKind::Text(t) => measured.unwrap_or_else(|| t.estimated_size()),
        }
    }

    /// On-canvas size in world units (base size times scale factors).
    #[must_use]
    pub fn display_size(&self, measured: Option<Size>) -> Size {
        let base = self.base_size(measured);
        Size::new(base.width * self.scale_x, base.height * self.scale_y)
    }

    /// Independent copy with a fresh id, shifted by `(dx, dy)`.
    ///
    /// The copy is never a background, so it can be placed anywhere in paint order.
    #[must_use]
    pub fn duplicate(&self, dx: f64, dy: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: self.x + dx,
            y: self.y + dy,
            is_background: false,
            selectable: true,
            ..self.clone()
        }
    }
}

// =============================================================
// Scene
// =============================================================

/// Paint-ordered drawables plus canvas dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    objects: Vec<Drawable>,
    /// Canvas width in CSS pixels.
    pub width: f64,
    /// Canvas height in CSS pixels.
    pub height: f64,
    /// Canvas fill painted beneath every object, if any.
    pub background_fill: Option<String>,
}

impl Scene {
    /// Create an empty scene of the given canvas size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { objects: Vec::new(), width, height, background_fill: None }
    }

    /// All drawables, back to front.
    #[must_use]
    pub fn objects(&self) -> &[Drawable] {
        &self.objects
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &DrawableId) -> Option<&Drawable> {
        self.objects.iter().find(|d| d.id == *id)
    }

    pub fn get_mut(&mut self, id: &DrawableId) -> Option<&mut Drawable> {
        self.objects.iter_mut().find(|d| d.id == *id)
    }

    /// Paint-order position of a drawable (0 = bottom).
    #[must_use]
    pub fn z_index(&self, id: &DrawableId) -> Option<usize> {
        self.objects.iter().position(|d| d.id == *id)
    }

    /// The background drawable, if one is present.
    #[must_use]
    pub fn background(&self) -> Option<&Drawable> {
        self.objects.first().filter(|d| d.is_background)
    }

    #[must_use]
    pub fn has_background(&self) -> bool {
        self.background().is_some()
    }

    /// Add a drawable on top of everything else.
    ///
    /// A background-flagged drawable is routed to [`Scene::set_background`] instead.
    pub fn push(&mut self, drawable: Drawable) {
        if drawable.is_background {
            self.set_background(drawable);
        } else {
            self.objects.push(drawable);
        }
    }

    /// Install `drawable` as the background, replacing any existing one.
    pub fn set_background(&mut self, mut drawable: Drawable) {
        if self.has_background() {
            self.objects.remove(0);
        }
        drawable.is_background = true;
        drawable.selectable = false;
        self.objects.insert(0, drawable);
    }

    /// Remove a drawable, returning it if it was present.
    pub fn remove(&mut self, id: &DrawableId) -> Option<Drawable> {
        let idx = self.z_index(id)?;
        Some(self.objects.remove(idx))
    }

    /// Remove every drawable. Canvas size is left alone.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Move a drawable one step toward the top. Returns false when nothing moved.
    pub fn raise(&mut self, id: &DrawableId) -> bool {
        let Some(idx) = self.z_index(id) else {
            return false;
        };
        if self.objects[idx].is_background || idx + 1 >= self.objects.len() {
            return false;
        }
        self.objects.swap(idx, idx + 1);
        true
    }

    /// Move a drawable one step toward the bottom. Returns false when nothing moved.
    ///
    /// With a background present nothing else may reach index 0.
    pub fn lower(&mut self, id: &DrawableId) -> bool {
        let Some(idx) = self.z_index(id) else {
            return false;
        };
        if self.objects[idx].is_background {
            return false;
        }
        let floor = usize::from(self.has_background());
        if idx <= floor {
            return false;
        }
        self.objects.swap(idx - 1, idx);
        true
    }

    /// Drawables from top to bottom, as hit-testing wants them.
    pub fn top_down(&self) -> impl Iterator<Item = &Drawable> {
        self.objects.iter().rev()
    }

    /// Snapshot the scene as a portable document.
    #[must_use]
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            version: FORMAT_VERSION,
            width: self.width,
            height: self.height,
            background: self.background_fill.clone(),
            objects: self.objects.clone(),
        }
    }

    /// Build a scene from a document, restoring the background invariant.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::MultipleBackgrounds`] if more than one object is
    /// background-flagged, or [`DocError::UnsupportedVersion`] for documents
    /// written by a newer format.
    pub fn from_document(doc: SceneDocument) -> Result<Self, DocError> {
        doc.check_version()?;
        let backgrounds = doc.objects.iter().filter(|d| d.is_background).count();
        if backgrounds > 1 {
            return Err(DocError::MultipleBackgrounds(backgrounds));
        }

        let mut scene = Self::new(doc.width, doc.height);
        scene.background_fill = doc.background;
        for drawable in doc.objects {
            scene.push(drawable);
        }
        Ok(scene)
    }
}

// =============================================================
// SceneDocument
// =============================================================

fn format_version() -> u32 {
    FORMAT_VERSION
}

/// Portable, versioned JSON form of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default = "format_version")]
    pub version: u32,
    pub width: f64,
    pub height: f64,
    /// Canvas fill colour beneath all objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Drawables in paint order, back to front.
    #[serde(default)]
    pub objects: Vec<Drawable>,
}

impl SceneDocument {
    /// Parse and version-check a document.
    ///
    /// # Errors
    ///
    /// Returns a [`DocError`] for malformed JSON or a newer format version.
    pub fn from_json(json: &str) -> Result<Self, DocError> {
        let doc: Self = serde_json::from_str(json)?;
        doc.check_version()?;
        Ok(doc)
    }

    /// Same as [`SceneDocument::from_json`] for raw bytes; invalid UTF-8 is
    /// rejected rather than replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`DocError`] for malformed bytes or a newer format version.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocError> {
        let doc: Self = serde_json::from_slice(bytes)?;
        doc.check_version()?;
        Ok(doc)
    }

    /// Same as [`SceneDocument::from_json`] for an already-parsed value.
    ///
    /// # Errors
    ///
    /// Returns a [`DocError`] for a mismatched shape or a newer format version.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DocError> {
        let doc: Self = serde_json::from_value(value)?;
        doc.check_version()?;
        Ok(doc)
    }

    /// # Errors
    ///
    /// Returns [`DocError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DocError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    ///
    /// Returns [`DocError::Json`] if serialization fails.
    pub fn to_value(&self) -> Result<serde_json::Value, DocError> {
        Ok(serde_json::to_value(self)?)
    }

    /// The background-flagged object, wherever it sits in the list.
    #[must_use]
    pub fn background_object(&self) -> Option<&Drawable> {
        self.objects.iter().find(|d| d.is_background)
    }

    /// Image attributes of every image drawable, for source rewriting.
    pub fn images_mut(&mut self) -> impl Iterator<Item = &mut ImageProps> {
        self.objects.iter_mut().filter_map(|d| match &mut d.kind {
            DrawableKind::Image(img) => Some(img),
            DrawableKind::Text(_) => None,
        })
    }

    fn check_version(&self) -> Result<(), DocError> {
        if self.version > FORMAT_VERSION {
            return Err(DocError::UnsupportedVersion { found: self.version, supported: FORMAT_VERSION });
        }
        Ok(())
    }
}
