//! Selection/property bridge: a plain snapshot of the selected drawable's
//! editable attributes, and the closed set of edits the toolbar may apply.
//!
//! The snapshot is a projection, never a second source of truth. The engine
//! re-takes it on every selection transition and after every edit.

#[cfg(test)]
#[path = "bridge_test.rs"]
mod bridge_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FONT_FAMILY_LEN, MAX_FONT_SIZE, MAX_STROKE_WIDTH};
use crate::doc::{Drawable, DrawableId, DrawableKind, TextAlign, TextProps};

/// Rejected attribute edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttributeError {
    #[error("text attributes cannot be applied to an image")]
    NotText,
    #[error("font size {0} is outside 1..={max}", max = MAX_FONT_SIZE)]
    FontSize(u32),
    #[error("font family must be 1..={max} characters", max = MAX_FONT_FAMILY_LEN)]
    FontFamily,
    #[error("`{0}` is not a supported colour")]
    Colour(String),
    #[error("stroke width {0} is outside 0..={max}", max = MAX_STROKE_WIDTH)]
    StrokeWidth(f64),
}

/// Text attributes exposed to the toolbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAttributes {
    pub font_family: String,
    pub font_size: u32,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub text_align: TextAlign,
}

impl From<&TextProps> for TextAttributes {
    fn from(t: &TextProps) -> Self {
        Self {
            font_family: t.font_family.clone(),
            font_size: t.font_size,
            fill: t.fill.clone(),
            stroke: t.stroke.clone(),
            stroke_width: t.stroke_width,
            text_align: t.text_align,
        }
    }
}

/// Read-only projection of the selected drawable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    pub id: DrawableId,
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub z_index: usize,
    /// Present only for text drawables.
    pub text: Option<TextAttributes>,
}

impl AttributeSnapshot {
    #[must_use]
    pub fn capture(drawable: &Drawable, z_index: usize) -> Self {
        Self {
            id: drawable.id,
            x: drawable.x,
            y: drawable.y,
            scale_x: drawable.scale_x,
            scale_y: drawable.scale_y,
            rotation: drawable.rotation,
            z_index,
            text: drawable.as_text().map(TextAttributes::from),
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}

/// A partial edit. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}

impl AttributeUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether applying this edit changes how glyphs measure.
    #[must_use]
    pub fn affects_metrics(&self) -> bool {
        self.font_family.is_some() || self.font_size.is_some() || self.stroke_width.is_some()
    }

    /// Check every present field without touching any drawable.
    ///
    /// # Errors
    ///
    /// Returns the first [`AttributeError`] found.
    pub fn validate(&self) -> Result<(), AttributeError> {
        if let Some(family) = &self.font_family {
            let len = family.trim().chars().count();
            if len == 0 || len > MAX_FONT_FAMILY_LEN {
                return Err(AttributeError::FontFamily);
            }
        }
        if let Some(size) = self.font_size {
            if size == 0 || size > MAX_FONT_SIZE {
                return Err(AttributeError::FontSize(size));
            }
        }
        for colour in [&self.fill, &self.stroke].into_iter().flatten() {
            if !is_valid_colour(colour) {
                return Err(AttributeError::Colour(colour.clone()));
            }
        }
        if let Some(width) = self.stroke_width {
            if !width.is_finite() || !(0.0..=MAX_STROKE_WIDTH).contains(&width) {
                return Err(AttributeError::StrokeWidth(width));
            }
        }
        Ok(())
    }

    /// Validate, then write the present fields into `drawable`.
    ///
    /// Nothing is written when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NotText`] for a non-empty edit on an image,
    /// or the validation error.
    pub fn apply(&self, drawable: &mut Drawable) -> Result<(), AttributeError> {
        if self.is_empty() {
            return Ok(());
        }
        self.validate()?;
        let DrawableKind::Text(text) = &mut drawable.kind else {
            return Err(AttributeError::NotText);
        };
        if let Some(family) = &self.font_family {
            text.font_family = family.trim().to_string();
        }
        if let Some(size) = self.font_size {
            text.font_size = size;
        }
        if let Some(fill) = &self.fill {
            text.fill.clone_from(fill);
        }
        if let Some(stroke) = &self.stroke {
            text.stroke.clone_from(stroke);
        }
        if let Some(width) = self.stroke_width {
            text.stroke_width = width;
        }
        if let Some(align) = self.text_align {
            text.text_align = align;
        }
        Ok(())
    }
}

/// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` and `transparent`.
#[must_use]
pub fn is_valid_colour(value: &str) -> bool {
    if value.eq_ignore_ascii_case("transparent") {
        return true;
    }
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}
