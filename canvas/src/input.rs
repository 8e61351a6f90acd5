//! Input model: modifier keys, keys, mouse buttons, the gesture state machine,
//! and the one-slot clipboard.
//!
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up, carrying the context needed to compute incremental updates and
//! to finish the gesture on release. `UiState` is the persistent selection
//! state the renderer and property bridge read.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::consts::PASTE_OFFSET;
use crate::doc::{Drawable, DrawableId};
use crate::hit::ResizeAnchor;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// The platform shortcut modifier: Command on macOS, Ctrl elsewhere.
    #[must_use]
    pub fn shortcut(self) -> bool {
        self.meta || self.ctrl
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"c"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }

    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        let mut chars = self.0.chars();
        matches!((chars.next(), chars.next()), (Some(k), None) if k.eq_ignore_ascii_case(&c))
    }
}

/// Where a key event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyTarget {
    /// The canvas or page body; editor shortcuts apply.
    #[default]
    Canvas,
    /// A text input element owns focus; editor shortcuts are suppressed.
    TextInput,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// The id of the currently selected object, if any.
    pub selected_id: Option<DrawableId>,
    /// The selected text object is being edited in place.
    pub editing_text: bool,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is moving an existing object across the canvas.
    DraggingObject {
        /// Id of the object being dragged.
        id: DrawableId,
        /// World-space position of the pointer at the previous event.
        last_world: Point,
    },
    /// The user is scaling an object by dragging one of its handles.
    ScalingObject {
        /// Id of the object being scaled.
        id: DrawableId,
        /// Which corner/edge handle is being dragged.
        anchor: ResizeAnchor,
        /// Pointer position in the object's local frame at gesture start.
        start_local: Point,
        /// Scale factors at gesture start.
        orig_scale_x: f64,
        orig_scale_y: f64,
    },
}

/// One-slot clipboard holding an independent snapshot of a drawable.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<Drawable>,
}

impl Clipboard {
    /// Store a deep copy of `drawable`, replacing whatever was held.
    pub fn copy(&mut self, drawable: &Drawable) {
        self.slot = Some(drawable.clone());
    }

    /// A fresh clone of the held drawable, offset from the original.
    #[must_use]
    pub fn paste(&self) -> Option<Drawable> {
        self.slot.as_ref().map(|d| d.duplicate(PASTE_OFFSET, PASTE_OFFSET))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// The held snapshot, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&Drawable> {
        self.slot.as_ref()
    }
}
