//! Scene host: the editor state machine behind the canvas.
//!
//! `EngineCore` owns the scene, selection, clipboard, gesture state and the
//! background-load generation. It has no browser dependencies so every
//! behavior can be exercised natively. `Engine` pairs it with the canvas
//! element, its 2D context and the decoded images the renderer paints.
//!
//! Mutations queue [`Action`]s for the host. Input handlers return the queue
//! directly; programmatic operations leave it for [`EngineCore::take_actions`].

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::{HashMap, HashSet};

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::bridge::{AttributeError, AttributeSnapshot, AttributeUpdate};
use crate::camera::{Camera, Point, Size, fit_scale, fit_viewport};
use crate::consts::{
    DESKTOP_EDITOR_HEIGHT, DESKTOP_EDITOR_WIDTH, MAX_FONT_SIZE, MIN_SCALE, MOBILE_EDITOR_HEIGHT,
    MOBILE_EDITOR_WIDTH,
};
use crate::doc::{DocError, Drawable, DrawableId, ImageProps, MetricsCache, Scene, SceneDocument, TextProps};
use crate::export::{EXPORT_QUALITY, ExportedImage, RasterError, RasterFormat};
use crate::hit::{self, Hit, HitPart, ResizeAnchor};
use crate::input::{Button, Clipboard, InputState, Key, KeyTarget, Modifiers, UiState};
use crate::render;

// =============================================================
// Types
// =============================================================

/// Events queued for the host after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Nothing was selected and now something is.
    SelectionCreated(AttributeSnapshot),
    /// The selection moved from one drawable to another.
    SelectionUpdated(AttributeSnapshot),
    /// The selection became empty.
    SelectionCleared,
    /// The selected drawable changed; the toolbar should re-read it.
    AttributesRefreshed(AttributeSnapshot),
    ObjectAdded(DrawableId),
    ObjectRemoved(DrawableId),
    ObjectModified(DrawableId),
    /// The host should open an inline text editor over this drawable.
    EditTextRequested { id: DrawableId, text: String },
    RenderNeeded,
}

/// Which editor box the canvas is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Desktop,
    /// Narrow viewports: the scene is zoomed to fit instead of resized.
    Mobile,
}

impl Layout {
    #[must_use]
    pub fn editor_box(self) -> Size {
        match self {
            Self::Desktop => Size::new(DESKTOP_EDITOR_WIDTH, DESKTOP_EDITOR_HEIGHT),
            Self::Mobile => Size::new(MOBILE_EDITOR_WIDTH, MOBILE_EDITOR_HEIGHT),
        }
    }
}

/// A decoded image: where it came from and its natural pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub src: String,
    pub width: f64,
    pub height: f64,
}

impl ImageInfo {
    #[must_use]
    pub fn new(src: impl Into<String>, width: f64, height: f64) -> Self {
        Self { src: src.into(), width, height }
    }

    #[must_use]
    pub fn natural_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Identifies one background load. Only the most recent ticket may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Result of completing a background load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The background was mounted with this id.
    Applied(DrawableId),
    /// A newer load started first; the completion was discarded.
    Stale,
}

/// What the host still has to do after [`EngineCore::load_scene`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneLoad {
    /// The document carried its own background; nothing left to fetch.
    Ready,
    /// Fetch `src` and pass the result to [`EngineCore::finish_background_load`].
    FetchBackground { ticket: LoadTicket, src: String },
    /// No background in the document and no fallback source.
    NoBackground,
}

/// Layer-order step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// The canvas surface could not be brought up.
#[derive(Debug, thiserror::Error)]
#[error("canvas initialization failed: {0}")]
pub struct InitError(pub String);

/// An image or scene could not be loaded. The scene is left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("canvas is not initialized")]
    NotInitialized,
    #[error("image `{src}` has no decodable pixels")]
    Decode { src: String },
    #[error("failed to fetch `{src}`: {reason}")]
    Fetch { src: String, reason: String },
    #[error(transparent)]
    Doc(#[from] DocError),
}

/// An operation needed a selected drawable and there was none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no drawable is selected")]
pub struct NoSelection;

/// Why an attribute update was not applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    NoSelection(#[from] NoSelection),
    #[error(transparent)]
    Invalid(#[from] AttributeError),
}

// =============================================================
// EngineCore
// =============================================================

/// Core engine state: all logic that doesn't depend on the canvas element.
#[derive(Debug, Clone)]
pub struct EngineCore {
    pub scene: Scene,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub layout: Layout,
    clipboard: Clipboard,
    metrics: MetricsCache,
    snapshot: Option<AttributeSnapshot>,
    generation: u64,
    actions: Vec<Action>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}

impl EngineCore {
    /// An empty scene sized to the layout's editor box.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        let editor = layout.editor_box();
        Self {
            scene: Scene::new(editor.width, editor.height),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            layout,
            clipboard: Clipboard::default(),
            metrics: MetricsCache::new(),
            snapshot: None,
            generation: 0,
            actions: Vec::new(),
        }
    }

    /// Drain queued host events.
    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    // --- Queries ---

    /// True when the scene holds no drawables at all.
    #[must_use]
    pub fn is_canvas_empty(&self) -> bool {
        self.scene.is_empty()
    }

    #[must_use]
    pub fn object(&self, id: &DrawableId) -> Option<&Drawable> {
        self.scene.get(id)
    }

    /// Scene extent in world units.
    #[must_use]
    pub fn world_size(&self) -> Size {
        Size::new(self.scene.width, self.scene.height)
    }

    /// Canvas element size in CSS pixels.
    #[must_use]
    pub fn canvas_size(&self) -> Size {
        self.world_size().scaled(self.camera.zoom)
    }

    #[must_use]
    pub fn selection(&self) -> Option<DrawableId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Drawable> {
        self.ui.selected_id.and_then(|id| self.scene.get(&id))
    }

    /// Attribute projection of the selection, as of the last transition or edit.
    #[must_use]
    pub fn snapshot(&self) -> Option<&AttributeSnapshot> {
        self.snapshot.as_ref()
    }

    #[must_use]
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Image sources still needed by the scene or the clipboard.
    #[must_use]
    pub fn referenced_images(&self) -> HashSet<&str> {
        self.scene
            .objects()
            .iter()
            .chain(self.clipboard.peek())
            .filter_map(Drawable::as_image)
            .map(|img| img.src.as_str())
            .collect()
    }

    // --- Background and scene loading ---

    /// Start a background load for `src`. Any load already in flight becomes stale.
    pub fn begin_background_load(&mut self, src: &str) -> LoadTicket {
        self.generation += 1;
        log::debug!("background load #{} started for {src}", self.generation);
        LoadTicket(self.generation)
    }

    /// Apply the result of a fetch started with [`EngineCore::begin_background_load`].
    ///
    /// On success every existing drawable is replaced by the fitted background.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or a [`LoadError`] if the image cannot be
    /// mounted. The scene is untouched in both cases.
    pub fn finish_background_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<ImageInfo, LoadError>,
    ) -> Result<LoadOutcome, LoadError> {
        if ticket.0 != self.generation {
            log::debug!("discarding stale background load #{} (latest #{})", ticket.0, self.generation);
            return Ok(LoadOutcome::Stale);
        }
        let info = result?;
        self.mount_background(info).map(LoadOutcome::Applied)
    }

    fn mount_background(&mut self, info: ImageInfo) -> Result<DrawableId, LoadError> {
        if self.world_size().is_degenerate() {
            return Err(LoadError::NotInitialized);
        }
        let natural = info.natural_size();
        if natural.is_degenerate() {
            return Err(LoadError::Decode { src: info.src });
        }

        let scale = fit_scale(natural, self.layout.editor_box());
        let display = natural.scaled(scale);
        let center = display.center();
        let background = Drawable::image(
            ImageProps { src: info.src, width: info.width, height: info.height },
            center.x,
            center.y,
            scale,
        );
        let id = background.id;

        self.reset_objects();
        self.scene.width = display.width;
        self.scene.height = display.height;
        self.scene.set_background(background);
        self.apply_viewport();
        self.actions.push(Action::ObjectAdded(id));
        self.actions.push(Action::RenderNeeded);
        Ok(id)
    }

    /// Replace the scene with `doc`.
    ///
    /// Without a background object, `fallback_src` (the template's raster URL)
    /// is returned as a background fetch to perform. Any in-flight background
    /// load becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Doc`] if the document is rejected; the current
    /// scene is kept.
    pub fn load_scene(&mut self, doc: SceneDocument, fallback_src: Option<&str>) -> Result<SceneLoad, LoadError> {
        let mut scene = Scene::from_document(doc)?;
        self.generation += 1;

        if Size::new(scene.width, scene.height).is_degenerate() {
            let editor = self.layout.editor_box();
            scene.width = editor.width;
            scene.height = editor.height;
        }
        self.reset_objects();
        self.scene = scene;
        self.camera = Camera::default();
        self.actions.extend(self.scene.objects().iter().map(|d| Action::ObjectAdded(d.id)));
        self.actions.push(Action::RenderNeeded);

        if self.scene.has_background() {
            self.apply_viewport();
            return Ok(SceneLoad::Ready);
        }
        match fallback_src.filter(|src| !src.is_empty()) {
            Some(src) => {
                let ticket = self.begin_background_load(src);
                Ok(SceneLoad::FetchBackground { ticket, src: src.to_string() })
            }
            None => Ok(SceneLoad::NoBackground),
        }
    }

    /// Parse `json` and load it. See [`EngineCore::load_scene`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Doc`] for malformed or unsupported documents.
    pub fn load_scene_json(&mut self, json: &str, fallback_src: Option<&str>) -> Result<SceneLoad, LoadError> {
        let doc = SceneDocument::from_json(json)?;
        self.load_scene(doc, fallback_src)
    }

    /// Size the canvas around the background.
    ///
    /// Desktop: canvas equals the background's displayed size at zoom 1.
    /// Mobile: the longer axis is zoomed to the editor box.
    pub fn apply_viewport(&mut self) {
        let Some(background) = self.scene.background() else {
            return;
        };
        let display = background.display_size(None);
        if display.is_degenerate() {
            return;
        }
        self.scene.width = display.width;
        self.scene.height = display.height;
        self.camera.zoom = match self.layout {
            Layout::Desktop => 1.0,
            Layout::Mobile => fit_viewport(display, self.layout.editor_box()).zoom,
        };
    }

    /// Switch layout and refit the canvas.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
        self.apply_viewport();
        self.actions.push(Action::RenderNeeded);
    }

    fn reset_objects(&mut self) {
        if self.ui.selected_id.is_some() {
            self.transition(None);
        }
        for d in self.scene.objects() {
            self.actions.push(Action::ObjectRemoved(d.id));
        }
        self.scene.clear();
        self.metrics.clear();
        self.input = InputState::Idle;
    }

    // --- Adding and removing ---

    /// Insert a text drawable at the canvas center and select it.
    pub fn add_text(&mut self, props: TextProps) -> DrawableId {
        let center = self.world_size().center();
        self.insert_selected(Drawable::text(props, center.x, center.y))
    }

    /// Insert an image scaled to fit inside the canvas, centered, and select it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Decode`] for an image with no pixels, or
    /// [`LoadError::NotInitialized`] when the canvas has no area.
    pub fn add_image(&mut self, info: ImageInfo) -> Result<DrawableId, LoadError> {
        let world = self.world_size();
        if world.is_degenerate() {
            return Err(LoadError::NotInitialized);
        }
        let natural = info.natural_size();
        if natural.is_degenerate() {
            return Err(LoadError::Decode { src: info.src });
        }
        let scale = fit_scale(natural, world);
        let center = world.center();
        let drawable = Drawable::image(
            ImageProps { src: info.src, width: info.width, height: info.height },
            center.x,
            center.y,
            scale,
        );
        Ok(self.insert_selected(drawable))
    }

    fn insert_selected(&mut self, drawable: Drawable) -> DrawableId {
        let id = drawable.id;
        self.scene.push(drawable);
        self.actions.push(Action::ObjectAdded(id));
        self.transition(Some(id));
        id
    }

    /// Remove a drawable. Clears the selection if it was selected.
    pub fn remove(&mut self, id: &DrawableId) -> Option<Drawable> {
        let removed = self.scene.remove(id)?;
        self.metrics.remove(id);
        if self.ui.selected_id == Some(*id) {
            self.input = InputState::Idle;
            self.transition(None);
        }
        self.actions.push(Action::ObjectRemoved(*id));
        self.actions.push(Action::RenderNeeded);
        Some(removed)
    }

    /// # Errors
    ///
    /// Returns [`NoSelection`] when nothing is selected.
    pub fn remove_selected(&mut self) -> Result<Drawable, NoSelection> {
        let id = self.ui.selected_id.ok_or(NoSelection)?;
        self.remove(&id).ok_or(NoSelection)
    }

    // --- Layer order ---

    /// Move one step in paint order. Returns false when nothing moved.
    pub fn reorder(&mut self, id: &DrawableId, direction: Direction) -> bool {
        let moved = match direction {
            Direction::Forward => self.scene.raise(id),
            Direction::Backward => self.scene.lower(id),
        };
        if moved {
            self.actions.push(Action::ObjectModified(*id));
            if self.ui.selected_id == Some(*id) {
                self.refresh_snapshot();
            }
            self.actions.push(Action::RenderNeeded);
        }
        moved
    }

    /// # Errors
    ///
    /// Returns [`NoSelection`] when nothing is selected.
    pub fn reorder_selected(&mut self, direction: Direction) -> Result<bool, NoSelection> {
        let id = self.ui.selected_id.ok_or(NoSelection)?;
        Ok(self.reorder(&id, direction))
    }

    // --- Selection ---

    /// Select a drawable. Returns false for unknown or non-selectable ids.
    pub fn select(&mut self, id: &DrawableId) -> bool {
        if !self.scene.get(id).is_some_and(|d| d.selectable) {
            return false;
        }
        self.transition(Some(*id));
        true
    }

    pub fn clear_selection(&mut self) {
        self.transition(None);
    }

    /// Select whatever selectable drawable lies under a screen point, or clear
    /// the selection on empty space.
    pub fn pick(&mut self, screen_pt: Point) -> Option<DrawableId> {
        let world = self.camera.screen_to_world(screen_pt);
        let hit = hit::hit_test(world, &self.scene, &self.metrics, &self.camera, None).map(|h| h.object_id);
        self.transition(hit);
        hit
    }

    fn transition(&mut self, next: Option<DrawableId>) {
        let prev = self.ui.selected_id;
        if prev == next {
            return;
        }
        self.ui.selected_id = next;
        self.ui.editing_text = false;
        self.snapshot = next.and_then(|id| self.capture(&id));

        let action = match (prev, &self.snapshot) {
            (None, Some(snap)) => Action::SelectionCreated(snap.clone()),
            (Some(_), Some(snap)) => Action::SelectionUpdated(snap.clone()),
            (_, None) => Action::SelectionCleared,
        };
        self.actions.push(action);
        self.actions.push(Action::RenderNeeded);
    }

    fn capture(&self, id: &DrawableId) -> Option<AttributeSnapshot> {
        let drawable = self.scene.get(id)?;
        let z = self.scene.z_index(id)?;
        Some(AttributeSnapshot::capture(drawable, z))
    }

    fn refresh_snapshot(&mut self) {
        self.snapshot = self.ui.selected_id.and_then(|id| self.capture(&id));
        if let Some(snap) = &self.snapshot {
            self.actions.push(Action::AttributesRefreshed(snap.clone()));
        }
    }

    // --- Property bridge ---

    /// Apply a toolbar edit to the selected drawable and refresh the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::NoSelection`] with nothing selected, or
    /// [`UpdateError::Invalid`] when the edit fails validation.
    pub fn update_attribute(&mut self, update: &AttributeUpdate) -> Result<(), UpdateError> {
        let id = self.ui.selected_id.ok_or(NoSelection)?;
        let drawable = self.scene.get_mut(&id).ok_or(NoSelection)?;
        update.apply(drawable)?;
        if update.affects_metrics() {
            self.metrics.remove(&id);
        }
        self.actions.push(Action::ObjectModified(id));
        self.refresh_snapshot();
        self.actions.push(Action::RenderNeeded);
        Ok(())
    }

    // --- Transforms ---

    /// Translate a drawable by a world-space delta.
    pub fn move_object(&mut self, id: &DrawableId, dx: f64, dy: f64) -> bool {
        let Some(d) = self.scene.get_mut(id).filter(|d| !d.is_background) else {
            return false;
        };
        d.x += dx;
        d.y += dy;
        self.actions.push(Action::ObjectModified(*id));
        self.actions.push(Action::RenderNeeded);
        true
    }

    /// Apply a completed scale gesture of `(kx, ky)` to a drawable.
    ///
    /// Text is normalized afterwards so its scale stays at unity.
    pub fn scale_object(&mut self, id: &DrawableId, kx: f64, ky: f64) -> bool {
        let Some(d) = self.scene.get_mut(id).filter(|d| !d.is_background) else {
            return false;
        };
        d.scale_x = (d.scale_x * kx).max(MIN_SCALE);
        d.scale_y = (d.scale_y * ky).max(MIN_SCALE);
        self.finish_scale(id);
        true
    }

    fn finish_scale(&mut self, id: &DrawableId) {
        self.normalize_text_scale(id);
        self.actions.push(Action::ObjectModified(*id));
        if self.ui.selected_id == Some(*id) {
            self.refresh_snapshot();
        }
        self.actions.push(Action::RenderNeeded);
    }

    /// Fold a text drawable's scale into its font size.
    ///
    /// `font_size` becomes `round(font_size * scale_x)` clamped to
    /// `1..=MAX_FONT_SIZE`, both
    /// scale factors return to 1 and cached glyph metrics are dropped.
    /// Images are left alone. Returns true when text was normalized.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn normalize_text_scale(&mut self, id: &DrawableId) -> bool {
        let Some(d) = self.scene.get_mut(id) else {
            return false;
        };
        let factor = d.scale_x;
        let Some(text) = d.as_text_mut() else {
            return false;
        };
        let size = (f64::from(text.font_size) * factor).round().clamp(1.0, f64::from(MAX_FONT_SIZE));
        text.font_size = size as u32;
        d.scale_x = 1.0;
        d.scale_y = 1.0;
        self.metrics.remove(id);
        true
    }

    // --- Text editing ---

    /// Enter inline editing on the selected text drawable.
    ///
    /// # Errors
    ///
    /// Returns [`NoSelection`] unless a text drawable is selected.
    pub fn begin_text_edit(&mut self) -> Result<(), NoSelection> {
        let d = self.selected().filter(|d| d.is_text()).ok_or(NoSelection)?;
        let id = d.id;
        let text = d.as_text().map(|t| t.text.clone()).unwrap_or_default();
        self.ui.editing_text = true;
        self.actions.push(Action::EditTextRequested { id, text });
        Ok(())
    }

    /// Write edited content back into the selected text and leave edit mode.
    ///
    /// # Errors
    ///
    /// Returns [`NoSelection`] unless a text drawable is selected.
    pub fn commit_text(&mut self, content: &str) -> Result<(), NoSelection> {
        let id = self.ui.selected_id.ok_or(NoSelection)?;
        self.ui.editing_text = false;
        if !self.set_text(&id, content) {
            return Err(NoSelection);
        }
        self.refresh_snapshot();
        Ok(())
    }

    /// Leave edit mode without changing the text.
    pub fn cancel_text_edit(&mut self) {
        self.ui.editing_text = false;
    }

    /// Replace a text drawable's content. Returns false for images or unknown ids.
    pub fn set_text(&mut self, id: &DrawableId, content: &str) -> bool {
        let Some(text) = self.scene.get_mut(id).and_then(Drawable::as_text_mut) else {
            return false;
        };
        content.clone_into(&mut text.text);
        self.metrics.remove(id);
        self.actions.push(Action::ObjectModified(*id));
        self.actions.push(Action::RenderNeeded);
        true
    }

    // --- Glyph metrics ---

    /// Record measured, unscaled glyph bounds for a text drawable.
    pub fn store_metrics(&mut self, id: DrawableId, size: Size) {
        self.metrics.insert(id, size);
    }

    #[must_use]
    pub fn cached_metrics(&self, id: &DrawableId) -> Option<Size> {
        self.metrics.get(id).copied()
    }

    pub fn invalidate_metrics(&mut self, id: &DrawableId) {
        self.metrics.remove(id);
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricsCache {
        &self.metrics
    }

    /// Text drawables with no cached measurement.
    #[must_use]
    pub fn unmeasured_text(&self) -> Vec<DrawableId> {
        self.scene
            .objects()
            .iter()
            .filter(|d| d.is_text() && !self.metrics.contains_key(&d.id))
            .map(|d| d.id)
            .collect()
    }

    // --- Serialization ---

    /// Snapshot every drawable in paint order.
    #[must_use]
    pub fn serialize(&self) -> SceneDocument {
        self.scene.to_document()
    }

    /// # Errors
    ///
    /// Returns [`DocError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DocError> {
        self.serialize().to_json()
    }

    // --- Clipboard ---

    /// Snapshot the selected drawable into the clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`NoSelection`] when nothing is selected.
    pub fn copy_selected(&mut self) -> Result<(), NoSelection> {
        let drawable = self.selected().ok_or(NoSelection)?.clone();
        self.clipboard.copy(&drawable);
        Ok(())
    }

    /// Insert an offset clone of the clipboard and select it.
    pub fn paste(&mut self) -> Option<DrawableId> {
        let drawable = self.clipboard.paste()?;
        Some(self.insert_selected(drawable))
    }

    // --- Input handlers ---

    /// Editor shortcuts. Ignored while a text input has focus or text is
    /// being edited in place.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, target: KeyTarget) -> Vec<Action> {
        if target == KeyTarget::TextInput || self.ui.editing_text {
            return Vec::new();
        }

        if key.is_delete() {
            if let Err(err) = self.remove_selected() {
                log::debug!("delete ignored: {err}");
            }
        } else if modifiers.shortcut() && key.is_char('c') {
            if let Err(err) = self.copy_selected() {
                log::debug!("copy ignored: {err}");
            }
        } else if modifiers.shortcut() && key.is_char('v') {
            if self.paste().is_none() {
                log::debug!("paste ignored: clipboard is empty");
            }
        } else if key.0 == "Escape" {
            self.clear_selection();
        }
        self.take_actions()
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let world = self.camera.screen_to_world(screen_pt);
        let hit = hit::hit_test(world, &self.scene, &self.metrics, &self.camera, self.ui.selected_id);

        self.input = match hit {
            Some(Hit { object_id, part: HitPart::ResizeHandle(anchor) }) => match self.scene.get(&object_id) {
                Some(d) => InputState::ScalingObject {
                    id: object_id,
                    anchor,
                    start_local: hit::to_local(world, d),
                    orig_scale_x: d.scale_x,
                    orig_scale_y: d.scale_y,
                },
                None => InputState::Idle,
            },
            Some(Hit { object_id, part: HitPart::Body }) => {
                self.transition(Some(object_id));
                InputState::DraggingObject { id: object_id, last_world: world }
            }
            None => {
                self.transition(None);
                InputState::Idle
            }
        };
        self.take_actions()
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        match self.input.clone() {
            InputState::Idle => {}
            InputState::DraggingObject { id, last_world } => {
                if let Some(d) = self.scene.get_mut(&id) {
                    d.x += world.x - last_world.x;
                    d.y += world.y - last_world.y;
                    self.input = InputState::DraggingObject { id, last_world: world };
                    self.actions.push(Action::RenderNeeded);
                }
            }
            InputState::ScalingObject { id, anchor, start_local, orig_scale_x, orig_scale_y } => {
                if let Some(d) = self.scene.get_mut(&id) {
                    let local = hit::to_local(world, d);
                    let (sx, sy) = gesture_scale(anchor, start_local, local);
                    d.scale_x = (orig_scale_x * sx).max(MIN_SCALE);
                    d.scale_y = (orig_scale_y * sy).max(MIN_SCALE);
                    self.actions.push(Action::RenderNeeded);
                }
            }
        }
        self.take_actions()
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle => {}
            InputState::DraggingObject { id, .. } => {
                self.actions.push(Action::ObjectModified(id));
                if self.ui.selected_id == Some(id) {
                    self.refresh_snapshot();
                }
            }
            InputState::ScalingObject { id, .. } => self.finish_scale(&id),
        }
        self.take_actions()
    }

    /// Double-click: edit text in place.
    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        if self.pick(screen_pt).is_some() {
            if let Err(err) = self.begin_text_edit() {
                log::debug!("double-click ignored: {err}");
            }
        }
        self.take_actions()
    }
}

/// Scale ratio of a handle drag, measured in the object's local frame.
///
/// Corners scale uniformly by distance from the center; edges scale only
/// their own axis.
fn gesture_scale(anchor: ResizeAnchor, start: Point, now: Point) -> (f64, f64) {
    let origin = Point::new(0.0, 0.0);
    if anchor.is_corner() {
        let start_dist = start.distance(origin);
        if start_dist <= f64::EPSILON {
            return (1.0, 1.0);
        }
        let ratio = now.distance(origin) / start_dist;
        return (ratio, ratio);
    }
    let axis_ratio = |from: f64, to: f64| if from.abs() <= f64::EPSILON { 1.0 } else { to / from };
    match anchor {
        ResizeAnchor::E | ResizeAnchor::W => (axis_ratio(start.x, now.x), 1.0),
        _ => (1.0, axis_ratio(start.y, now.y)),
    }
}

// =============================================================
// Engine
// =============================================================

/// The browser engine: `EngineCore` plus the canvas element it paints.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
    pub core: EngineCore,
}

impl Engine {
    /// Bind to a canvas element.
    ///
    /// # Errors
    ///
    /// Returns [`InitError`] if the element has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, layout: Layout) -> Result<Self, InitError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| InitError(format!("{e:?}")))?
            .ok_or_else(|| InitError("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| InitError("2d context has an unexpected type".into()))?;
        let engine = Self { canvas, ctx, images: HashMap::new(), core: EngineCore::new(layout) };
        engine.sync_canvas_size();
        Ok(engine)
    }

    /// Keep a decoded image so the renderer can paint drawables that use `src`.
    pub fn register_image(&mut self, src: &str, image: HtmlImageElement) {
        self.images.insert(src.to_string(), image);
    }

    /// Drop decoded images no drawable or clipboard entry refers to.
    pub fn prune_images(&mut self) {
        let keep = self.core.referenced_images();
        self.images.retain(|src, _| keep.contains(src.as_str()));
    }

    #[must_use]
    pub fn image(&self, src: &str) -> Option<&HtmlImageElement> {
        self.images.get(src)
    }

    /// Sources referenced by image drawables that have not been registered yet.
    #[must_use]
    pub fn missing_images(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .core
            .scene
            .objects()
            .iter()
            .filter_map(Drawable::as_image)
            .filter(|img| !self.images.contains_key(&img.src))
            .map(|img| img.src.clone())
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    fn sync_canvas_size(&self) {
        let size = self.core.canvas_size();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (w, h) = (size.width.round().max(0.0) as u32, size.height.round().max(0.0) as u32);
        if self.canvas.width() != w {
            self.canvas.set_width(w);
        }
        if self.canvas.height() != h {
            self.canvas.set_height(h);
        }
    }

    /// Measure pending text, resize the element and repaint with selection chrome.
    pub fn render(&mut self) {
        if let Err(err) = self.paint(true) {
            log::error!("render failed: {err:?}");
        }
    }

    fn paint(&mut self, chrome: bool) -> Result<(), JsValue> {
        for id in self.core.unmeasured_text() {
            if let Some(text) = self.core.scene.get(&id).and_then(Drawable::as_text) {
                let size = render::measure_text(&self.ctx, text)?;
                self.core.store_metrics(id, size);
            }
        }
        self.sync_canvas_size();
        let frame = render::Frame { images: &self.images, chrome };
        render::draw(&self.ctx, &self.core, &frame)
    }

    /// Flatten the scene without selection chrome and encode it.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] if painting or encoding fails.
    pub fn rasterize(&mut self, format: RasterFormat, quality: f64) -> Result<Vec<u8>, RasterError> {
        self.paint(false).map_err(|e| RasterError::Canvas(format!("{e:?}")))?;
        let data_url = self
            .canvas
            .to_data_url_with_type_and_encoder_options(format.mime(), &JsValue::from_f64(quality))
            .map_err(|e| RasterError::Canvas(format!("{e:?}")));
        self.render();
        crate::export::decode_data_url(&data_url?, format)
    }

    /// Flatten the scene into the saved meme artifact: a full-quality PNG
    /// named `meme-<epoch-ms>.png`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] if painting or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn export_png(&mut self) -> Result<ExportedImage, RasterError> {
        let bytes = self.rasterize(RasterFormat::Png, EXPORT_QUALITY)?;
        let epoch_ms = js_sys::Date::now().max(0.0) as u64;
        Ok(ExportedImage::new(epoch_ms, RasterFormat::Png, bytes))
    }

    // --- Delegated input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_double_click(screen_pt)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, target: KeyTarget) -> Vec<Action> {
        self.core.on_key_down(key, modifiers, target)
    }
}
