#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{ImageProps, TextAlign, TextProps};

fn sample_text() -> Drawable {
    Drawable::text(
        TextProps {
            text: "copy me".into(),
            font_family: "Impact".into(),
            font_size: 30,
            fill: "#FFFFFF".into(),
            stroke: "#000000".into(),
            stroke_width: 1.0,
            text_align: TextAlign::Center,
        },
        100.0,
        50.0,
    )
}

// =============================================================
// Modifiers / Key
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift && !m.ctrl && !m.alt && !m.meta);
    assert!(!m.shortcut());
}

#[test]
fn shortcut_accepts_meta_or_ctrl() {
    assert!(Modifiers { meta: true, ..Default::default() }.shortcut());
    assert!(Modifiers { ctrl: true, ..Default::default() }.shortcut());
    assert!(!Modifiers { shift: true, ..Default::default() }.shortcut());
}

#[test]
fn delete_and_backspace_are_delete_keys() {
    assert!(Key("Delete".into()).is_delete());
    assert!(Key("Backspace".into()).is_delete());
    assert!(!Key("d".into()).is_delete());
}

#[test]
fn is_char_ignores_case() {
    assert!(Key("c".into()).is_char('c'));
    assert!(Key("C".into()).is_char('c'));
    assert!(!Key("Control".into()).is_char('c'));
    assert!(!Key(String::new()).is_char('c'));
}

#[test]
fn key_target_default_is_canvas() {
    assert_eq!(KeyTarget::default(), KeyTarget::Canvas);
}

// =============================================================
// UiState / InputState
// =============================================================

#[test]
fn ui_state_default_has_no_selection() {
    let ui = UiState::default();
    assert!(ui.selected_id.is_none());
    assert!(!ui.editing_text);
}

#[test]
fn input_state_default_is_idle() {
    assert!(matches!(InputState::default(), InputState::Idle));
}

// =============================================================
// Clipboard
// =============================================================

#[test]
fn clipboard_starts_empty() {
    let clip = Clipboard::default();
    assert!(clip.is_empty());
    assert!(clip.paste().is_none());
}

#[test]
fn paste_offsets_and_renews_id() {
    let original = sample_text();
    let mut clip = Clipboard::default();
    clip.copy(&original);

    let pasted = clip.paste().unwrap();
    assert_ne!(pasted.id, original.id);
    assert_eq!(pasted.x, original.x + 10.0);
    assert_eq!(pasted.y, original.y + 10.0);
    assert_eq!(pasted.kind, original.kind);
}

#[test]
fn copy_is_a_snapshot_not_a_reference() {
    let mut original = sample_text();
    let mut clip = Clipboard::default();
    clip.copy(&original);

    original.as_text_mut().unwrap().text = "changed later".into();
    let pasted = clip.paste().unwrap();
    assert_eq!(pasted.as_text().unwrap().text, "copy me");
}

#[test]
fn second_copy_replaces_first() {
    let first = sample_text();
    let second = Drawable::image(ImageProps { src: "b.png".into(), width: 10.0, height: 10.0 }, 0.0, 0.0, 1.0);
    let mut clip = Clipboard::default();
    clip.copy(&first);
    clip.copy(&second);
    assert_eq!(clip.peek().unwrap().id, second.id);
    assert!(clip.paste().unwrap().as_image().is_some());
}

#[test]
fn repeated_paste_yields_distinct_objects() {
    let mut clip = Clipboard::default();
    clip.copy(&sample_text());
    let a = clip.paste().unwrap();
    let b = clip.paste().unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn pasted_background_is_demoted() {
    let mut bg = sample_text();
    bg.is_background = true;
    bg.selectable = false;
    let mut clip = Clipboard::default();
    clip.copy(&bg);
    let pasted = clip.paste().unwrap();
    assert!(!pasted.is_background);
    assert!(pasted.selectable);
}
