//! Scene host for the meme editor.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns one
//! canvas surface: the ordered drawables (text and images) with a single
//! bottommost background, the selection and its attribute projection, the
//! clipboard and keyboard shortcuts, pointer gestures, background fitting and
//! raster export. The host page only wires DOM events and side panels to the
//! engine and hands the resulting [`engine::Action`]s to its UI.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Drawables, the paint-ordered scene and its JSON document |
//! | [`bridge`] | Selection snapshot and validated attribute updates |
//! | [`camera`] | Zoom, coordinate conversions and fit math |
//! | [`input`] | Input event types, the gesture state machine, the clipboard |
//! | [`hit`] | Hit-testing against drawables and resize handles |
//! | [`render`] | Scene rendering to a 2D context |
//! | [`loader`] | Async image fetches and scene/background loading |
//! | [`export`] | Raster formats, data-URL decoding, export file names |
//! | [`consts`] | Shared numeric constants (editor boxes, font limits, etc.) |

pub mod bridge;
pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod export;
pub mod hit;
pub mod input;
pub mod loader;
pub mod render;
