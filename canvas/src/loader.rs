//! Browser image loading and the async halves of scene operations.
//!
//! Fetches go through an `HtmlImageElement` with anonymous CORS so the canvas
//! stays exportable. The engine is borrowed only between awaits, never across
//! one, so overlapping loads can interleave freely; stale background
//! completions are discarded by the core.

use std::cell::RefCell;

use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

use crate::doc::{DrawableId, SceneDocument};
use crate::engine::{Engine, ImageInfo, LoadError, LoadOutcome, LoadTicket, SceneLoad};

/// Fetch and decode an image.
///
/// # Errors
///
/// Returns [`LoadError::Fetch`] if the browser cannot load or decode it, or
/// [`LoadError::Decode`] if it decodes to zero pixels.
pub async fn fetch_image(src: &str) -> Result<(HtmlImageElement, ImageInfo), LoadError> {
    let fetch_err = |reason: String| LoadError::Fetch { src: src.to_string(), reason };

    let element = HtmlImageElement::new().map_err(|e| fetch_err(format!("{e:?}")))?;
    element.set_cross_origin(Some("anonymous"));
    element.set_src(src);
    JsFuture::from(element.decode()).await.map_err(|e| fetch_err(format!("{e:?}")))?;

    let (width, height) = (element.natural_width(), element.natural_height());
    if width == 0 || height == 0 {
        return Err(LoadError::Decode { src: src.to_string() });
    }
    let info = ImageInfo::new(src, f64::from(width), f64::from(height));
    Ok((element, info))
}

/// Replace the scene with a fitted background image.
///
/// # Errors
///
/// Returns the fetch or mount error; the scene is unchanged.
pub async fn load_background(engine: &RefCell<Engine>, src: &str) -> Result<LoadOutcome, LoadError> {
    let ticket = engine.borrow_mut().core.begin_background_load(src);
    let fetched = fetch_image(src).await;
    let outcome = finish_background(engine, ticket, fetched)?;
    if let LoadOutcome::Applied(_) = outcome {
        engine.borrow_mut().render();
    }
    Ok(outcome)
}

fn finish_background(
    engine: &RefCell<Engine>,
    ticket: LoadTicket,
    fetched: Result<(HtmlImageElement, ImageInfo), LoadError>,
) -> Result<LoadOutcome, LoadError> {
    let mut engine = engine.borrow_mut();
    let (decoded, result) = match fetched {
        Ok((element, info)) => (Some((info.src.clone(), element)), Ok(info)),
        Err(err) => (None, Err(err)),
    };
    let outcome = engine.core.finish_background_load(ticket, result)?;
    match outcome {
        LoadOutcome::Applied(id) => {
            log::info!("background {id} mounted");
            engine.prune_images();
            if let Some((src, element)) = decoded {
                engine.register_image(&src, element);
            }
        }
        LoadOutcome::Stale => log::warn!("background load superseded by a newer one"),
    }
    Ok(outcome)
}

/// Add a sticker image fitted inside the canvas and select it.
///
/// # Errors
///
/// Returns the fetch error or [`LoadError`] from the core; nothing is added.
pub async fn add_sticker(engine: &RefCell<Engine>, src: &str) -> Result<DrawableId, LoadError> {
    let (element, info) = fetch_image(src).await?;
    let mut engine = engine.borrow_mut();
    let image_src = info.src.clone();
    let id = engine.core.add_image(info)?;
    engine.register_image(&image_src, element);
    engine.render();
    Ok(id)
}

/// Load a scene document, fetch every image it references, and fall back to
/// `fallback_src` as the background when the document has none.
///
/// Individual image failures are logged; the drawable keeps a placeholder.
/// The canvas is repainted once the load settles, whether or not the
/// fallback background could be mounted.
///
/// # Errors
///
/// Returns [`LoadError`] if the document is rejected or the fallback
/// background cannot be mounted.
pub async fn load_scene(
    engine: &RefCell<Engine>,
    doc: SceneDocument,
    fallback_src: Option<&str>,
) -> Result<SceneLoad, LoadError> {
    let load = {
        let mut engine = engine.borrow_mut();
        let load = engine.core.load_scene(doc, fallback_src)?;
        engine.prune_images();
        load
    };
    fetch_missing_images(engine).await;

    let mounted = match &load {
        SceneLoad::FetchBackground { ticket, src } => {
            let fetched = fetch_image(src).await;
            finish_background(engine, *ticket, fetched).map(|_| ())
        }
        _ => Ok(()),
    };
    engine.borrow_mut().render();
    mounted?;
    Ok(load)
}

/// Fetch images referenced by the scene that are not decoded yet.
pub async fn fetch_missing_images(engine: &RefCell<Engine>) {
    let missing = engine.borrow().missing_images();
    for src in missing {
        match fetch_image(&src).await {
            Ok((element, _)) => engine.borrow_mut().register_image(&src, element),
            Err(err) => log::warn!("image unavailable: {err}"),
        }
    }
}
