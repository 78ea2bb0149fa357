use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{ClipboardError, SketchResult};
use crate::snapshot::DATA_URL_PREFIX;
use crate::surface::Surface;

/// The surface encoded as PNG at full buffer resolution
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl ExportedImage {
    pub fn from_surface(surface: &Surface) -> SketchResult<Self> {
        let snapshot = surface.to_snapshot()?;
        Ok(Self {
            width: snapshot.width(),
            height: snapshot.height(),
            png: snapshot.png_bytes().to_vec(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&self.png))
    }
}

/// The host's file-download mechanism
pub trait DownloadSink {
    fn deliver(&mut self, filename: &str, image: &ExportedImage) -> SketchResult<()>;
}

/// Writes downloads into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, filename: &str, image: &ExportedImage) -> SketchResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, &image.png)?;
        log::info!(
            "Exported {}x{} image to {}",
            image.width,
            image.height,
            path.display()
        );
        Ok(())
    }
}

/// Triggers a browser download through a temporary anchor element
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserDownload;

#[cfg(target_arch = "wasm32")]
impl DownloadSink for BrowserDownload {
    fn deliver(&mut self, filename: &str, image: &ExportedImage) -> SketchResult<()> {
        use eframe::wasm_bindgen::JsCast as _;

        let unavailable = |what: &str| {
            crate::error::SketchError::Export(std::io::Error::other(format!("{what} unavailable")))
        };
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| unavailable("document"))?;
        let anchor = document
            .create_element("a")
            .ok()
            .and_then(|el| el.dyn_into::<web_sys::HtmlAnchorElement>().ok())
            .ok_or_else(|| unavailable("anchor element"))?;
        anchor.set_href(&image.to_data_url());
        anchor.set_download(filename);
        anchor.click();
        Ok(())
    }
}

/// An image ready for the clipboard: raw RGBA for native clipboards plus the
/// PNG encoding for hosts that take `image/png` payloads.
#[derive(Debug, Clone)]
pub struct ClipboardImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub png: Vec<u8>,
}

impl ClipboardImage {
    pub fn from_surface(surface: &Surface) -> SketchResult<Self> {
        let exported = ExportedImage::from_surface(surface)?;
        Ok(Self {
            width: exported.width,
            height: exported.height,
            rgba: surface.pixels().as_raw().clone(),
            png: exported.png,
        })
    }
}

/// The host's asynchronous clipboard API.
///
/// The returned future resolves exactly once, after the host has accepted or
/// refused the write.
pub trait ClipboardHost {
    fn write_image(&self, image: ClipboardImage) -> BoxFuture<'static, Result<(), ClipboardError>>;
}

/// A host without any clipboard API
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableClipboard;

impl ClipboardHost for UnavailableClipboard {
    fn write_image(&self, _image: ClipboardImage) -> BoxFuture<'static, Result<(), ClipboardError>> {
        future::ready(Err(ClipboardError::ClipboardUnavailable(
            "no clipboard API on this host".to_owned(),
        )))
        .boxed()
    }
}

/// The operating system clipboard. Writes run on a worker thread.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(not(target_arch = "wasm32"))]
impl ClipboardHost for SystemClipboard {
    fn write_image(&self, image: ClipboardImage) -> BoxFuture<'static, Result<(), ClipboardError>> {
        let (tx, rx) = futures::channel::oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("clipboard-write".to_owned())
            .spawn(move || {
                // The receiver may already be gone; nobody is waiting then.
                let _ = tx.send(write_system_clipboard(image));
            });

        if let Err(e) = spawned {
            return future::ready(Err(ClipboardError::ClipboardUnavailable(e.to_string()))).boxed();
        }

        async move { rx.await.unwrap_or(Err(ClipboardError::Abandoned)) }.boxed()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_system_clipboard(image: ClipboardImage) -> Result<(), ClipboardError> {
    use std::borrow::Cow;

    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| ClipboardError::ClipboardUnavailable(e.to_string()))?;
    clipboard
        .set_image(arboard::ImageData {
            width: image.width as usize,
            height: image.height as usize,
            bytes: Cow::Owned(image.rgba),
        })
        .map_err(|e| match e {
            arboard::Error::ClipboardNotSupported => {
                ClipboardError::ClipboardUnavailable(e.to_string())
            }
            other => ClipboardError::WriteFailed(other.to_string()),
        })?;
    log::info!("Copied {}x{} image to clipboard", image.width, image.height);
    Ok(())
}

/// The browser's async clipboard. The PNG is written as an `image/png` item.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WebClipboard;

#[cfg(target_arch = "wasm32")]
impl ClipboardHost for WebClipboard {
    fn write_image(&self, image: ClipboardImage) -> BoxFuture<'static, Result<(), ClipboardError>> {
        // JS handles are not Send, so the write runs on the local executor.
        let (tx, rx) = futures::channel::oneshot::channel();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = tx.send(write_web_clipboard(image).await);
        });

        async move { rx.await.unwrap_or(Err(ClipboardError::Abandoned)) }.boxed()
    }
}

#[cfg(target_arch = "wasm32")]
async fn write_web_clipboard(image: ClipboardImage) -> Result<(), ClipboardError> {
    use web_sys::js_sys::{Array, Object, Reflect, Uint8Array};
    use web_sys::wasm_bindgen::JsValue;

    let unavailable = |e: JsValue| ClipboardError::ClipboardUnavailable(format!("{e:?}"));

    let window = web_sys::window()
        .ok_or_else(|| ClipboardError::ClipboardUnavailable("no window".to_owned()))?;
    let clipboard = window.navigator().clipboard();
    // Missing outside secure contexts.
    if clipboard.is_undefined() {
        return Err(ClipboardError::ClipboardUnavailable(
            "navigator.clipboard is not available".to_owned(),
        ));
    }

    let options = web_sys::BlobPropertyBag::new();
    options.set_type("image/png");
    let parts = Array::of1(&Uint8Array::from(image.png.as_slice()));
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(unavailable)?;

    let record = Object::new();
    Reflect::set(&record, &JsValue::from_str("image/png"), &blob).map_err(unavailable)?;
    let item = web_sys::ClipboardItem::new_with_record_from_str_to_blob_promise(&record)
        .map_err(unavailable)?;

    wasm_bindgen_futures::JsFuture::from(clipboard.write(&Array::of1(&item)))
        .await
        .map_err(unavailable)?;
    log::info!("Copied {}x{} image to clipboard", image.width, image.height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Vec2;

    #[test]
    fn test_export_uses_buffer_resolution() {
        let surface = Surface::new(Vec2::new(120.0, 80.0), 2.0, 2.0);
        let image = ExportedImage::from_surface(&surface).unwrap();
        assert_eq!((image.width, image.height), (240, 160));
        assert!(image.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_directory_sink_writes_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let surface = Surface::new(Vec2::new(8.0, 8.0), 1.0, 2.0);
        let image = ExportedImage::from_surface(&surface).unwrap();

        let mut sink = DirectorySink::new(dir.path());
        sink.deliver("art.png", &image).unwrap();

        let written = fs::read(dir.path().join("art.png")).unwrap();
        assert_eq!(written, image.png);
    }

    #[test]
    fn test_unavailable_clipboard_reports_error() {
        let surface = Surface::new(Vec2::new(4.0, 4.0), 1.0, 2.0);
        let image = ClipboardImage::from_surface(&surface).unwrap();
        assert_eq!(image.rgba.len(), 4 * 4 * 4);
        let png = crate::snapshot::Snapshot::from_png(image.png.clone()).unwrap();
        assert_eq!(png.dimensions(), (4, 4));

        let result = futures::executor::block_on(UnavailableClipboard.write_image(image));
        assert!(matches!(result, Err(ClipboardError::ClipboardUnavailable(_))));
    }
}
