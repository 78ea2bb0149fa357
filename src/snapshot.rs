use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use uuid::Uuid;

use crate::error::{SketchError, SketchResult};

pub(crate) const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Immutable PNG-encoded image of the whole surface at one commit point.
///
/// The payload sits behind an `Arc`, so clones share bytes but never share a
/// mutable pixel buffer with the live surface.
#[derive(Clone)]
pub struct Snapshot {
    id: Uuid,
    png: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl Snapshot {
    /// Encode a pixel buffer into a new snapshot
    pub fn encode(pixels: &RgbaImage) -> SketchResult<Self> {
        let mut png = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(SketchError::Encode)?;

        Ok(Self {
            id: Uuid::new_v4(),
            png: png.into(),
            width: pixels.width(),
            height: pixels.height(),
        })
    }

    /// Wrap an already encoded PNG payload, reading its dimensions from the header.
    pub fn from_png(png: Vec<u8>) -> SketchResult<Self> {
        let reader = image::ImageReader::with_format(Cursor::new(&png), ImageFormat::Png);
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| SketchError::Decode(e.to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            png: png.into(),
            width,
            height,
        })
    }

    #[cfg(test)]
    pub(crate) fn unchecked(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            png: png.into(),
            width,
            height,
        }
    }

    /// Parse the `data:image/png;base64,...` form used by the persistence bridge
    pub fn from_data_url(data_url: &str) -> SketchResult<Self> {
        let encoded = data_url
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| SketchError::Decode("payload is not a PNG data URL".to_owned()))?;
        let png = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SketchError::Decode(e.to_string()))?;
        Self::from_png(png)
    }

    pub fn to_data_url(&self) -> String {
        format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&self.png))
    }

    /// Decode the payload back into pixels
    pub fn decode(&self) -> SketchResult<RgbaImage> {
        image::load_from_memory_with_format(&self.png, ImageFormat::Png)
            .map(|img| img.to_rgba8())
            .map_err(|e| SketchError::Decode(e.to_string()))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when both snapshots carry the same encoded image, regardless of id.
    pub fn same_image(&self, other: &Snapshot) -> bool {
        self.dimensions() == other.dimensions() && self.png == other.png
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_encode_keeps_dimensions() {
        let pixels = RgbaImage::from_pixel(7, 3, Rgba([10, 20, 30, 255]));
        let snapshot = Snapshot::encode(&pixels).unwrap();
        assert_eq!(snapshot.dimensions(), (7, 3));

        let decoded = snapshot.decode().unwrap();
        assert_eq!(decoded.get_pixel(6, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_data_url_carries_same_image() {
        let pixels = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 128]));
        let snapshot = Snapshot::encode(&pixels).unwrap();
        let url = snapshot.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let parsed = Snapshot::from_data_url(&url).unwrap();
        assert!(parsed.same_image(&snapshot));
        assert_ne!(parsed.id(), snapshot.id());
    }

    #[test]
    fn test_corrupt_payloads_are_rejected() {
        assert!(matches!(
            Snapshot::from_data_url("hello"),
            Err(SketchError::Decode(_))
        ));
        assert!(Snapshot::from_data_url("data:image/png;base64,!!!").is_err());
        assert!(Snapshot::from_png(vec![1, 2, 3, 4]).is_err());
    }
}
