use egui::{Color32, ColorImage, Pos2, Vec2};
use futures::future::{BoxFuture, FutureExt};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::SketchResult;
use crate::snapshot::Snapshot;

/// Fully transparent pixel, the content of a blank surface
const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How a single segment is painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
}

/// A restore that has been requested but not yet applied.
///
/// Carries the generation it was stamped with so the surface can drop it
/// if a newer restore was requested while this one was decoding.
#[derive(Debug)]
pub struct RestoreRequest {
    generation: u64,
    snapshot: Snapshot,
}

impl RestoreRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Decode the snapshot. Resolves once with the pixels or the decode error.
    pub fn decode(self) -> BoxFuture<'static, SketchResult<DecodedRestore>> {
        async move {
            let pixels = self.snapshot.decode()?;
            Ok(DecodedRestore {
                generation: self.generation,
                pixels,
            })
        }
        .boxed()
    }
}

/// Decoded pixels waiting to be painted by `Surface::finish_restore`
#[derive(Debug)]
pub struct DecodedRestore {
    generation: u64,
    pixels: RgbaImage,
}

impl DecodedRestore {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns the live raster buffer.
///
/// Coordinates handed to the surface are logical points; the buffer holds
/// `pixels_per_point` device pixels per point in each direction.
#[derive(Debug)]
pub struct Surface {
    pixels: RgbaImage,
    logical_size: Vec2,
    pixels_per_point: f32,
    max_pixels_per_point: f32,
    restore_generation: u64,
}

impl Surface {
    pub fn new(logical_size: Vec2, pixels_per_point: f32, max_pixels_per_point: f32) -> Self {
        let mut surface = Self {
            pixels: RgbaImage::from_pixel(1, 1, BLANK),
            logical_size: Vec2::ZERO,
            pixels_per_point: 1.0,
            max_pixels_per_point,
            restore_generation: 0,
        };
        surface.reallocate(logical_size, pixels_per_point);
        surface
    }

    /// Reconfigure the buffer for a new display size and density, then paint
    /// `last` into it. Without `last` the resized buffer is blank.
    pub fn resize(
        &mut self,
        logical_size: Vec2,
        pixels_per_point: f32,
        last: Option<&Snapshot>,
    ) -> SketchResult<()> {
        self.reallocate(logical_size, pixels_per_point);
        log::debug!(
            "Surface resized to {}x{} px ({} px/pt)",
            self.pixels.width(),
            self.pixels.height(),
            self.pixels_per_point
        );

        match last {
            Some(snapshot) => self.render_snapshot(snapshot),
            None => Ok(()),
        }
    }

    fn reallocate(&mut self, logical_size: Vec2, pixels_per_point: f32) {
        let ppp = if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
            pixels_per_point.min(self.max_pixels_per_point)
        } else {
            1.0
        };
        // A PNG cannot be zero-sized, so the buffer never is either.
        let width = ((logical_size.x * ppp).floor() as u32).max(1);
        let height = ((logical_size.y * ppp).floor() as u32).max(1);

        self.logical_size = logical_size;
        self.pixels_per_point = ppp;
        self.pixels = RgbaImage::from_pixel(width, height, BLANK);
    }

    /// Draw one segment with round caps. `from == to` draws a dot.
    pub fn draw_segment(&mut self, from: Pos2, to: Pos2, style: &StrokeStyle) {
        let scale = self.pixels_per_point;
        let a = from.to_vec2() * scale;
        let b = to.to_vec2() * scale;
        let radius = style.width * scale / 2.0;

        let [r, g, bl, a8] = style.color.to_srgba_unmultiplied();
        let base_alpha = (a8 as f32 / 255.0) * style.opacity;

        // NaN fails every comparison, so it lands here too.
        if !(radius > 0.0 && radius.is_finite() && base_alpha > 0.0) {
            return;
        }
        if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
            return;
        }

        let (width, height) = self.pixels.dimensions();
        let reach = radius + 1.0;
        let min_x = (a.x.min(b.x) - reach).floor().max(0.0) as u32;
        let min_y = (a.y.min(b.y) - reach).floor().max(0.0) as u32;
        let max_x = ((a.x.max(b.x) + reach).ceil().max(0.0) as u32).min(width);
        let max_y = ((a.y.max(b.y) + reach).ceil().max(0.0) as u32).min(height);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (radius + 0.5 - distance_to_segment(center, a, b)).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let alpha = (base_alpha * coverage).min(1.0);
                blend_over(self.pixels.get_pixel_mut(x, y), [r, g, bl], alpha);
            }
        }
    }

    /// Blank every pixel
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = BLANK;
        }
    }

    /// Clear the buffer and paint `snapshot` stretched to the current buffer size
    pub fn render_snapshot(&mut self, snapshot: &Snapshot) -> SketchResult<()> {
        let request = self.begin_restore(snapshot.clone());
        let decoded = futures::executor::block_on(request.decode())?;
        self.finish_restore(decoded);
        Ok(())
    }

    /// Stamp a new restore. Any restore requested earlier becomes stale.
    pub fn begin_restore(&mut self, snapshot: Snapshot) -> RestoreRequest {
        self.restore_generation += 1;
        RestoreRequest {
            generation: self.restore_generation,
            snapshot,
        }
    }

    /// Paint a decoded restore if it is still the latest one requested.
    ///
    /// Returns false for a stale restore, which leaves the buffer untouched.
    /// The image is scaled to the buffer size at the time of this call.
    pub fn finish_restore(&mut self, decoded: DecodedRestore) -> bool {
        if decoded.generation != self.restore_generation {
            log::debug!(
                "Dropping stale restore {} (latest is {})",
                decoded.generation,
                self.restore_generation
            );
            return false;
        }

        let (width, height) = self.pixels.dimensions();
        self.pixels = if decoded.pixels.dimensions() == (width, height) {
            decoded.pixels
        } else {
            imageops::resize(&decoded.pixels, width, height, FilterType::Triangle)
        };
        true
    }

    /// Encode the live buffer into a new snapshot
    pub fn to_snapshot(&self) -> SketchResult<Snapshot> {
        Snapshot::encode(&self.pixels)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Buffer size in device pixels
    pub fn size_px(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn logical_size(&self) -> Vec2 {
        self.logical_size
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    /// Copy of the buffer in the form egui uploads as a texture
    pub fn to_color_image(&self) -> ColorImage {
        let (width, height) = self.pixels.dimensions();
        ColorImage::from_rgba_unmultiplied([width as usize, height as usize], self.pixels.as_raw())
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Source-over compositing of an unmultiplied color onto an unmultiplied pixel
fn blend_over(dst: &mut Rgba<u8>, src: [u8; 3], alpha: f32) {
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        *dst = BLANK;
        return;
    }
    for i in 0..3 {
        let c = (src[i] as f32 * alpha + dst[i] as f32 * dst_alpha * (1.0 - alpha)) / out_alpha;
        dst[i] = c.round() as u8;
    }
    dst[3] = (out_alpha * 255.0).round() as u8;
}
