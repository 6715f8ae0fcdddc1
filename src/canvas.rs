use std::ops::Deref;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::components::colors::Color;
use crate::log_warn;

// ============================================================================
// SAMPLE RECT – detached block of device samples (copy / paste payload)
// ============================================================================

/// A rectangular block of samples lifted out of a [`PixelBuffer`].
///
/// Cells that fell outside the backing store at copy time are `None`, and are
/// skipped again at paste time, so partial copies at the edges round-trip.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRect {
    pub width: u32,
    pub height: u32,
    cells: Vec<Option<[u8; 4]>>,
}

impl SampleRect {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: u32, y: u32, px: [u8; 4]) {
        self.cells[(y * self.width + x) as usize] = Some(px);
    }

    /// Number of cells that were actually captured.
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Inclusive sample-space bounds touched by a write session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl SampleBounds {
    fn include(bounds: &mut Option<SampleBounds>, x: u32, y: u32) {
        match bounds {
            Some(b) => {
                b.min_x = b.min_x.min(x);
                b.min_y = b.min_y.min(y);
                b.max_x = b.max_x.max(x);
                b.max_y = b.max_y.max(y);
            }
            None => {
                *bounds = Some(SampleBounds { min_x: x, min_y: y, max_x: x, max_y: y });
            }
        }
    }
}

/// What a finished write session did to the buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub samples_written: usize,
    pub dirty: Option<SampleBounds>,
}

// ============================================================================
// PIXEL BUFFER – dense RGBA samples at a fixed device-pixel density
// ============================================================================

/// Drawing surface of `width × height` logical pixels, each backed by a
/// `density × density` block of samples stored row-major, origin top-left.
///
/// All reads are available directly; every mutation goes through a
/// [`WriteSession`] obtained from [`PixelBuffer::begin_write`].
#[derive(Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    density: u32,
    samples: RgbaImage,
    generation: u64,
    total_written: u64,
    last_flush: Option<FlushStats>,
}

impl PixelBuffer {
    /// Create a buffer filled with `fill`.
    pub fn new(width: u32, height: u32, density: u32, fill: Color) -> Self {
        let (width, height) = if width == 0 || height == 0 {
            log_warn!("PixelBuffer::new: {}×{} is empty, clamped to 1×1", width, height);
            (width.max(1), height.max(1))
        } else {
            (width, height)
        };
        let density = if density == 0 {
            log_warn!("PixelBuffer::new: density 0 clamped to 1");
            1
        } else {
            density
        };
        Self {
            width,
            height,
            density,
            samples: RgbaImage::from_pixel(width * density, height * density, fill.into()),
            generation: 0,
            total_written: 0,
            last_flush: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn density(&self) -> u32 {
        self.density
    }

    /// Backing store width in samples (`W·D`).
    pub fn sample_width(&self) -> u32 {
        self.samples.width()
    }

    /// Backing store height in samples (`H·D`).
    pub fn sample_height(&self) -> u32 {
        self.samples.height()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.samples
    }

    /// Incremented by every flush that wrote at least one sample.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Samples written over the buffer's lifetime.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    pub fn last_flush(&self) -> Option<FlushStats> {
        self.last_flush
    }

    // ---- coordinate mapping -------------------------------------------------

    /// Map a logical coordinate to the first sample of its `D×D` block.
    /// Coordinates are truncated toward zero; `None` when out of range.
    pub fn sample_origin(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        let (x, y) = (x.trunc(), y.trunc());
        if !(x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32) {
            return None;
        }
        Some((x as u32 * self.density, y as u32 * self.density))
    }

    fn sample_in_range(&self, sx: i64, sy: i64) -> Option<(u32, u32)> {
        if sx < 0 || sy < 0 || sx >= self.sample_width() as i64 || sy >= self.sample_height() as i64 {
            return None;
        }
        Some((sx as u32, sy as u32))
    }

    // ---- reads ----------------------------------------------------------------

    /// Read one logical pixel (the first sample of its block).
    pub fn get(&self, x: f32, y: f32) -> Option<Color> {
        let (sx, sy) = self.sample_origin(x, y)?;
        Some((*self.samples.get_pixel(sx, sy)).into())
    }

    /// Read one device sample.
    pub fn sample(&self, sx: i64, sy: i64) -> Option<Color> {
        let (sx, sy) = self.sample_in_range(sx, sy)?;
        Some((*self.samples.get_pixel(sx, sy)).into())
    }

    /// Copy a `w × h` block of samples whose top-left sample is `(sx, sy)`.
    pub fn copy_rect(&self, sx: i64, sy: i64, w: u32, h: u32) -> SampleRect {
        let mut out = SampleRect::new(w, h);
        for j in 0..h {
            for i in 0..w {
                if let Some((px, py)) = self.sample_in_range(sx + i as i64, sy + j as i64) {
                    out.set(i, j, self.samples.get_pixel(px, py).0);
                }
            }
        }
        out
    }

    /// FNV-1a over every sample byte; cheap identity for a buffer state.
    pub fn checksum(&self) -> u64 {
        self.samples
            .as_raw()
            .iter()
            .fold(0xcbf2_9ce4_8422_2325u64, |h, &b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
    }

    /// Acquire exclusive write access. Every mutation happens through the
    /// returned session; the flush happens once, when it is finished or dropped.
    pub fn begin_write(&mut self) -> WriteSession<'_> {
        WriteSession {
            buffer: self,
            samples_written: 0,
            dirty: None,
        }
    }
}

/// `out = old·(1 − a/255) + color·a/255`, destination forced opaque.
fn blend_over(px: &mut Rgba<u8>, color: Color) {
    let ratio = color.a as f32 / 255.0;
    let mix = |old: u8, new: u8| (old as f32 * (1.0 - ratio) + new as f32 * ratio).round() as u8;
    px.0 = [mix(px.0[0], color.r), mix(px.0[1], color.g), mix(px.0[2], color.b), 255];
}

// ============================================================================
// WRITE SESSION – scoped acquire / mutate / flush
// ============================================================================

pub struct WriteSession<'a> {
    buffer: &'a mut PixelBuffer,
    samples_written: usize,
    dirty: Option<SampleBounds>,
}

impl Deref for WriteSession<'_> {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        self.buffer
    }
}

impl WriteSession<'_> {
    pub fn samples_written(&self) -> usize {
        self.samples_written
    }

    #[inline]
    fn touch(&mut self, sx: u32, sy: u32) {
        self.samples_written += 1;
        SampleBounds::include(&mut self.dirty, sx, sy);
    }

    /// Blend `color` into logical pixel `(x, y)`.
    ///
    /// * `replace` flattens the color to opaque first.
    /// * `real_pixel` writes only the first sample of the block; otherwise
    ///   all `D×D` samples are blended.
    pub fn set(&mut self, x: f32, y: f32, color: Color, replace: bool, real_pixel: bool) {
        let Some((sx, sy)) = self.buffer.sample_origin(x, y) else { return };
        let color = if replace { color.to_opaque() } else { color };
        let d = if real_pixel { 1 } else { self.buffer.density };
        for j in 0..d {
            for i in 0..d {
                blend_over(self.buffer.samples.get_pixel_mut(sx + i, sy + j), color);
                self.touch(sx + i, sy + j);
            }
        }
    }

    /// Blend `color` into a single device sample.
    pub fn set_sample(&mut self, sx: i64, sy: i64, color: Color, replace: bool) {
        let Some((sx, sy)) = self.buffer.sample_in_range(sx, sy) else { return };
        let color = if replace { color.to_opaque() } else { color };
        blend_over(self.buffer.samples.get_pixel_mut(sx, sy), color);
        self.touch(sx, sy);
    }

    /// Overwrite a single sample verbatim (alpha preserved). Overlay path.
    pub fn put_sample(&mut self, sx: i64, sy: i64, color: Color) {
        let Some((sx, sy)) = self.buffer.sample_in_range(sx, sy) else { return };
        self.buffer.samples.put_pixel(sx, sy, color.into());
        self.touch(sx, sy);
    }

    /// Overwrite every sample of logical pixel `(x, y)` verbatim.
    pub fn put(&mut self, x: f32, y: f32, color: Color) {
        let Some((sx, sy)) = self.buffer.sample_origin(x, y) else { return };
        let d = self.buffer.density;
        for j in 0..d {
            for i in 0..d {
                self.buffer.samples.put_pixel(sx + i, sy + j, color.into());
                self.touch(sx + i, sy + j);
            }
        }
    }

    /// Overwrite the whole backing store.
    pub fn clear(&mut self, color: Color) {
        let px = color.to_array();
        self.buffer
            .samples
            .par_chunks_exact_mut(4)
            .for_each(|chunk| chunk.copy_from_slice(&px));
        let (w, h) = (self.buffer.sample_width(), self.buffer.sample_height());
        self.samples_written += w as usize * h as usize;
        SampleBounds::include(&mut self.dirty, 0, 0);
        SampleBounds::include(&mut self.dirty, w - 1, h - 1);
    }

    /// Paste a block with its top-left at sample `(dx, dy)`. Cells landing
    /// outside the store, or missing from the block, are skipped.
    pub fn paste_rect(&mut self, dx: i64, dy: i64, block: &SampleRect) {
        for j in 0..block.height {
            for i in 0..block.width {
                let Some(px) = block.get(i, j) else { continue };
                let Some((tx, ty)) = self.buffer.sample_in_range(dx + i as i64, dy + j as i64) else {
                    continue;
                };
                self.buffer.samples.put_pixel(tx, ty, Rgba(px));
                self.touch(tx, ty);
            }
        }
    }

    /// Copy a `w × h` sample block from `(x1, y1)` to `(x2, y2)` inside this
    /// buffer. Overlapping ranges behave as if copied through a temporary.
    pub fn copy_paste_rect(&mut self, x1: i64, y1: i64, x2: i64, y2: i64, w: u32, h: u32) {
        let block = self.buffer.copy_rect(x1, y1, w, h);
        self.paste_rect(x2, y2, &block);
    }

    /// Release the session and report what was written.
    pub fn finish(self) -> FlushStats {
        // Drop performs the flush.
        let stats = FlushStats {
            samples_written: self.samples_written,
            dirty: self.dirty,
        };
        drop(self);
        stats
    }
}

impl Drop for WriteSession<'_> {
    fn drop(&mut self) {
        let stats = FlushStats {
            samples_written: self.samples_written,
            dirty: self.dirty,
        };
        if stats.samples_written > 0 {
            self.buffer.generation += 1;
            self.buffer.total_written += stats.samples_written as u64;
        }
        self.buffer.last_flush = Some(stats);
    }
}
