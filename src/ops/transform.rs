// ============================================================================
// TRANSFORM OPERATIONS: lifting, flipping and placing captured sub-images
// ============================================================================

use egui::Pos2;
use image::{Rgba, RgbaImage, imageops};

use crate::canvas::{PixelBuffer, WriteSession};
use crate::components::colors::Color;

/// Flip direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Mirror left↔right.
    X,
    /// Mirror top↔bottom.
    Y,
}

/// Integer logical rectangle (top-left + size).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    /// Rectangle spanned by two opposite corners in either order, truncated
    /// to whole logical pixels.
    pub fn from_corners(a: Pos2, b: Pos2) -> Self {
        let (mut x, mut y) = (a.x, a.y);
        let (mut w, mut h) = (b.x - a.x, b.y - a.y);
        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }
        Self {
            x: x.trunc() as i64,
            y: y.trunc() as i64,
            w: w.trunc() as u32,
            h: h.trunc() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// How a floating image is put down on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceMode {
    /// Verbatim sample writes; the transparent overlay keeps its alpha.
    Overlay,
    /// Alpha-blended into an opaque-history content buffer.
    Bake,
}

/// A sub-image lifted from a buffer at sample resolution. It remembers the
/// logical rectangle it was last placed at.
#[derive(Clone, Debug)]
pub struct FloatingImage {
    image: RgbaImage,
    rect: PixelRect,
    drawn: bool,
}

impl FloatingImage {
    /// Copy the samples under `rect` out of `buffer`. Cells outside the
    /// buffer come back fully transparent.
    pub fn capture(buffer: &PixelBuffer, rect: PixelRect) -> Self {
        let d = buffer.density();
        let block = buffer.copy_rect(rect.x * d as i64, rect.y * d as i64, rect.w * d, rect.h * d);
        let mut image = RgbaImage::new(block.width, block.height);
        for (x, y, px) in image.enumerate_pixels_mut() {
            if let Some(c) = block.get(x, y) {
                *px = Rgba(c);
            }
        }
        Self { image, rect, drawn: false }
    }

    /// A uniformly colored image covering `rect`.
    pub fn solid(rect: PixelRect, density: u32, color: Color) -> Self {
        Self {
            image: RgbaImage::from_pixel(rect.w * density, rect.h * density, color.into()),
            rect,
            drawn: false,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Whether the image has been placed at least once.
    pub fn drawn(&self) -> bool {
        self.drawn
    }

    pub fn flip(&mut self, axis: Axis) {
        match axis {
            Axis::X => imageops::flip_horizontal_in_place(&mut self.image),
            Axis::Y => imageops::flip_vertical_in_place(&mut self.image),
        }
    }

    /// Scale (nearest neighbour) into the rectangle spanned by `a`–`b` and
    /// write it to `target`. Fully transparent samples are skipped.
    pub fn draw(&mut self, target: &mut WriteSession<'_>, a: Pos2, b: Pos2, mode: PlaceMode) {
        let rect = PixelRect::from_corners(a, b);
        self.rect = rect;
        self.drawn = true;
        if rect.is_empty() || self.image.width() == 0 || self.image.height() == 0 {
            return;
        }

        let d = target.density() as i64;
        let (tw, th) = (rect.w as i64 * d, rect.h as i64 * d);
        let (iw, ih) = (self.image.width() as i64, self.image.height() as i64);
        let (ox, oy) = (rect.x * d, rect.y * d);
        // Only the part of the placed rect that lands on the target.
        let (i0, i1) = ((-ox).max(0), tw.min(target.sample_width() as i64 - ox));
        let (j0, j1) = ((-oy).max(0), th.min(target.sample_height() as i64 - oy));
        for j in j0..j1 {
            let src_y = (j * ih / th) as u32;
            for i in i0..i1 {
                let src_x = (i * iw / tw) as u32;
                let px = Color::from(*self.image.get_pixel(src_x, src_y));
                if px.a == 0 {
                    continue;
                }
                let (sx, sy) = (ox + i, oy + j);
                match mode {
                    PlaceMode::Overlay => target.put_sample(sx, sy, px),
                    PlaceMode::Bake => target.set_sample(sx, sy, px, false),
                }
            }
        }
    }
}
