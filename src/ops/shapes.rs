// ============================================================================
// SHAPES: line stepping, brush stamps and stroked segments
// ============================================================================

use egui::{Pos2, Vec2, pos2};

use crate::canvas::WriteSession;
use crate::components::colors::Color;

/// Visit every unit step from `from` toward `to`, then `to` itself.
///
/// Steps that would overshoot `to` are not visited.
pub fn step_line(from: Pos2, to: Pos2, mut visit: impl FnMut(Pos2)) {
    let path = to - from;
    let distance = path.length();
    if distance > 0.0 {
        let dir = path / distance;
        let mut current = from;
        while (to - current).dot(dir) > 0.0 {
            visit(current);
            current += dir;
        }
    }
    visit(to);
}

/// Stamp a `thickness × thickness` square of logical pixels centred on
/// `center` (rounded to the nearest pixel).
///
/// Opaque colors replace every sample of each pixel; translucent colors are
/// blended per sample so overlapping edges stay smooth at high density.
pub fn stamp_square(session: &mut WriteSession<'_>, center: Pos2, thickness: u32, color: Color) {
    let t = thickness.max(1) as i64;
    let cx = center.x.round() as i64;
    let cy = center.y.round() as i64;
    let start_x = cx - t / 2;
    let start_y = cy - t / 2;
    let replace = color.is_opaque();
    for y in start_y..start_y + t {
        for x in start_x..start_x + t {
            session.set(x as f32, y as f32, color, replace, false);
        }
    }
}

/// Distance from `p` to the segment `a`–`b`.
fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Blend a round-capped segment of width `thickness` into the buffer,
/// touching each covered logical pixel exactly once.
pub fn stroke_round(session: &mut WriteSession<'_>, a: Pos2, b: Pos2, thickness: f32, color: Color) {
    let radius = (thickness / 2.0).max(0.5);
    let min_x = (a.x.min(b.x) - radius).floor().max(0.0) as i64;
    let min_y = (a.y.min(b.y) - radius).floor().max(0.0) as i64;
    let max_x = (a.x.max(b.x) + radius).ceil().min(session.width() as f32) as i64;
    let max_y = (a.y.max(b.y) + radius).ceil().min(session.height() as f32) as i64;
    for y in min_y..max_y {
        for x in min_x..max_x {
            let center = pos2(x as f32 + 0.5, y as f32 + 0.5);
            if distance_to_segment(center, a, b) <= radius {
                session.set(x as f32, y as f32, color, false, false);
            }
        }
    }
}

/// Overwrite a square-capped segment of width `weight` at sample resolution.
/// Coordinates are logical; coverage is decided per sample centre with
/// half-open bounds so adjacent segments never double-cover a sample.
pub fn stroke_square(session: &mut WriteSession<'_>, a: Pos2, b: Pos2, weight: f32, color: Color) {
    let path = b - a;
    let len = path.length();
    if len <= f32::EPSILON || weight <= 0.0 {
        return;
    }
    let dir = path / len;
    let normal = Vec2::new(-dir.y, dir.x);
    let half = weight / 2.0;
    let d = session.density() as f32;

    let lo = a.min(b) - Vec2::splat(half);
    let hi = a.max(b) + Vec2::splat(half);
    let sx0 = (lo.x * d).floor().max(0.0) as i64;
    let sy0 = (lo.y * d).floor().max(0.0) as i64;
    let sx1 = ((hi.x * d).ceil() as i64).min(session.sample_width() as i64);
    let sy1 = ((hi.y * d).ceil() as i64).min(session.sample_height() as i64);

    for sy in sy0..sy1 {
        for sx in sx0..sx1 {
            let c = pos2((sx as f32 + 0.5) / d, (sy as f32 + 0.5) / d);
            let along = (c - a).dot(dir);
            let across = (c - a).dot(normal);
            if along >= -half && along < len + half && across >= -half && across < half {
                session.put_sample(sx, sy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelBuffer;

    #[test]
    fn step_line_visits_every_unit_step_and_the_end() {
        let mut seen = Vec::new();
        step_line(pos2(0.0, 0.0), pos2(3.0, 0.0), |p| seen.push(p));
        assert_eq!(seen, vec![pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(2.0, 0.0), pos2(3.0, 0.0)]);

        let mut seen = Vec::new();
        step_line(pos2(0.0, 0.0), pos2(0.0, 2.5), |p| seen.push(p));
        assert_eq!(seen.len(), 4);
        assert_eq!(seen.last(), Some(&pos2(0.0, 2.5)));
    }

    #[test]
    fn step_line_with_equal_endpoints_visits_once() {
        let mut seen = 0;
        step_line(pos2(4.0, 4.0), pos2(4.0, 4.0), |_| seen += 1);
        assert_eq!(seen, 1);
    }

    #[test]
    fn stamp_square_covers_thickness_pixels() {
        let mut buf = PixelBuffer::new(10, 10, 1, Color::WHITE);
        stamp_square(&mut buf.begin_write(), pos2(5.0, 5.0), 3, Color::BLACK);
        let black = buf.as_image().pixels().filter(|p| p.0 == [0, 0, 0, 255]).count();
        assert_eq!(black, 9);
        assert_eq!(buf.get(4.0, 4.0), Some(Color::BLACK));
        assert_eq!(buf.get(6.0, 6.0), Some(Color::BLACK));
        assert_eq!(buf.get(7.0, 6.0), Some(Color::WHITE));
    }

    #[test]
    fn stroke_round_blends_each_pixel_once() {
        let mut buf = PixelBuffer::new(10, 10, 1, Color::WHITE);
        let c = Color::rgba(0, 0, 0, 51);
        stroke_round(&mut buf.begin_write(), pos2(1.5, 5.5), pos2(8.5, 5.5), 1.0, c);
        assert_eq!(buf.get(5.0, 5.0), Some(Color::rgb(204, 204, 204)));
        assert_eq!(buf.get(5.0, 4.0), Some(Color::WHITE));
    }

    #[test]
    fn stroke_square_draws_one_sample_wide_edges() {
        let mut buf = PixelBuffer::new(10, 10, 2, Color::TRANSPARENT);
        stroke_square(&mut buf.begin_write(), pos2(2.0, 3.0), pos2(6.0, 3.0), 1.0, Color::BLACK);
        // Weight 1 logical px = 2 samples tall at density 2, capped by half a pixel.
        assert_eq!(buf.sample(5, 5), Some(Color::BLACK));
        assert_eq!(buf.sample(5, 6), Some(Color::BLACK));
        assert_eq!(buf.sample(5, 7), Some(Color::TRANSPARENT));
        assert_eq!(buf.sample(3, 5), Some(Color::BLACK));
        assert_eq!(buf.sample(12, 5), Some(Color::BLACK));
        assert_eq!(buf.sample(13, 5), Some(Color::TRANSPARENT));
        assert_eq!(buf.sample(2, 5), Some(Color::TRANSPARENT));
    }
}
