// ============================================================================
// FLOOD FILL: stack-based scanline fill at sample resolution
// ============================================================================

use crate::canvas::{PixelBuffer, WriteSession};
use crate::components::colors::Color;
use crate::log_warn;

/// Hard bound on popped intervals per fill. Reaching it aborts silently and
/// leaves whatever was painted so far.
pub const MAX_FILL_ITERATIONS: usize = 10_000;

/// One horizontal run of samples `[x1, x2]` on row `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FillSpan {
    x1: i64,
    x2: i64,
    y: i64,
}

/// Outcome of a [`flood_fill`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Intervals popped and painted.
    pub intervals: usize,
    pub samples_written: usize,
    /// The iteration cap stopped the fill before the stack drained.
    pub aborted: bool,
}

/// Fill the region connected to logical pixel `(x, y)` whose samples match
/// the seed sample within `deviation`.
///
/// Filling a region that already matches `color` is a no-op.
pub fn flood_fill(buffer: &mut PixelBuffer, x: f32, y: f32, color: Color, deviation: f32) -> FillReport {
    flood_fill_capped(buffer, x, y, color, deviation, MAX_FILL_ITERATIONS)
}

pub(crate) fn flood_fill_capped(
    buffer: &mut PixelBuffer,
    x: f32,
    y: f32,
    color: Color,
    deviation: f32,
    max_iterations: usize,
) -> FillReport {
    let mut report = FillReport::default();
    let Some((sx, sy)) = buffer.sample_origin(x, y) else { return report };
    let Some(base) = buffer.sample(sx as i64, sy as i64) else { return report };
    if base.is_equal(&color, deviation) {
        return report;
    }

    let last_col = buffer.sample_width() as i64 - 1;
    let rows = buffer.sample_height() as i64;
    let mut stack = vec![FillSpan { x1: sx as i64, x2: sx as i64, y: sy as i64 }];
    let matches = |s: &WriteSession<'_>, sx: i64, sy: i64| {
        s.sample(sx, sy).is_some_and(|c| c.is_equal(&base, deviation))
    };
    let mut session = buffer.begin_write();

    while let Some(mut span) = stack.pop() {
        if report.intervals >= max_iterations {
            report.aborted = true;
            break;
        }
        report.intervals += 1;

        while span.x1 > 0 && matches(&session, span.x1 - 1, span.y) {
            span.x1 -= 1;
        }
        while span.x2 < last_col && matches(&session, span.x2 + 1, span.y) {
            span.x2 += 1;
        }

        for sx in span.x1..=span.x2 {
            session.set_sample(sx, span.y, color, false);
        }

        for dy in [1, -1] {
            let ny = span.y + dy;
            if ny < 0 || ny >= rows {
                continue;
            }
            let mut run: Option<FillSpan> = None;
            for sx in span.x1..=span.x2 {
                if matches(&session, sx, ny) {
                    match run.as_mut() {
                        Some(r) => r.x2 = sx,
                        None => run = Some(FillSpan { x1: sx, x2: sx, y: ny }),
                    }
                } else if let Some(r) = run.take() {
                    stack.push(r);
                }
            }
            if let Some(r) = run {
                stack.push(r);
            }
        }
    }

    report.samples_written = session.finish().samples_written;
    if report.aborted {
        log_warn!(
            "flood fill stopped at {} intervals ({} samples painted)",
            report.intervals,
            report.samples_written
        );
    }
    report
}
