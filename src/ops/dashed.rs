// ============================================================================
// DASHED STROKES: repeating colored segments with a persistent phase
// ============================================================================

use egui::{Pos2, pos2};

use crate::canvas::WriteSession;
use crate::components::colors::Color;
use crate::ops::shapes::stroke_square;

/// Error type for dash pattern construction
#[derive(Debug, Clone, PartialEq)]
pub enum DashPatternError {
    /// Interval lengths sum to zero (or less); phase could never be normalised.
    ZeroLength,
    /// A single interval was given a negative or non-finite length.
    InvalidInterval(f32),
}

impl std::fmt::Display for DashPatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashPatternError::ZeroLength => write!(f, "dash pattern has zero total length"),
            DashPatternError::InvalidInterval(len) => write!(f, "invalid dash interval length: {}", len),
        }
    }
}

impl std::error::Error for DashPatternError {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashInterval {
    pub color: Color,
    pub length: f32,
}

/// Ordered `(color, length)` segments repeated along a stroke.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashedLinePattern {
    intervals: Vec<DashInterval>,
}

impl DashedLinePattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// 10 px black, 10 px white.
    pub fn standard() -> Self {
        Self {
            intervals: vec![
                DashInterval { color: Color::BLACK, length: 10.0 },
                DashInterval { color: Color::WHITE, length: 10.0 },
            ],
        }
    }

    pub fn add_interval(&mut self, color: Color, length: f32) -> Result<(), DashPatternError> {
        if !length.is_finite() || length < 0.0 {
            return Err(DashPatternError::InvalidInterval(length));
        }
        self.intervals.push(DashInterval { color, length });
        Ok(())
    }

    pub fn intervals(&self) -> &[DashInterval] {
        &self.intervals
    }

    pub fn total_length(&self) -> f32 {
        self.intervals.iter().map(|i| i.length).sum()
    }

    /// Scale every interval so the pattern spans `length` in total.
    pub fn resize(&mut self, length: f32) -> Result<(), DashPatternError> {
        let total = self.total_length();
        if total <= 0.0 {
            return Err(DashPatternError::ZeroLength);
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(DashPatternError::InvalidInterval(length));
        }
        let ratio = length / total;
        for interval in &mut self.intervals {
            interval.length *= ratio;
        }
        Ok(())
    }
}

/// A pattern instance with a stroke weight and a running phase.
#[derive(Clone, Debug)]
pub struct DashedLine {
    pattern: DashedLinePattern,
    weight: f32,
    start_phase: f32,
    phase: f32,
    total: f32,
}

impl DashedLine {
    pub fn new(pattern: DashedLinePattern, weight: f32, phase: f32) -> Result<Self, DashPatternError> {
        let total = pattern.total_length();
        if !(total > 0.0) || !total.is_finite() {
            return Err(DashPatternError::ZeroLength);
        }
        let mut line = Self {
            pattern,
            weight,
            start_phase: phase,
            phase: 0.0,
            total,
        };
        line.set_phase(phase);
        Ok(line)
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn pattern(&self) -> &DashedLinePattern {
        &self.pattern
    }

    /// Recompute the phase from an absolute offset, wrapped into `[0, total)`.
    pub fn set_phase(&mut self, offset: f32) {
        let mut phase = offset % self.total;
        if phase < 0.0 {
            phase += self.total;
        }
        // -0.0001 % 20 + 20 can round up to exactly 20.
        if phase >= self.total {
            phase = 0.0;
        }
        self.phase = phase;
    }

    /// Advance the marquee animation.
    pub fn advance(&mut self, by: f32) {
        self.set_phase(self.phase + by);
    }

    /// Return to the phase the line was constructed with.
    pub fn reset(&mut self) {
        self.set_phase(self.start_phase);
    }

    /// Draw a polyline. The pattern runs on continuously across vertices;
    /// the stored phase is unchanged afterwards.
    pub fn draw_shape(&mut self, target: &mut WriteSession<'_>, vertices: &[Pos2]) {
        self.set_phase(self.phase);
        let start = self.phase;
        for pair in vertices.windows(2) {
            self.connect_vertices(target, pair[0], pair[1]);
        }
        self.phase = start;
    }

    /// Closed rectangle through two opposite corners.
    pub fn draw_rect(&mut self, target: &mut WriteSession<'_>, a: Pos2, b: Pos2) {
        self.draw_shape(target, &[a, pos2(b.x, a.y), b, pos2(a.x, b.y), a]);
    }

    fn connect_vertices(&mut self, target: &mut WriteSession<'_>, from: Pos2, to: Pos2) {
        let path = to - from;
        let mut distance = path.length();
        if distance <= 0.0 {
            return;
        }
        let dir = path / distance;
        let intervals = self.pattern.intervals();

        // Locate the interval the phase falls in, and how far into it.
        let mut offset = self.phase;
        let mut i = 0;
        while i < intervals.len() && offset >= intervals[i].length {
            offset -= intervals[i].length;
            i += 1;
        }
        if i == intervals.len() {
            i = 0;
            offset = 0.0;
        }

        let mut cursor = from;
        while distance > 0.0 {
            let interval = intervals[i];
            let len = (interval.length - offset).min(distance);
            if len > 0.0 {
                let next = cursor + dir * len;
                stroke_square(target, cursor, next, self.weight, interval.color);
                cursor = next;
                distance -= len;
                self.phase += len;
            }
            offset = 0.0;
            i = (i + 1) % intervals.len();
        }
        self.phase %= self.total;
    }
}
