// ============================================================================
// FLOATING SELECTION: lift, move, resize/flip and an animated marquee
// ============================================================================

use egui::{Pos2, Vec2, pos2};

use crate::canvas::PixelBuffer;
use crate::components::colors::Color;
use crate::ops::dashed::DashedLine;
use crate::ops::transform::{Axis, FloatingImage, PixelRect, PlaceMode};
use crate::log_info;

/// Named hit region of a floating selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    Inside,
    Left,
    Right,
    Top,
    Bottom,
    LeftTop,
    RightTop,
    RightBottom,
    LeftBottom,
}

impl Handle {
    pub fn touches_left(self) -> bool {
        matches!(self, Handle::Left | Handle::LeftTop | Handle::LeftBottom)
    }

    pub fn touches_right(self) -> bool {
        matches!(self, Handle::Right | Handle::RightTop | Handle::RightBottom)
    }

    pub fn touches_top(self) -> bool {
        matches!(self, Handle::Top | Handle::LeftTop | Handle::RightTop)
    }

    pub fn touches_bottom(self) -> bool {
        matches!(self, Handle::Bottom | Handle::LeftBottom | Handle::RightBottom)
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::LeftTop | Handle::RightTop | Handle::RightBottom | Handle::LeftBottom
        )
    }

    /// The same handle with its side on `axis` swapped.
    pub fn mirrored(self, axis: Axis) -> Handle {
        match (axis, self) {
            (Axis::X, Handle::Left) => Handle::Right,
            (Axis::X, Handle::Right) => Handle::Left,
            (Axis::X, Handle::LeftTop) => Handle::RightTop,
            (Axis::X, Handle::RightTop) => Handle::LeftTop,
            (Axis::X, Handle::LeftBottom) => Handle::RightBottom,
            (Axis::X, Handle::RightBottom) => Handle::LeftBottom,
            (Axis::Y, Handle::Top) => Handle::Bottom,
            (Axis::Y, Handle::Bottom) => Handle::Top,
            (Axis::Y, Handle::LeftTop) => Handle::LeftBottom,
            (Axis::Y, Handle::LeftBottom) => Handle::LeftTop,
            (Axis::Y, Handle::RightTop) => Handle::RightBottom,
            (Axis::Y, Handle::RightBottom) => Handle::RightTop,
            (_, other) => other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    /// Rubber-banding a new rectangle.
    DraggingNew,
    /// A lifted image floats over the content.
    Committed,
    Moving,
    Resizing,
}

/// Rectangular floating selection over a content buffer.
///
/// While `selected()` is true an image exists and `point1`/`point2` are the
/// top-left/bottom-right corners of the rectangle it is drawn into.
#[derive(Clone, Debug)]
pub struct FloatingSelection {
    point1: Option<Pos2>,
    point2: Option<Pos2>,
    image: Option<FloatingImage>,
    handle: Option<Handle>,
    selected: bool,
    state: SelectionState,
    marquee: DashedLine,
    hit_radius: f32,
    frame_divisor: f32,
}

impl FloatingSelection {
    /// `hit_radius` is in screen pixels; `frame_divisor` converts elapsed
    /// milliseconds into marquee phase units.
    pub fn new(marquee: DashedLine, hit_radius: f32, frame_divisor: f32) -> Self {
        Self {
            point1: None,
            point2: None,
            image: None,
            handle: None,
            selected: false,
            state: SelectionState::Empty,
            marquee,
            hit_radius,
            frame_divisor: if frame_divisor > 0.0 { frame_divisor } else { 1.0 },
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    pub fn image(&self) -> Option<&FloatingImage> {
        self.image.as_ref()
    }

    pub fn marquee(&self) -> &DashedLine {
        &self.marquee
    }

    pub fn corners(&self) -> Option<(Pos2, Pos2)> {
        Some((self.point1?, self.point2?))
    }

    /// Region of the floating image under `point` (buffer space). The
    /// tolerance is `hit_radius / zoom` so it stays constant on screen.
    ///
    /// Corners win over edges, edges over the interior; among corners or
    /// among edges the nearest one is picked.
    pub fn hit_test(&self, point: Pos2, zoom: f32) -> Option<Handle> {
        if !self.selected {
            return None;
        }
        let (p1, p2) = self.corners()?;
        let radius = self.hit_radius / zoom.max(f32::EPSILON);
        let (left, top, right, bottom) = (p1.x, p1.y, p2.x, p2.y);

        let corners = [
            (Handle::LeftTop, pos2(left, top)),
            (Handle::RightTop, pos2(right, top)),
            (Handle::RightBottom, pos2(right, bottom)),
            (Handle::LeftBottom, pos2(left, bottom)),
        ];
        let corner = corners
            .iter()
            .map(|&(h, c)| (h, point.distance(c)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((h, _)) = corner {
            return Some(h);
        }

        let within_y = point.y >= top && point.y <= bottom;
        let within_x = point.x >= left && point.x <= right;
        let edges = [
            (Handle::Left, within_y, (point.x - left).abs()),
            (Handle::Right, within_y, (point.x - right).abs()),
            (Handle::Top, within_x, (point.y - top).abs()),
            (Handle::Bottom, within_x, (point.y - bottom).abs()),
        ];
        let edge = edges
            .iter()
            .filter(|&&(_, span, d)| span && d <= radius)
            .min_by(|a, b| a.2.total_cmp(&b.2));
        if let Some(&(h, _, _)) = edge {
            return Some(h);
        }

        (within_x && within_y).then_some(Handle::Inside)
    }

    /// Pointer pressed. `pointer` is the unconstrained buffer-space pointer,
    /// `constrained` the same point clamped into the buffer.
    pub fn on_press(&mut self, content: &mut PixelBuffer, pointer: Pos2, constrained: Pos2, zoom: f32) {
        match self.hit_test(pointer, zoom) {
            Some(handle) => {
                self.handle = Some(handle);
                self.state = if handle == Handle::Inside {
                    SelectionState::Moving
                } else {
                    SelectionState::Resizing
                };
            }
            None => {
                self.commit(content);
                self.point1 = Some(constrained);
                self.point2 = Some(constrained);
                self.marquee.reset();
                self.state = SelectionState::DraggingNew;
            }
        }
    }

    /// Pointer dragged by `delta` (buffer units).
    pub fn on_drag(&mut self, constrained: Pos2, delta: Vec2, proportional: bool) {
        match self.state {
            SelectionState::DraggingNew => self.point2 = Some(constrained),
            SelectionState::Moving => {
                if let (Some(p1), Some(p2)) = (self.point1.as_mut(), self.point2.as_mut()) {
                    *p1 += delta;
                    *p2 += delta;
                }
            }
            SelectionState::Resizing => self.resize_by_delta(delta, proportional),
            SelectionState::Empty | SelectionState::Committed => {}
        }
    }

    /// Pointer released. A fresh rectangle is lifted out of `content`, which
    /// is filled with `background` underneath; an empty one is discarded.
    pub fn on_release(&mut self, content: &mut PixelBuffer, constrained: Pos2, background: Color) {
        match self.state {
            SelectionState::DraggingNew => {
                let Some(p1) = self.point1 else {
                    self.state = SelectionState::Empty;
                    return;
                };
                let rect = PixelRect::from_corners(p1, constrained);
                if rect.is_empty() {
                    log_info!("selection discarded: empty rectangle at ({}, {})", rect.x, rect.y);
                    self.clear();
                    return;
                }

                let image = FloatingImage::capture(content, rect);
                let mut hole = FloatingImage::solid(rect, content.density(), background);
                let (a, b) = rect_corners(rect);
                hole.draw(&mut content.begin_write(), a, b, PlaceMode::Bake);

                self.point1 = Some(a);
                self.point2 = Some(b);
                self.image = Some(image);
                self.selected = true;
                self.state = SelectionState::Committed;
            }
            SelectionState::Moving | SelectionState::Resizing => {
                self.handle = None;
                self.state = SelectionState::Committed;
            }
            SelectionState::Empty | SelectionState::Committed => {}
        }
    }

    /// Live rubber band while a new rectangle is being dragged.
    pub fn apply(&mut self, overlay: &mut PixelBuffer, constrained: Pos2) {
        if self.state != SelectionState::DraggingNew {
            return;
        }
        if let Some(p1) = self.point1 {
            self.marquee.draw_rect(&mut overlay.begin_write(), p1, constrained);
        }
    }

    /// Redraw the floating image and marquee on the overlay, advancing the
    /// marquee by `elapsed_ms / frame_divisor`.
    pub fn draw_each_frame(&mut self, overlay: &mut PixelBuffer, elapsed_ms: f32) {
        if !self.selected {
            return;
        }
        let (Some(p1), Some(p2), Some(image)) = (self.point1, self.point2, self.image.as_mut()) else {
            return;
        };
        let mut session = overlay.begin_write();
        image.draw(&mut session, p1, p2, PlaceMode::Overlay);
        self.marquee.advance(elapsed_ms / self.frame_divisor);
        self.marquee.draw_rect(&mut session, p1, p2);
    }

    /// Bake the floating image into `content` and return to `Empty`.
    /// Returns whether anything was baked.
    pub fn commit(&mut self, content: &mut PixelBuffer) -> bool {
        let baked = match (self.selected, self.point1, self.point2, self.image.as_mut()) {
            (true, Some(p1), Some(p2), Some(image)) => {
                let stats = {
                    let mut session = content.begin_write();
                    image.draw(&mut session, p1, p2, PlaceMode::Bake);
                    session.finish()
                };
                let r = image.rect();
                log_info!(
                    "selection baked at ({}, {}) {}x{} ({} samples)",
                    r.x,
                    r.y,
                    r.w,
                    r.h,
                    stats.samples_written
                );
                true
            }
            _ => false,
        };
        self.clear();
        baked
    }

    fn clear(&mut self) {
        self.point1 = None;
        self.point2 = None;
        self.image = None;
        self.handle = None;
        self.selected = false;
        self.state = SelectionState::Empty;
    }

    /// Move the grabbed edges by `delta`. An edge dragged past its opposite
    /// edge flips the image on that axis and the handle swaps sides.
    ///
    /// `proportional` on a corner handle only resizes along the axis with the
    /// larger movement.
    fn resize_by_delta(&mut self, mut delta: Vec2, proportional: bool) {
        let (Some(mut handle), Some(p1), Some(p2), Some(image)) =
            (self.handle, self.point1.as_mut(), self.point2.as_mut(), self.image.as_mut())
        else {
            return;
        };
        if proportional && handle.is_corner() {
            if delta.x.abs() >= delta.y.abs() {
                delta.y = 0.0;
            } else {
                delta.x = 0.0;
            }
        }

        if handle.touches_right() {
            p2.x += delta.x;
        } else if handle.touches_left() {
            p1.x += delta.x;
        }
        if p1.x > p2.x {
            std::mem::swap(&mut p1.x, &mut p2.x);
            image.flip(Axis::X);
            handle = handle.mirrored(Axis::X);
        }

        if handle.touches_bottom() {
            p2.y += delta.y;
        } else if handle.touches_top() {
            p1.y += delta.y;
        }
        if p1.y > p2.y {
            std::mem::swap(&mut p1.y, &mut p2.y);
            image.flip(Axis::Y);
            handle = handle.mirrored(Axis::Y);
        }

        self.handle = Some(handle);
    }
}

fn rect_corners(rect: PixelRect) -> (Pos2, Pos2) {
    (
        pos2(rect.x as f32, rect.y as f32),
        pos2((rect.x + rect.w as i64) as f32, (rect.y + rect.h as i64) as f32),
    )
}
