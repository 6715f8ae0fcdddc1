// ============================================================================
// VIEWPORT: zoom / pan over the buffer and pointer-space mapping
// ============================================================================
//
// The content layer is positioned in its container at `container_origin`
// (screen space) and then visually transformed like a CSS layer:
//
//   screen(p) = container_origin + pan + anchor + (p − anchor) · zoom
//
// where `p` is a buffer-space point and `anchor` is the transform origin.
// The layer's on-screen top-left is therefore
//
//   top_left = container_origin + pan + anchor · (1 − zoom)
//
// and the inverse mapping is `(screen − top_left) / zoom`. Pan lives in the
// layer translation only; it is never added a second time in the mapping.
// Scrolling the container by `scroll` moves the layer by `-scroll` on screen.

use egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Buffer edge length (logical px) per unit of maximum zoom.
const ZOOM_MAX_DIVISOR: f32 = 25.0;

/// The visual transform currently applied to the content and overlay layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerTransform {
    pub translate: Vec2,
    pub scale: f32,
    pub origin: Pos2,
}

#[derive(Clone, Debug)]
pub struct Viewport {
    zoom: f32,
    zoom_min: f32,
    zoom_max: f32,
    pan: Vec2,
    anchor: Pos2,
    sensitivity: f32,
    buffer_size: Vec2,
    container_origin: Pos2,
    scroll: Vec2,
    transform: LayerTransform,
}

impl Viewport {
    pub fn new(buffer_width: u32, buffer_height: u32, zoom_min: f32, sensitivity: f32) -> Self {
        let longest = buffer_width.max(buffer_height) as f32;
        let zoom_max = (longest / ZOOM_MAX_DIVISOR).max(1.0).max(zoom_min);
        let mut vp = Self {
            zoom: 1.0_f32.clamp(zoom_min, zoom_max),
            zoom_min,
            zoom_max,
            pan: Vec2::ZERO,
            anchor: Pos2::ZERO,
            sensitivity,
            buffer_size: vec2(buffer_width as f32, buffer_height as f32),
            container_origin: Pos2::ZERO,
            scroll: Vec2::ZERO,
            transform: LayerTransform { translate: Vec2::ZERO, scale: 1.0, origin: Pos2::ZERO },
        };
        vp.restate_transform();
        vp
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_range(&self) -> (f32, f32) {
        (self.zoom_min, self.zoom_max)
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn anchor(&self) -> Pos2 {
        self.anchor
    }

    pub fn transform(&self) -> LayerTransform {
        self.transform
    }

    pub fn buffer_size(&self) -> Vec2 {
        self.buffer_size
    }

    /// Where the untransformed layer sits inside the shell (screen space).
    pub fn set_container_origin(&mut self, origin: Pos2) {
        self.container_origin = origin;
    }

    /// Scroll offset of the container the surface is clipped by.
    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(self.zoom_min, self.zoom_max);
        self.restate_transform();
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.pan = vec2(x, y);
        self.restate_transform();
    }

    pub fn add_pan(&mut self, dx: f32, dy: f32) {
        self.pan += vec2(dx, dy);
        self.restate_transform();
    }

    fn restate_transform(&mut self) {
        self.transform = LayerTransform {
            translate: self.pan,
            scale: self.zoom,
            origin: self.anchor,
        };
    }

    /// Screen-space top-left corner of the transformed layer.
    pub fn layer_top_left(&self) -> Pos2 {
        self.container_origin - self.scroll + self.pan + self.anchor.to_vec2() * (1.0 - self.zoom)
    }

    /// Screen-space rectangle covered by the whole buffer.
    pub fn layer_rect(&self) -> Rect {
        Rect::from_min_size(self.layer_top_left(), self.buffer_size * self.zoom)
    }

    pub fn to_buffer(&self, screen: Pos2) -> Pos2 {
        ((screen - self.layer_top_left()) / self.zoom).to_pos2()
    }

    pub fn to_screen(&self, buffer: Pos2) -> Pos2 {
        self.layer_top_left() + buffer.to_vec2() * self.zoom
    }

    /// Buffer-space point clamped into `[0, W] × [0, H]`.
    pub fn to_buffer_constrained(&self, screen: Pos2) -> Pos2 {
        let p = self.to_buffer(screen);
        pos2(
            p.x.clamp(0.0, self.buffer_size.x),
            p.y.clamp(0.0, self.buffer_size.y),
        )
    }

    /// Screen-space movement expressed in buffer units.
    pub fn delta_to_buffer(&self, screen_delta: Vec2) -> Vec2 {
        screen_delta / self.zoom
    }

    /// Whether the pointer lies over the buffer.
    pub fn mouse_in_canvas(&self, screen: Pos2) -> bool {
        let p = self.to_buffer(screen);
        p.x >= 0.0 && p.x <= self.buffer_size.x && p.y >= 0.0 && p.y <= self.buffer_size.y
    }

    /// Anchor-preserving wheel zoom. The pan correction must run before the
    /// zoom changes, otherwise the point under the cursor drifts.
    pub fn zoom_by_wheel(&mut self, delta: f32, screen_mouse: Pos2) {
        let m = self.to_buffer(screen_mouse);
        self.pan += (m - self.anchor) * (self.zoom - 1.0);
        self.anchor = m;
        let zoom_delta = delta * self.sensitivity * self.zoom;
        self.zoom = (self.zoom - zoom_delta).clamp(self.zoom_min, self.zoom_max);
        self.restate_transform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn zoom_max_follows_buffer_size() {
        let vp = Viewport::new(1000, 500, 0.1, 0.001);
        assert_eq!(vp.zoom_range(), (0.1, 40.0));
        let tiny = Viewport::new(10, 10, 0.1, 0.001);
        assert_eq!(tiny.zoom_range(), (0.1, 1.0));
        assert_eq!(tiny.zoom(), 1.0);
    }

    #[test]
    fn mapping_round_trips() {
        let mut vp = Viewport::new(400, 300, 0.1, 0.001);
        vp.set_container_origin(pos2(30.0, 40.0));
        vp.set_pan(12.0, -7.0);
        vp.set_zoom(2.5);
        let b = pos2(123.0, 45.5);
        assert!(close(vp.to_buffer(vp.to_screen(b)), b));
        assert_eq!(vp.transform().scale, 2.5);
        assert_eq!(vp.transform().translate, vec2(12.0, -7.0));
    }

    #[test]
    fn wheel_zoom_keeps_point_under_cursor() {
        let mut vp = Viewport::new(800, 600, 0.1, 0.001);
        vp.set_container_origin(pos2(50.0, 20.0));
        let mouse = pos2(310.0, 222.0);
        for delta in [-120.0, -300.0, 45.0, 100.0, -10.0] {
            let before = vp.to_buffer(mouse);
            vp.zoom_by_wheel(delta, mouse);
            assert!(close(vp.to_buffer(mouse), before), "drift at delta {delta}");
        }
        // Moving the cursor between zooms re-anchors without a jump.
        let other = pos2(100.0, 400.0);
        let before = vp.to_buffer(other);
        vp.zoom_by_wheel(-50.0, other);
        assert!(close(vp.to_buffer(other), before));
        assert_eq!(vp.anchor(), before);
    }

    #[test]
    fn wheel_zoom_is_clamped() {
        let mut vp = Viewport::new(500, 500, 0.1, 0.001);
        let (lo, hi) = vp.zoom_range();
        for delta in [-1e6, -500.0, -1.0, 1e6, 999.0, -3000.0, 0.5, 1e9] {
            vp.zoom_by_wheel(delta, pos2(120.0, 80.0));
            assert!(vp.zoom() >= lo && vp.zoom() <= hi);
        }
        vp.zoom_by_wheel(-1e6, pos2(0.0, 0.0));
        assert_eq!(vp.zoom(), hi);
    }

    #[test]
    fn mouse_in_canvas_accounts_for_scroll() {
        let mut vp = Viewport::new(100, 100, 0.1, 0.001);
        assert!(vp.mouse_in_canvas(pos2(100.0, 0.0)));
        assert!(!vp.mouse_in_canvas(pos2(100.5, 10.0)));
        vp.set_scroll(vec2(-20.0, 0.0));
        assert!(vp.mouse_in_canvas(pos2(110.0, 10.0)));
        assert!(!vp.mouse_in_canvas(pos2(10.0, 10.0)));
        // The gate and the mapping agree on where the pointer is.
        assert_eq!(vp.to_buffer(pos2(110.0, 10.0)), pos2(90.0, 10.0));
        assert!(close(vp.to_buffer(vp.to_screen(pos2(3.0, 4.0))), pos2(3.0, 4.0)));
    }

    #[test]
    fn constrained_pointer_and_deltas() {
        let mut vp = Viewport::new(100, 50, 0.1, 0.001);
        vp.set_zoom(2.0);
        assert_eq!(vp.to_buffer_constrained(pos2(-40.0, 500.0)), pos2(0.0, 50.0));
        assert_eq!(vp.delta_to_buffer(vec2(10.0, -4.0)), vec2(5.0, -2.0));
    }
}
