use egui::{Pos2, Vec2};
use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::PixelBuffer;
use crate::components::colors::Color;
use crate::components::tools::{Instrument, Toolbox};
use crate::settings::{EditorSettings, SettingsError, ZoomModifier};
use crate::viewport::Viewport;

// ============================================================================
// EDITOR CONTEXT: everything an instrument may read or mutate
// ============================================================================

/// Modifier keys held during the current event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn held(&self, modifier: ZoomModifier) -> bool {
        match modifier {
            ZoomModifier::Ctrl => self.ctrl,
            ZoomModifier::Alt => self.alt,
            ZoomModifier::Shift => self.shift,
            ZoomModifier::None => true,
        }
    }
}

/// Pointer position in screen space, this frame and last frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub screen: Pos2,
    pub previous: Pos2,
    pub pressed: bool,
}

pub struct EditorContext {
    pub content: PixelBuffer,
    /// Transparent surface cleared and redrawn every frame.
    pub overlay: PixelBuffer,
    pub viewport: Viewport,
    pub pointer: PointerState,
    pub modifiers: Modifiers,
    pub background: Color,
}

impl EditorContext {
    pub fn new(settings: &EditorSettings) -> Self {
        Self {
            content: PixelBuffer::new(settings.width, settings.height, settings.density, settings.background),
            overlay: PixelBuffer::new(settings.width, settings.height, settings.density, Color::TRANSPARENT),
            viewport: Viewport::new(
                settings.width,
                settings.height,
                settings.zoom_min,
                settings.wheel_sensitivity,
            ),
            pointer: PointerState::default(),
            modifiers: Modifiers::default(),
            background: settings.background,
        }
    }

    /// Pointer in buffer space.
    pub fn mouse(&self) -> Pos2 {
        self.viewport.to_buffer(self.pointer.screen)
    }

    /// Last frame's pointer in buffer space.
    pub fn pmouse(&self) -> Pos2 {
        self.viewport.to_buffer(self.pointer.previous)
    }

    pub fn mouse_constrained(&self) -> Pos2 {
        self.viewport.to_buffer_constrained(self.pointer.screen)
    }

    pub fn mouse_in_canvas(&self) -> bool {
        self.viewport.mouse_in_canvas(self.pointer.screen)
    }
}

// ============================================================================
// EDITOR APP: event entry points for the hosting shell
// ============================================================================

pub struct EditorApp {
    ctx: EditorContext,
    tools: Toolbox,
    settings: EditorSettings,
    /// The current press started over the buffer.
    gesture: bool,
}

impl EditorApp {
    pub fn new(settings: EditorSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let tools = Toolbox::from_settings(&settings)
            .map_err(|e| SettingsError::Invalid(format!("marquee: {}", e)))?;
        Ok(Self {
            ctx: EditorContext::new(&settings),
            tools,
            settings,
            gesture: false,
        })
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn context(&self) -> &EditorContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EditorContext {
        &mut self.ctx
    }

    pub fn content(&self) -> &PixelBuffer {
        &self.ctx.content
    }

    pub fn overlay(&self) -> &PixelBuffer {
        &self.ctx.overlay
    }

    pub fn viewport(&self) -> &Viewport {
        &self.ctx.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.ctx.viewport
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.tools
    }

    pub fn instrument(&self) -> &Instrument {
        self.tools.active()
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.ctx.modifiers = modifiers;
    }

    // ---- pointer ------------------------------------------------------------

    /// Presses outside the buffer are ignored, as are the drags and release
    /// that follow them.
    pub fn pointer_pressed(&mut self, screen: Pos2) {
        self.ctx.pointer.screen = screen;
        self.ctx.pointer.pressed = true;
        self.gesture = self.ctx.mouse_in_canvas();
        if self.gesture {
            self.tools.active_mut().on_press(&mut self.ctx);
        }
    }

    pub fn pointer_moved(&mut self, screen: Pos2) {
        let delta = self.ctx.viewport.delta_to_buffer(screen - self.ctx.pointer.screen);
        self.ctx.pointer.screen = screen;
        if self.ctx.pointer.pressed && self.gesture {
            self.tools.active_mut().on_drag(&mut self.ctx, delta);
        }
    }

    pub fn pointer_released(&mut self, screen: Pos2) {
        self.ctx.pointer.screen = screen;
        self.ctx.pointer.pressed = false;
        if std::mem::take(&mut self.gesture) {
            self.tools.active_mut().on_release(&mut self.ctx);
        }
    }

    // ---- view ---------------------------------------------------------------

    /// Zoom around the pointer if the configured modifier is held.
    /// Returns whether the wheel zoomed.
    pub fn wheel(&mut self, delta: f32, screen: Pos2) -> bool {
        if !self.ctx.modifiers.held(self.settings.zoom_modifier) {
            return false;
        }
        self.ctx.viewport.zoom_by_wheel(delta, screen);
        true
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.ctx.viewport.add_pan(delta.x, delta.y);
    }

    // ---- frame --------------------------------------------------------------

    /// One display frame: clear the overlay, let the active instrument redraw
    /// it, paint while the pointer is held over the buffer, then remember the
    /// pointer for the next frame's segment.
    pub fn frame(&mut self, elapsed_ms: f32) {
        self.ctx.overlay.begin_write().clear(Color::TRANSPARENT);
        let instrument = self.tools.active_mut();
        instrument.on_frame_tick(&mut self.ctx, elapsed_ms);
        if self.ctx.pointer.pressed && self.gesture && self.ctx.mouse_in_canvas() {
            instrument.apply(&mut self.ctx);
        }
        self.ctx.pointer.previous = self.ctx.pointer.screen;
    }

    // ---- instruments --------------------------------------------------------

    pub fn select_instrument(&mut self, name: &str) -> bool {
        self.tools.select(name, &mut self.ctx)
    }

    /// Bake any floating selection into the content buffer.
    pub fn commit_selection(&mut self) -> bool {
        match self.tools.active_mut() {
            Instrument::Select(sel) => sel.commit(&mut self.ctx.content),
            _ => false,
        }
    }

    /// Returns the new thickness, or `None` for instruments without one.
    pub fn increase_thickness(&mut self) -> Option<u32> {
        self.tools.active_mut().thickness_mut().map(|t| t.increase())
    }

    pub fn decrease_thickness(&mut self) -> Option<u32> {
        self.tools.active_mut().thickness_mut().map(|t| t.decrease())
    }

    /// Overlay alpha-composited over the content, at sample resolution.
    pub fn composite(&self) -> RgbaImage {
        let mut out = self.ctx.content.as_image().clone();
        let overlay: &[u8] = self.ctx.overlay.as_image();
        let dst: &mut [u8] = &mut out;
        dst.par_chunks_exact_mut(4)
            .zip(overlay.par_chunks_exact(4))
            .for_each(|(dst, src)| {
                let a = src[3] as u32;
                if a == 0 {
                    return;
                }
                let inv = 255 - a;
                for i in 0..3 {
                    dst[i] = ((src[i] as u32 * a + dst[i] as u32 * inv + 127) / 255) as u8;
                }
                dst[3] = (a + (dst[3] as u32 * inv + 127) / 255) as u8;
            });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn app(width: u32, height: u32) -> EditorApp {
        let mut settings = EditorSettings::default();
        settings.width = width;
        settings.height = height;
        EditorApp::new(settings).unwrap()
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = EditorSettings::default();
        settings.density = 0;
        assert!(EditorApp::new(settings).is_err());
    }

    #[test]
    fn wheel_needs_the_modifier() {
        let mut app = app(400, 400);
        assert!(!app.wheel(-100.0, pos2(50.0, 50.0)));
        assert_eq!(app.viewport().zoom(), 1.0);
        app.set_modifiers(Modifiers { ctrl: true, ..Default::default() });
        assert!(app.wheel(-100.0, pos2(50.0, 50.0)));
        assert!((app.viewport().zoom() - 1.1).abs() < 1e-5);
    }

    #[test]
    fn pan_moves_the_mapping() {
        let mut app = app(100, 100);
        app.pan_by(vec2(10.0, 20.0));
        assert_eq!(app.viewport().to_buffer(pos2(10.0, 20.0)), pos2(0.0, 0.0));
    }

    #[test]
    fn presses_outside_the_buffer_do_nothing() {
        let mut app = app(50, 50);
        app.select_instrument("Pencil");
        app.pointer_pressed(pos2(80.0, 10.0));
        app.pointer_moved(pos2(40.0, 10.0));
        app.frame(16.0);
        assert_eq!(app.content().generation(), 0);
        app.pointer_released(pos2(40.0, 10.0));
    }

    #[test]
    fn thickness_keys_follow_the_active_instrument() {
        let mut app = app(50, 50);
        assert_eq!(app.increase_thickness(), Some(2));
        assert_eq!(app.decrease_thickness(), Some(1));
        app.select_instrument("Fill");
        assert_eq!(app.increase_thickness(), None);
    }

    #[test]
    fn composite_puts_overlay_on_top() {
        let mut app = app(4, 4);
        {
            let mut s = app.context_mut().overlay.begin_write();
            s.put(1.0, 1.0, Color::rgba(255, 0, 0, 255));
            s.put(2.0, 2.0, Color::rgba(0, 0, 0, 51));
        }
        let img = app.composite();
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [204, 204, 204, 255]);
        assert_eq!(img.get_pixel(3, 3).0, [255, 255, 255, 255]);
    }

    #[test]
    fn frame_clears_the_overlay() {
        let mut app = app(8, 8);
        app.context_mut().overlay.begin_write().put(3.0, 3.0, Color::BLACK);
        app.frame(16.0);
        assert_eq!(app.overlay().get(3.0, 3.0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn scrolled_press_paints_where_it_was_gated() {
        let mut settings = EditorSettings::default();
        settings.width = 100;
        settings.height = 100;
        settings.pencil_color = Color::BLACK;
        let mut app = EditorApp::new(settings).unwrap();
        app.select_instrument("Pencil");
        app.viewport_mut().set_scroll(vec2(-20.0, 0.0));

        app.pointer_moved(pos2(110.0, 50.0));
        app.frame(16.0);
        app.pointer_pressed(pos2(110.0, 50.0));
        assert!(app.context().mouse_in_canvas());
        app.frame(16.0);
        app.pointer_released(pos2(110.0, 50.0));
        assert_eq!(app.content().generation(), 1);
        assert_eq!(app.content().get(90.0, 50.0), Some(Color::BLACK));

        // Left of the scrolled layer: gated out, nothing painted.
        app.pointer_moved(pos2(10.0, 50.0));
        app.frame(16.0);
        app.pointer_pressed(pos2(10.0, 50.0));
        app.frame(16.0);
        app.pointer_released(pos2(10.0, 50.0));
        assert_eq!(app.content().generation(), 1);
    }
}
