use egui::Vec2;

use crate::app::EditorContext;
use crate::components::colors::Color;
use crate::components::selection::FloatingSelection;
use crate::ops::dashed::{DashPatternError, DashedLine, DashedLinePattern};
use crate::ops::fill::{FillReport, flood_fill};
use crate::ops::shapes::{stamp_square, step_line, stroke_round};
use crate::settings::EditorSettings;
use crate::log_info;

// ============================================================================
// THICKNESS
// ============================================================================

/// Brush thickness with its allowed range and keyboard step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thickness {
    min: u32,
    max: u32,
    step: u32,
    current: u32,
}

impl Thickness {
    /// Starts at `min`.
    pub fn new(min: u32, max: u32, step: u32) -> Self {
        Self { min, max: max.max(min), step, current: min }
    }

    /// `(min, max, step)`
    pub fn range(&self) -> (u32, u32, u32) {
        (self.min, self.max, self.step)
    }

    pub fn get(&self) -> u32 {
        self.current
    }

    /// Set the thickness, clamped into `[min, max]`. Returns the new value.
    pub fn set(&mut self, value: u32) -> u32 {
        self.current = value.clamp(self.min, self.max);
        self.current
    }

    pub fn increase(&mut self) -> u32 {
        self.set(self.current.saturating_add(self.step))
    }

    pub fn decrease(&mut self) -> u32 {
        self.set(self.current.saturating_sub(self.step))
    }

    /// Serialize as "min,max,step"
    pub fn to_config_string(&self) -> String {
        format!("{},{},{}", self.min, self.max, self.step)
    }

    /// Parse "min,max,step" (step optional, defaults to 1)
    pub fn from_config_string(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return None;
        }
        let min = parts[0].trim().parse::<u32>().ok()?;
        let max = parts[1].trim().parse::<u32>().ok()?;
        let step = match parts.get(2) {
            Some(step) => step.trim().parse::<u32>().ok()?,
            None => 1,
        };
        (max >= min).then(|| Self::new(min, max, step))
    }
}

// ============================================================================
// INSTRUMENTS
// ============================================================================

/// Square stamps along the pointer path.
#[derive(Clone, Debug)]
pub struct Pencil {
    pub color: Color,
    pub thickness: Thickness,
}

/// Round-capped translucent strokes, one segment per frame.
#[derive(Clone, Debug)]
pub struct Marker {
    pub color: Color,
    pub thickness: Thickness,
}

/// State for the flood-fill instrument
#[derive(Clone, Debug)]
pub struct FillTool {
    pub color: Color,
    /// Per-channel tolerance, 0.0 = exact.
    pub deviation: f32,
    /// Result of the most recent fill.
    pub last_report: Option<FillReport>,
}

#[derive(Clone, Debug)]
pub enum Instrument {
    Pencil(Pencil),
    /// A pencil painting with the background color.
    Eraser(Pencil),
    Marker(Marker),
    Fill(FillTool),
    Select(FloatingSelection),
}

impl Instrument {
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Pencil(_) => "Pencil",
            Instrument::Eraser(_) => "Eraser",
            Instrument::Marker(_) => "Marker",
            Instrument::Fill(_) => "Fill",
            Instrument::Select(_) => "Select",
        }
    }

    pub fn thickness(&self) -> Option<&Thickness> {
        match self {
            Instrument::Pencil(p) | Instrument::Eraser(p) => Some(&p.thickness),
            Instrument::Marker(m) => Some(&m.thickness),
            Instrument::Fill(_) | Instrument::Select(_) => None,
        }
    }

    pub fn thickness_mut(&mut self) -> Option<&mut Thickness> {
        match self {
            Instrument::Pencil(p) | Instrument::Eraser(p) => Some(&mut p.thickness),
            Instrument::Marker(m) => Some(&mut m.thickness),
            Instrument::Fill(_) | Instrument::Select(_) => None,
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            Instrument::Pencil(p) | Instrument::Eraser(p) => Some(p.color),
            Instrument::Marker(m) => Some(m.color),
            Instrument::Fill(f) => Some(f.color),
            Instrument::Select(_) => None,
        }
    }

    pub fn selection(&self) -> Option<&FloatingSelection> {
        match self {
            Instrument::Select(sel) => Some(sel),
            _ => None,
        }
    }

    pub fn on_press(&mut self, ctx: &mut EditorContext) {
        if let Instrument::Select(sel) = self {
            let (mouse, constrained, zoom) = (ctx.mouse(), ctx.mouse_constrained(), ctx.viewport.zoom());
            sel.on_press(&mut ctx.content, mouse, constrained, zoom);
        }
    }

    /// `delta` is the pointer movement in buffer units.
    pub fn on_drag(&mut self, ctx: &mut EditorContext, delta: Vec2) {
        if let Instrument::Select(sel) = self {
            sel.on_drag(ctx.mouse_constrained(), delta, ctx.modifiers.shift);
        }
    }

    pub fn on_release(&mut self, ctx: &mut EditorContext) {
        if let Instrument::Select(sel) = self {
            let constrained = ctx.mouse_constrained();
            sel.on_release(&mut ctx.content, constrained, ctx.background);
        }
    }

    /// Runs every frame regardless of the pointer state.
    pub fn on_frame_tick(&mut self, ctx: &mut EditorContext, elapsed_ms: f32) {
        if let Instrument::Select(sel) = self {
            sel.draw_each_frame(&mut ctx.overlay, elapsed_ms);
        }
    }

    /// Runs every frame while the pointer is held over the buffer.
    pub fn apply(&mut self, ctx: &mut EditorContext) {
        let (from, to) = (ctx.pmouse(), ctx.mouse());
        match self {
            Instrument::Pencil(p) | Instrument::Eraser(p) => {
                let mut session = ctx.content.begin_write();
                let (t, color) = (p.thickness.get(), p.color);
                step_line(from, to, |at| stamp_square(&mut session, at, t, color));
            }
            Instrument::Marker(m) => {
                stroke_round(&mut ctx.content.begin_write(), from, to, m.thickness.get() as f32, m.color);
            }
            Instrument::Fill(f) => {
                f.last_report = Some(flood_fill(&mut ctx.content, to.x, to.y, f.color, f.deviation));
            }
            Instrument::Select(sel) => {
                let constrained = ctx.mouse_constrained();
                sel.apply(&mut ctx.overlay, constrained);
            }
        }
    }
}

// ============================================================================
// TOOLBOX
// ============================================================================

/// Every instrument, created once, plus which one is active.
#[derive(Clone, Debug)]
pub struct Toolbox {
    instruments: Vec<Instrument>,
    active: usize,
}

impl Toolbox {
    /// Marker is active initially.
    pub fn from_settings(settings: &EditorSettings) -> Result<Self, DashPatternError> {
        let marquee = DashedLine::new(DashedLinePattern::standard(), settings.marquee_weight, 0.0)?;
        let instruments = vec![
            Instrument::Marker(Marker {
                color: settings.marker_color,
                thickness: settings.marker_thickness,
            }),
            Instrument::Fill(FillTool {
                color: settings.fill_color,
                deviation: settings.fill_deviation,
                last_report: None,
            }),
            Instrument::Pencil(Pencil {
                color: settings.pencil_color,
                thickness: settings.pencil_thickness,
            }),
            Instrument::Eraser(Pencil {
                color: settings.background,
                thickness: settings.eraser_thickness,
            }),
            Instrument::Select(FloatingSelection::new(
                marquee,
                settings.hit_radius,
                settings.marquee_frame_divisor,
            )),
        ];
        Ok(Self { instruments, active: 0 })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.instruments.iter().map(Instrument::name)
    }

    pub fn active(&self) -> &Instrument {
        &self.instruments[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Instrument {
        &mut self.instruments[self.active]
    }

    pub fn get(&self, name: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Instrument> {
        self.instruments.iter_mut().find(|i| i.name() == name)
    }

    /// Switch instruments by name. Leaving Select bakes its floating image.
    /// Unknown names leave the active instrument unchanged.
    pub fn select(&mut self, name: &str, ctx: &mut EditorContext) -> bool {
        let Some(index) = self.instruments.iter().position(|i| i.name() == name) else {
            log_info!("instrument {:?} not found, keeping {}", name, self.active().name());
            return false;
        };
        if index == self.active {
            return true;
        }
        if let Instrument::Select(sel) = self.active_mut() {
            sel.commit(&mut ctx.content);
        }
        log_info!("instrument: {} -> {}", self.active().name(), name);
        self.active = index;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn setup(pencil_color: Color) -> (EditorContext, Toolbox) {
        let mut settings = EditorSettings::default();
        settings.width = 20;
        settings.height = 20;
        settings.pencil_color = pencil_color;
        let ctx = EditorContext::new(&settings);
        let tools = Toolbox::from_settings(&settings).unwrap();
        (ctx, tools)
    }

    #[test]
    fn thickness_clamps_and_steps() {
        let mut t = Thickness::new(1, 5, 2);
        assert_eq!(t.get(), 1);
        assert_eq!(t.increase(), 3);
        assert_eq!(t.increase(), 5);
        assert_eq!(t.increase(), 5);
        assert_eq!(t.set(0), 1);
        assert_eq!(t.decrease(), 1);
        assert_eq!(t.set(4), 4);
        assert_eq!(Thickness::from_config_string("2,8"), Some(Thickness::new(2, 8, 1)));
        assert_eq!(Thickness::from_config_string("9,3,1"), None);
        assert_eq!(Thickness::new(3, 1, 1).range(), (3, 3, 1));
    }

    #[test]
    fn default_instruments() {
        let (_, tools) = setup(Color::rgba(0, 0, 0, 10));
        assert_eq!(tools.active().name(), "Marker");
        assert_eq!(
            tools.names().collect::<Vec<_>>(),
            vec!["Marker", "Fill", "Pencil", "Eraser", "Select"]
        );
        assert_eq!(tools.get("Eraser").and_then(Instrument::color), Some(Color::WHITE));
        assert_eq!(tools.get("Pencil").and_then(Instrument::thickness).map(Thickness::get), Some(1));
        assert!(tools.get("Fill").and_then(Instrument::thickness).is_none());
    }

    #[test]
    fn pencil_stamps_along_the_path() {
        let (mut ctx, mut tools) = setup(Color::BLACK);
        assert!(tools.select("Pencil", &mut ctx));
        ctx.pointer.previous = pos2(2.0, 2.0);
        ctx.pointer.screen = pos2(6.0, 2.0);
        tools.active_mut().apply(&mut ctx);
        for x in 2..=6 {
            assert_eq!(ctx.content.get(x as f32, 2.0), Some(Color::BLACK));
        }
        assert_eq!(ctx.content.get(7.0, 2.0), Some(Color::WHITE));
        assert_eq!(ctx.content.generation(), 1);
    }

    #[test]
    fn eraser_paints_background() {
        let (mut ctx, mut tools) = setup(Color::BLACK);
        ctx.content.begin_write().clear(Color::BLACK);
        tools.select("Eraser", &mut ctx);
        ctx.pointer.previous = pos2(5.0, 5.0);
        ctx.pointer.screen = pos2(5.0, 5.0);
        tools.active_mut().apply(&mut ctx);
        assert_eq!(ctx.content.get(5.0, 5.0), Some(Color::WHITE));
        assert_eq!(ctx.content.get(9.0, 9.0), Some(Color::BLACK));
    }

    #[test]
    fn marker_blends_translucent_segments() {
        let (mut ctx, mut tools) = setup(Color::BLACK);
        if let Some(Instrument::Marker(m)) = tools.get_mut("Marker") {
            m.color = Color::rgba(0, 0, 0, 51);
        }
        ctx.pointer.previous = pos2(2.5, 10.5);
        ctx.pointer.screen = pos2(12.5, 10.5);
        tools.active_mut().apply(&mut ctx);
        assert_eq!(ctx.content.get(7.0, 10.0), Some(Color::rgb(204, 204, 204)));
        assert_eq!(ctx.content.get(7.0, 12.0), Some(Color::WHITE));
    }

    #[test]
    fn fill_records_its_report() {
        let (mut ctx, mut tools) = setup(Color::BLACK);
        tools.select("Fill", &mut ctx);
        ctx.pointer.screen = pos2(3.0, 3.0);
        ctx.pointer.previous = ctx.pointer.screen;
        tools.active_mut().apply(&mut ctx);
        assert_eq!(ctx.content.get(19.0, 19.0), Some(Color::BLACK));
        let Instrument::Fill(fill) = tools.active() else { panic!("fill not active") };
        assert_eq!(fill.last_report.map(|r| r.samples_written), Some(400));
    }

    #[test]
    fn unknown_name_keeps_active() {
        let (mut ctx, mut tools) = setup(Color::BLACK);
        assert!(!tools.select("Lasso", &mut ctx));
        assert_eq!(tools.active().name(), "Marker");
    }

    #[test]
    fn leaving_select_bakes_the_selection() {
        let (mut ctx, mut tools) = setup(Color::BLACK);
        ctx.content.begin_write().set(4.0, 4.0, Color::BLACK, true, true);
        tools.select("Select", &mut ctx);

        ctx.pointer.screen = pos2(2.0, 2.0);
        tools.active_mut().on_press(&mut ctx);
        ctx.pointer.screen = pos2(8.0, 8.0);
        tools.active_mut().on_drag(&mut ctx, egui::vec2(6.0, 6.0));
        tools.active_mut().on_release(&mut ctx);
        assert_eq!(ctx.content.get(4.0, 4.0), Some(Color::WHITE));
        assert!(tools.active().selection().is_some_and(FloatingSelection::selected));

        tools.select("Pencil", &mut ctx);
        assert_eq!(ctx.content.get(4.0, 4.0), Some(Color::BLACK));
        assert!(tools.get("Select").and_then(Instrument::selection).is_some_and(|s| !s.selected()));
    }
}
