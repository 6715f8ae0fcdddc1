//! Raster editing core: a density-aware pixel buffer, zoom/pan viewport,
//! scanline flood fill, floating selections with an animated marquee, and
//! the instruments that drive them from pointer input.

#![allow(clippy::too_many_arguments)]

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod ops;
pub mod settings;
pub mod viewport;

pub use app::{EditorApp, EditorContext, Modifiers};
pub use canvas::{PixelBuffer, WriteSession};
pub use components::colors::Color;
pub use settings::EditorSettings;
pub use viewport::Viewport;
