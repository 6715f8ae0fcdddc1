//! Editor settings persisted as a plain `key=value` file.
//!
//! Colors are written `r,g,b,a`, thickness ranges `min,max,step`. Unknown
//! keys and unparsable values are logged and skipped so an old or hand-edited
//! file never prevents the editor from starting.

use std::path::{Path, PathBuf};

use crate::components::colors::Color;
use crate::components::tools::Thickness;
use crate::log_warn;

/// Error type for settings I/O and validation
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    /// A value that parses but cannot drive an editor.
    Invalid(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "settings I/O error: {}", e),
            SettingsError::Invalid(msg) => write!(f, "invalid settings: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

/// Key that must be held for the wheel to zoom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ZoomModifier {
    #[default]
    Ctrl,
    Alt,
    Shift,
    /// Wheel always zooms.
    None,
}

impl ZoomModifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomModifier::Ctrl => "ctrl",
            ZoomModifier::Alt => "alt",
            ZoomModifier::Shift => "shift",
            ZoomModifier::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(ZoomModifier::Ctrl),
            "alt" => Some(ZoomModifier::Alt),
            "shift" => Some(ZoomModifier::Shift),
            "none" => Some(ZoomModifier::None),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Logical buffer size.
    pub width: u32,
    pub height: u32,
    /// Device samples per logical pixel along each axis.
    pub density: u32,
    pub background: Color,
    pub wheel_sensitivity: f32,
    pub zoom_min: f32,
    pub zoom_modifier: ZoomModifier,
    /// Selection handle tolerance in screen pixels.
    pub hit_radius: f32,
    pub marquee_weight: f32,
    /// Milliseconds per unit of marquee phase.
    pub marquee_frame_divisor: f32,
    pub fill_deviation: f32,
    pub fill_color: Color,
    pub pencil_color: Color,
    pub pencil_thickness: Thickness,
    pub marker_color: Color,
    pub marker_thickness: Thickness,
    pub eraser_thickness: Thickness,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            density: 1,
            background: Color::WHITE,
            wheel_sensitivity: 0.001,
            zoom_min: 0.1,
            zoom_modifier: ZoomModifier::Ctrl,
            hit_radius: 20.0,
            marquee_weight: 1.0,
            marquee_frame_divisor: 40.0,
            fill_deviation: 0.3,
            fill_color: Color::BLACK,
            pencil_color: Color::rgba(0, 0, 0, 10),
            pencil_thickness: Thickness::new(1, 5, 1),
            marker_color: Color::rgba(0, 0, 0, 10),
            marker_thickness: Thickness::new(1, 5, 1),
            eraser_thickness: Thickness::new(1, 20, 1),
        }
    }
}

impl EditorSettings {
    /// Per-user settings file.
    /// On Linux:   ~/.config/easel/easel_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\Easel\easel_settings.cfg
    /// On macOS:   ~/Library/Application Support/Easel/easel_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("Easel").join("easel_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Easel")
                    .join("easel_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = match std::env::var("XDG_CONFIG_HOME") {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
            };
            Some(config_dir.join("easel").join("easel_settings.cfg"))
        }
    }

    /// Parse settings text on top of the defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                log_warn!("settings line {}: expected key=value, got {:?}", n + 1, line);
                continue;
            };
            let (key, val) = (key.trim(), val.trim());
            let ok = match key {
                "width" => set(&mut s.width, val.parse().ok()),
                "height" => set(&mut s.height, val.parse().ok()),
                "density" => set(&mut s.density, val.parse().ok()),
                "background" => set(&mut s.background, Color::from_config_string(val)),
                "wheel_sensitivity" => set(&mut s.wheel_sensitivity, val.parse().ok()),
                "zoom_min" => set(&mut s.zoom_min, val.parse().ok()),
                "zoom_modifier" => set(&mut s.zoom_modifier, ZoomModifier::parse(val)),
                "hit_radius" => set(&mut s.hit_radius, val.parse().ok()),
                "marquee_weight" => set(&mut s.marquee_weight, val.parse().ok()),
                "marquee_frame_divisor" => set(&mut s.marquee_frame_divisor, val.parse().ok()),
                "fill_deviation" => set(&mut s.fill_deviation, val.parse().ok()),
                "fill_color" => set(&mut s.fill_color, Color::from_config_string(val)),
                "pencil_color" => set(&mut s.pencil_color, Color::from_config_string(val)),
                "pencil_thickness" => set(&mut s.pencil_thickness, Thickness::from_config_string(val)),
                "marker_color" => set(&mut s.marker_color, Color::from_config_string(val)),
                "marker_thickness" => set(&mut s.marker_thickness, Thickness::from_config_string(val)),
                "eraser_thickness" => set(&mut s.eraser_thickness, Thickness::from_config_string(val)),
                _ => {
                    log_warn!("settings: unknown key {:?} ignored", key);
                    continue;
                }
            };
            if !ok {
                log_warn!("settings: bad value {:?} for {}, keeping default", val, key);
            }
        }
        s
    }

    /// Canonical text form; `parse(to_config_string())` yields `self`.
    pub fn to_config_string(&self) -> String {
        format!(
            "width={}\n\
             height={}\n\
             density={}\n\
             background={}\n\
             wheel_sensitivity={}\n\
             zoom_min={}\n\
             zoom_modifier={}\n\
             hit_radius={}\n\
             marquee_weight={}\n\
             marquee_frame_divisor={}\n\
             fill_deviation={}\n\
             fill_color={}\n\
             pencil_color={}\n\
             pencil_thickness={}\n\
             marker_color={}\n\
             marker_thickness={}\n\
             eraser_thickness={}\n",
            self.width,
            self.height,
            self.density,
            self.background.to_config_string(),
            self.wheel_sensitivity,
            self.zoom_min,
            self.zoom_modifier.as_str(),
            self.hit_radius,
            self.marquee_weight,
            self.marquee_frame_divisor,
            self.fill_deviation,
            self.fill_color.to_config_string(),
            self.pencil_color.to_config_string(),
            self.pencil_thickness.to_config_string(),
            self.marker_color.to_config_string(),
            self.marker_thickness.to_config_string(),
            self.eraser_thickness.to_config_string(),
        )
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::Invalid(format!(
                "buffer size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.density == 0 {
            return Err(SettingsError::Invalid("density must be at least 1".into()));
        }
        if !(self.wheel_sensitivity > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "wheel_sensitivity must be positive, got {}",
                self.wheel_sensitivity
            )));
        }
        if !(self.zoom_min > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "zoom_min must be positive, got {}",
                self.zoom_min
            )));
        }
        if !(self.marquee_frame_divisor > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "marquee_frame_divisor must be positive, got {}",
                self.marquee_frame_divisor
            )));
        }
        Ok(())
    }

    /// Read and validate a settings file.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let s = Self::parse(&content);
        s.validate()?;
        Ok(s)
    }

    /// Load the per-user settings (defaults if missing or invalid).
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(s) => s,
            Err(e) => {
                log_warn!("settings: {} ({}), using defaults", e, path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())?;
        Ok(())
    }

    /// Save to the per-user settings file.
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path()
            .ok_or_else(|| SettingsError::Invalid("no settings directory available".into()))?;
        self.save_to(&path)
    }
}

/// Assign `value` when present; report whether it was.
fn set<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}
