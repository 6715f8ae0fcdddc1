// ============================================================================
// INPUT SESSIONS: recorded editor input, stored with bincode and replayable
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use bincode::Options;
use egui::{pos2, vec2};
use serde::{Deserialize, Serialize};

use crate::app::{EditorApp, Modifiers};
use crate::log_err;

/// Written at the start of every session file.
pub const SESSION_MAGIC: &str = "EASEL_SESSION_V1";

/// Session files larger than this are rejected before reading.
const MAX_SESSION_BYTES: u64 = 64 * 1024 * 1024;

/// Error type for session I/O
#[derive(Debug)]
pub enum SessionError {
    Io(std::io::Error),
    Decode(String),
    InvalidFormat(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "I/O error: {}", e),
            SessionError::Decode(e) => write!(f, "Decode error: {}", e),
            SessionError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SessionError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SessionError::Decode(e.to_string())
    }
}

/// One input delivered by the hosting shell. Positions are screen space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerPressed { x: f32, y: f32 },
    PointerMoved { x: f32, y: f32 },
    PointerReleased { x: f32, y: f32 },
    Wheel { delta: f32, x: f32, y: f32 },
    Pan { dx: f32, dy: f32 },
    Modifiers { ctrl: bool, alt: bool, shift: bool },
    SelectInstrument(String),
    IncreaseThickness,
    DecreaseThickness,
    CommitSelection,
    Frame { elapsed_ms: f32 },
}

/// Summary of a [`Session::replay`] run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayStats {
    pub events: usize,
    /// Content flushes that wrote at least one sample.
    pub flushes: u64,
    pub samples_written: u64,
    pub zoom: f32,
    pub checksum: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    magic: String,
    pub events: Vec<InputEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            magic: SESSION_MAGIC.to_string(),
            events: Vec::new(),
        }
    }
}

impl Session {
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self { events, ..Self::default() }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SessionError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a session. The magic is checked before anything is decoded,
    /// and decoding may never claim more bytes than `raw` holds.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, SessionError> {
        // bincode writes a String as an 8-byte little-endian length, then UTF-8.
        let header_len = 8 + SESSION_MAGIC.len();
        if raw.len() < header_len {
            return Err(SessionError::InvalidFormat("file too small".into()));
        }
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&raw[..8]);
        let magic = &raw[8..header_len];
        if u64::from_le_bytes(len_bytes) != SESSION_MAGIC.len() as u64 || magic != SESSION_MAGIC.as_bytes() {
            return Err(SessionError::InvalidFormat(format!(
                "unexpected header {:?}",
                String::from_utf8_lossy(magic)
            )));
        }
        let session: Session = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(raw.len() as u64)
            .deserialize(raw)?;
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let read = || -> Result<Self, SessionError> {
            let size = std::fs::metadata(path)?.len();
            if size > MAX_SESSION_BYTES {
                return Err(SessionError::InvalidFormat(format!("file is {} bytes", size)));
            }
            Self::from_bytes(&std::fs::read(path)?)
        };
        read().inspect_err(|e| log_err!("session {}: {}", path.display(), e))
    }

    /// Feed every event to `app` in order.
    pub fn replay(&self, app: &mut EditorApp) -> ReplayStats {
        let generation = app.content().generation();
        let written = app.content().total_written();
        for event in &self.events {
            match event {
                InputEvent::PointerPressed { x, y } => app.pointer_pressed(pos2(*x, *y)),
                InputEvent::PointerMoved { x, y } => app.pointer_moved(pos2(*x, *y)),
                InputEvent::PointerReleased { x, y } => app.pointer_released(pos2(*x, *y)),
                InputEvent::Wheel { delta, x, y } => {
                    app.wheel(*delta, pos2(*x, *y));
                }
                InputEvent::Pan { dx, dy } => app.pan_by(vec2(*dx, *dy)),
                InputEvent::Modifiers { ctrl, alt, shift } => app.set_modifiers(Modifiers {
                    ctrl: *ctrl,
                    alt: *alt,
                    shift: *shift,
                }),
                InputEvent::SelectInstrument(name) => {
                    app.select_instrument(name);
                }
                InputEvent::IncreaseThickness => {
                    app.increase_thickness();
                }
                InputEvent::DecreaseThickness => {
                    app.decrease_thickness();
                }
                InputEvent::CommitSelection => {
                    app.commit_selection();
                }
                InputEvent::Frame { elapsed_ms } => app.frame(*elapsed_ms),
            }
        }
        ReplayStats {
            events: self.events.len(),
            flushes: app.content().generation() - generation,
            samples_written: app.content().total_written() - written,
            zoom: app.viewport().zoom(),
            checksum: app.content().checksum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EditorSettings;

    fn fill_session() -> Session {
        Session::new(vec![
            InputEvent::SelectInstrument("Fill".into()),
            InputEvent::PointerPressed { x: 5.0, y: 5.0 },
            InputEvent::Frame { elapsed_ms: 16.0 },
            InputEvent::Frame { elapsed_ms: 16.0 },
            InputEvent::PointerReleased { x: 5.0, y: 5.0 },
        ])
    }

    fn small_app() -> EditorApp {
        let mut settings = EditorSettings::default();
        settings.width = 10;
        settings.height = 10;
        EditorApp::new(settings).unwrap()
    }

    #[test]
    fn bytes_round_trip_and_header_check() {
        let session = fill_session();
        let raw = session.to_bytes().unwrap();
        assert_eq!(Session::from_bytes(&raw).unwrap(), session);

        let mut bad = session.clone();
        bad.magic = "NOT_A_SESSION".into();
        let raw = bincode::serialize(&bad).unwrap();
        assert!(matches!(Session::from_bytes(&raw), Err(SessionError::InvalidFormat(_))));
        assert!(matches!(Session::from_bytes(&[1, 2, 3]), Err(SessionError::InvalidFormat(_))));
    }

    #[test]
    fn corrupt_lengths_are_rejected_without_allocating() {
        // A huge length where the magic should be.
        let mut raw = (1u64 << 36).to_le_bytes().to_vec();
        raw.extend_from_slice(b"EASEL");
        raw.resize(40, 0);
        assert!(matches!(Session::from_bytes(&raw), Err(SessionError::InvalidFormat(_))));

        // Valid header, absurd event count.
        let mut raw = Session::default().to_bytes().unwrap();
        let count_at = raw.len() - 8;
        raw[count_at..].copy_from_slice(&(1u64 << 40).to_le_bytes());
        assert!(matches!(Session::from_bytes(&raw), Err(SessionError::Decode(_))));

        // Valid header, instrument name claiming 2^36 bytes.
        let mut raw = Session::new(vec![InputEvent::SelectInstrument("Fill".into())])
            .to_bytes()
            .unwrap();
        let name_len_at = raw.len() - 4 - 8;
        raw[name_len_at..name_len_at + 8].copy_from_slice(&(1u64 << 36).to_le_bytes());
        assert!(matches!(Session::from_bytes(&raw), Err(SessionError::Decode(_))));

        // Truncated mid-event.
        let raw = fill_session().to_bytes().unwrap();
        assert!(matches!(Session::from_bytes(&raw[..raw.len() - 3]), Err(SessionError::Decode(_))));
    }

    #[test]
    fn load_rejects_a_corrupt_file() {
        let path = std::env::temp_dir().join(format!("easel-corrupt-{}.bin", std::process::id()));
        let mut raw = (1u64 << 36).to_le_bytes().to_vec();
        raw.extend_from_slice(b"EASEL");
        std::fs::write(&path, &raw).unwrap();
        assert!(Session::load(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn replay_fills_once() {
        let mut app = small_app();
        let stats = fill_session().replay(&mut app);
        assert_eq!(stats.events, 5);
        // The second frame's fill finds the region already black.
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.samples_written, 100);
        assert_eq!(stats.zoom, 1.0);
        assert_eq!(stats.checksum, app.content().checksum());
    }

    #[test]
    fn load_reports_missing_files() {
        crate::logger::capture_start();
        let missing = std::env::temp_dir().join("easel-no-such-session.bin");
        assert!(matches!(Session::load(&missing), Err(SessionError::Io(_))));
        let lines = crate::logger::capture_take();
        assert!(lines.iter().any(|l| l.contains("[ERROR]")));
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("easel-session-{}.bin", std::process::id()));
        let session = fill_session();
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), session);
        let _ = std::fs::remove_file(&path);
    }
}
