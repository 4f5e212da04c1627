//! Pen kinds and per-pen settings.

use super::StrokeColor;
use serde::{Deserialize, Serialize};

/// Pen used to draw a stroke. Persisted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PenKind {
    #[default]
    Ballpoint,
    Marker,
    Fountain,
}

impl PenKind {
    pub const ALL: [PenKind; 3] = [PenKind::Ballpoint, PenKind::Marker, PenKind::Fountain];

    pub fn name(self) -> &'static str {
        match self {
            PenKind::Ballpoint => "BALLPEN",
            PenKind::Marker => "MARKER",
            PenKind::Fountain => "FOUNTAIN",
        }
    }

    /// Look up a pen by name, case-insensitively. Unknown names map to the ballpoint pen.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|pen| pen.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl From<PenKind> for String {
    fn from(pen: PenKind) -> Self {
        pen.name().to_string()
    }
}

impl From<String> for PenKind {
    fn from(name: String) -> Self {
        PenKind::from_name(&name)
    }
}

/// Size and color remembered for one pen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenSetting {
    pub stroke_size: f32,
    pub color: StrokeColor,
}

/// Settings for every pen, indexed by [`PenKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenSettingsTable {
    settings: [PenSetting; 3],
}

impl Default for PenSettingsTable {
    fn default() -> Self {
        Self {
            settings: [
                PenSetting {
                    stroke_size: 5.0,
                    color: StrokeColor::BLACK,
                },
                PenSetting {
                    stroke_size: 40.0,
                    color: StrokeColor::argb(0xFF, 0x80, 0x80, 0x80),
                },
                PenSetting {
                    stroke_size: 5.0,
                    color: StrokeColor::BLACK,
                },
            ],
        }
    }
}

impl PenSettingsTable {
    pub fn get(&self, pen: PenKind) -> PenSetting {
        self.settings[pen.index()]
    }

    pub fn set(&mut self, pen: PenKind, setting: PenSetting) {
        self.settings[pen.index()] = setting;
    }
}
