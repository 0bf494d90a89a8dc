use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::save_io::{read_json_if_exists, write_json_atomic, SaveIoError};

pub const SETTINGS_FILE_NAME: &str = "settings.json";
const VOLUME_STEPS: u8 = 10;

/// Player-facing settings persisted next to the save file.
///
/// Volumes are stored as steps in `0..=10`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub screen_width: u32,
    pub screen_height: u32,
    pub fullscreen: bool,
    pub music_volume: u8,
    pub sound_volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            fullscreen: true,
            music_volume: 5,
            sound_volume: 5,
        }
    }
}

impl Settings {
    pub fn path_in(save_dir: &Path) -> PathBuf {
        save_dir.join(SETTINGS_FILE_NAME)
    }

    /// Loads settings, falling back to defaults on a missing or unreadable file.
    pub fn load_or_default(save_dir: &Path) -> Self {
        let path = Self::path_in(save_dir);
        match read_json_if_exists::<Settings>(&path) {
            Ok(Some(settings)) => {
                info!(path = %path.display(), "settings_loaded");
                settings.normalized()
            }
            Ok(None) => Self::default(),
            Err(error) => {
                warn!(error = %error, "settings_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, save_dir: &Path) -> Result<(), SaveIoError> {
        write_json_atomic(&Self::path_in(save_dir), &self.clone().normalized())
    }

    pub fn music_level(&self) -> f32 {
        volume_level(self.music_volume)
    }

    pub fn sound_level(&self) -> f32 {
        volume_level(self.sound_volume)
    }

    fn normalized(mut self) -> Self {
        self.music_volume = self.music_volume.min(VOLUME_STEPS);
        self.sound_volume = self.sound_volume.min(VOLUME_STEPS);
        self.screen_width = self.screen_width.max(1);
        self.screen_height = self.screen_height.max(1);
        self
    }
}

fn volume_level(steps: u8) -> f32 {
    steps.min(VOLUME_STEPS) as f32 / VOLUME_STEPS as f32
}
