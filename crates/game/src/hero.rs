use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use castle_engine::{write_json_atomic, SaveIoError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

pub const PROGRESS_FILE_NAME: &str = "progress.json";

const DEFAULT_STAT: u32 = 100;

/// Persisted hero block of `progress.json`.
///
/// Missing keys fall back to defaults; keys this build does not know about are
/// kept so a rewrite does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroStats {
    #[serde(rename = "HP")]
    pub hp: u32,
    #[serde(rename = "Mana")]
    pub mana: u32,
    #[serde(rename = "Stamina")]
    pub stamina: u32,
    pub race: String,
    pub gender: String,
    pub appearance: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for HeroStats {
    fn default() -> Self {
        Self {
            hp: DEFAULT_STAT,
            mana: DEFAULT_STAT,
            stamina: DEFAULT_STAT,
            race: "human".to_string(),
            gender: "man".to_string(),
            appearance: "black".to_string(),
            extra: Map::new(),
        }
    }
}

impl HeroStats {
    pub fn with_stats(hp: u32, mana: u32, stamina: u32) -> Self {
        Self {
            hp,
            mana,
            stamina,
            ..Self::default()
        }
    }

    /// Asset key prefix for this hero's sprites, e.g. `characters/human/man/black`.
    pub fn sprite_root(&self) -> String {
        format!(
            "characters/{}/{}/{}",
            key_segment(&self.race, "human"),
            key_segment(&self.gender, "man"),
            key_segment(&self.appearance, "black")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<HeroStats>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn progress_path(save_dir: &Path) -> PathBuf {
    save_dir.join(PROGRESS_FILE_NAME)
}

/// Reads `progress.json`; `Ok(None)` when no save exists yet.
pub fn read_progress(save_dir: &Path) -> Result<Option<Progress>, SaveIoError> {
    let path = progress_path(save_dir);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(SaveIoError::Read { path, source }),
    };

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize::<_, Progress>(&mut deserializer) {
        Ok(progress) => Ok(Some(progress)),
        Err(error) => {
            let at = error.path().to_string();
            let source = error.into_inner();
            Err(SaveIoError::Parse {
                path,
                at: if at.is_empty() { ".".to_string() } else { at },
                message: source.to_string(),
            })
        }
    }
}

/// Hero stats from the save, or defaults when there is no usable save.
pub fn load_hero_stats(save_dir: &Path) -> HeroStats {
    match read_progress(save_dir) {
        Ok(Some(progress)) => progress.hero.unwrap_or_default(),
        Ok(None) => HeroStats::default(),
        Err(error) => {
            warn!(error = %error, "hero_stats_load_failed_using_defaults");
            HeroStats::default()
        }
    }
}

/// Records `scene` as the last visited scene, keeping everything else in the save.
pub fn save_progress(save_dir: &Path, scene: &str) -> Result<(), SaveIoError> {
    let mut progress = existing_or_fresh(save_dir);
    progress.last_scene = Some(scene.to_string());
    write_json_atomic(&progress_path(save_dir), &progress)?;
    info!(scene, "progress_saved");
    Ok(())
}

pub fn save_hero(save_dir: &Path, hero: &HeroStats) -> Result<(), SaveIoError> {
    let mut progress = existing_or_fresh(save_dir);
    progress.hero = Some(hero.clone());
    write_json_atomic(&progress_path(save_dir), &progress)
}

fn existing_or_fresh(save_dir: &Path) -> Progress {
    match read_progress(save_dir) {
        Ok(progress) => progress.unwrap_or_default(),
        Err(error) => {
            warn!(error = %error, "progress_unreadable_starting_fresh");
            Progress::default()
        }
    }
}

fn key_segment<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        trimmed
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_save_yields_default_stats() {
        let temp = tempfile::tempdir().expect("tempdir");
        let hero = load_hero_stats(temp.path());
        assert_eq!(hero, HeroStats::default());
        assert_eq!((hero.hp, hero.mana, hero.stamina), (100, 100, 100));
    }

    #[test]
    fn hero_round_trips_through_progress_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        save_hero(temp.path(), &HeroStats::with_stats(120, 60, 70)).expect("save hero");

        let hero = load_hero_stats(temp.path());
        assert_eq!((hero.hp, hero.mana, hero.stamina), (120, 60, 70));
    }

    #[test]
    fn missing_hero_keys_default_individually() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            progress_path(temp.path()),
            r#"{ "last_scene": "scene_1", "hero": { "HP": 80 } }"#,
        )
        .expect("write save");

        let hero = load_hero_stats(temp.path());
        assert_eq!((hero.hp, hero.mana, hero.stamina), (80, 100, 100));
        assert_eq!(hero.sprite_root(), "characters/human/man/black");
    }

    #[test]
    fn save_progress_keeps_hero_block_and_unknown_keys() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            progress_path(temp.path()),
            r#"{ "last_scene": "menu", "slot": 2, "hero": { "HP": 90, "title": "ranger" } }"#,
        )
        .expect("write save");

        save_progress(temp.path(), "level_1").expect("save progress");

        let progress = read_progress(temp.path())
            .expect("read progress")
            .expect("progress exists");
        assert_eq!(progress.last_scene.as_deref(), Some("level_1"));
        assert_eq!(progress.extra.get("slot"), Some(&Value::from(2)));
        let hero = progress.hero.expect("hero kept");
        assert_eq!(hero.hp, 90);
        assert_eq!(hero.extra.get("title"), Some(&Value::from("ranger")));
    }

    #[test]
    fn malformed_hero_falls_back_to_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            progress_path(temp.path()),
            r#"{ "hero": { "HP": "lots" } }"#,
        )
        .expect("write save");

        let error = read_progress(temp.path()).expect_err("bad hp");
        match error {
            SaveIoError::Parse { message, .. } => assert!(message.contains("invalid type")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(load_hero_stats(temp.path()), HeroStats::default());
    }

    #[test]
    fn unsafe_sprite_segments_fall_back() {
        let mut hero = HeroStats::default();
        hero.race = "../elf".to_string();
        hero.appearance = "white".to_string();
        assert_eq!(hero.sprite_root(), "characters/human/man/white");
    }
}
