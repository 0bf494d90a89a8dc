use castle_engine::{Canvas, InputSnapshot, Scene, SceneCommand, SceneKey, SceneServices, Viewport};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::hero::{load_hero_stats, save_progress};

use super::assets::{crow_frames, player_frames, spider_frames, Level1Assets, MUSIC_KEY};
use super::player::PlayerInput;
use super::render::render_level1;
use super::simulation::{Level1Setup, Level1Simulation};
use super::tuning::Level1Tuning;

pub const LEVEL1_SCENE_NAME: &str = "level_1";

/// Preparation steps run by [`Level1Scene::load`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Layers,
    Crows,
    Spiders,
    Player,
}

impl LoadStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Layers => "layers",
            Self::Crows => "crows",
            Self::Spiders => "spiders",
            Self::Player => "player",
        }
    }

    /// Share of the level prepared once this stage has finished.
    pub fn progress(self) -> f32 {
        match self {
            Self::Layers => 0.6,
            Self::Crows => 0.7,
            Self::Spiders => 0.9,
            Self::Player => 1.0,
        }
    }
}

pub const LOAD_STAGES: [LoadStage; 4] = [
    LoadStage::Layers,
    LoadStage::Crows,
    LoadStage::Spiders,
    LoadStage::Player,
];

fn log_stage(stage: LoadStage) {
    info!(
        scene = LEVEL1_SCENE_NAME,
        stage = stage.name(),
        progress = stage.progress(),
        "level_loading"
    );
}

struct LoadedLevel {
    sim: Level1Simulation,
    assets: Level1Assets,
}

/// The playable forest level. Everything is built on `load` and dropped on `unload`;
/// an overlay only pauses it.
pub struct Level1Scene {
    tuning: Level1Tuning,
    seed: Option<u64>,
    level: Option<LoadedLevel>,
}

impl Default for Level1Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Level1Scene {
    pub fn new() -> Self {
        Self {
            tuning: Level1Tuning::default(),
            seed: None,
            level: None,
        }
    }

    /// Deterministic creature behavior for tests and replays.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tuning(mut self, tuning: Level1Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.level.is_some()
    }

    pub fn simulation(&self) -> Option<&Level1Simulation> {
        self.level.as_ref().map(|level| &level.sim)
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }

    fn build_level(&self, services: &mut SceneServices, viewport: Viewport) -> LoadedLevel {
        let hero = load_hero_stats(&services.save_dir);

        log_stage(LoadStage::Layers);
        let assets = Level1Assets::load(&mut services.frames, viewport);
        let player =
            player_frames(&mut services.frames, &hero, viewport, &self.tuning.player);

        log_stage(LoadStage::Crows);
        let setup = Level1Setup {
            viewport,
            tuning: self.tuning,
            hero,
            layer_widths: assets.layer_widths(viewport),
            player_frames: player,
            crow_frames: crow_frames(&mut services.frames, viewport),
        };
        let mut sim = Level1Simulation::new(setup, self.rng());

        log_stage(LoadStage::Spiders);
        let frames = &mut services.frames;
        sim.spawn_initial_spiders(|scale| spider_frames(frames, viewport, scale));

        log_stage(LoadStage::Player);
        sim.reset_player();
        LoadedLevel { sim, assets }
    }
}

impl Scene for Level1Scene {
    fn load(&mut self, services: &mut SceneServices) {
        if let Err(error) = save_progress(&services.save_dir, LEVEL1_SCENE_NAME) {
            warn!(scene = LEVEL1_SCENE_NAME, error = %error, "progress_save_failed");
        }
        let viewport = services.logical_size;
        let level = self.build_level(services, viewport);

        services.audio.stop_music();
        services.audio.play_music(MUSIC_KEY);
        info!(
            scene = LEVEL1_SCENE_NAME,
            spiders = level.sim.spiders().len(),
            sys = %level.sim.system_order_text(),
            "scene_loaded"
        );
        self.level = Some(level);
    }

    fn update(
        &mut self,
        dt_ms: f64,
        input: &InputSnapshot,
        services: &mut SceneServices,
    ) -> SceneCommand {
        let Some(level) = self.level.as_mut() else {
            return SceneCommand::None;
        };
        if input.pause_pressed() {
            return SceneCommand::SwitchTo(SceneKey::Overlay);
        }
        let player_input = PlayerInput::from_snapshot(input);
        level.sim.tick(dt_ms, &player_input, services.audio.as_mut());
        SceneCommand::None
    }

    fn render(&mut self, canvas: &mut Canvas<'_>) {
        match &self.level {
            Some(level) => render_level1(canvas, &level.sim, &level.assets),
            None => canvas.clear([0, 0, 0, 255]),
        }
    }

    fn pause(&mut self, services: &mut SceneServices) {
        services.audio.pause_music();
        if let Some(level) = self.level.as_mut() {
            level.sim.stop_creature_sounds(services.audio.as_mut());
        }
    }

    fn resume(&mut self, services: &mut SceneServices) {
        services.audio.resume_music();
        if let Some(level) = self.level.as_mut() {
            level.sim.resume_creature_sounds(services.audio.as_mut());
        }
    }

    fn unload(&mut self, services: &mut SceneServices) {
        if let Some(mut level) = self.level.take() {
            level.sim.stop_creature_sounds(services.audio.as_mut());
            info!(
                scene = LEVEL1_SCENE_NAME,
                ticks = level.sim.tick_count(),
                "scene_unload"
            );
        }
        services.audio.stop_music();
    }

    fn debug_title(&self) -> Option<String> {
        let sim = &self.level.as_ref()?.sim;
        let player = sim.player();
        Some(format!(
            "White Castle | Level 1 | World {:.0} | HP {:.0}/{:.0} | Crows {} | Spiders {}",
            sim.hero_world_x(),
            player.hp().current(),
            player.hp().max(),
            sim.crows().len(),
            sim.spiders().len()
        ))
    }
}
