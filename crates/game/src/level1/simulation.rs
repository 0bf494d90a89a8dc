use castle_engine::{AudioSink, Viewport};
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::hero::HeroStats;

use super::context::TickContext;
use super::crow::{CrowFlock, CrowFrames, CrowView};
use super::home_tree::HomeTree;
use super::howls::HowlCues;
use super::parallax::{LayerWidths, ParallaxField};
use super::player::{PlayerController, PlayerFrames, PlayerInput};
use super::scroll::ScrollState;
use super::spider::{SpiderFrames, SpiderSwarm};
use super::tuning::Level1Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level1SystemId {
    FogDrift,
    Player,
    ScrollResolve,
    Howls,
    HomeTree,
    Crows,
    Spiders,
}

impl Level1SystemId {
    pub fn name(self) -> &'static str {
        match self {
            Self::FogDrift => "FogDrift",
            Self::Player => "Player",
            Self::ScrollResolve => "ScrollResolve",
            Self::Howls => "Howls",
            Self::HomeTree => "HomeTree",
            Self::Crows => "Crows",
            Self::Spiders => "Spiders",
        }
    }
}

pub const LEVEL1_SYSTEM_ORDER: [Level1SystemId; 7] = [
    Level1SystemId::FogDrift,
    Level1SystemId::Player,
    Level1SystemId::ScrollResolve,
    Level1SystemId::Howls,
    Level1SystemId::HomeTree,
    Level1SystemId::Crows,
    Level1SystemId::Spiders,
];

pub const LEVEL1_SYSTEM_ORDER_TEXT: &str =
    "FogDrift>Player>ScrollResolve>Howls>HomeTree>Crows>Spiders";

/// Everything the level needs that comes from outside the simulation.
#[derive(Debug, Clone)]
pub struct Level1Setup {
    pub viewport: Viewport,
    pub tuning: Level1Tuning,
    pub hero: HeroStats,
    pub layer_widths: LayerWidths,
    pub player_frames: PlayerFrames,
    pub crow_frames: CrowFrames,
}

impl Level1Setup {
    /// Placeholder art sized like the real sprites; for tests and tools.
    pub fn headless(viewport: Viewport) -> Self {
        Self {
            viewport,
            tuning: Level1Tuning::default(),
            hero: HeroStats::default(),
            layer_widths: LayerWidths::uniform(viewport.width as f64),
            player_frames: PlayerFrames::placeholder(4, 120, 270),
            crow_frames: CrowFrames::placeholder(4, 60, 50),
        }
    }
}

/// One run of Level 1: world scroll, hero, landmarks and creatures.
#[derive(Debug, Clone)]
pub struct Level1Simulation {
    viewport: Viewport,
    rng: SmallRng,
    parallax: ParallaxField,
    scroll: ScrollState,
    player: PlayerController,
    home_tree: HomeTree,
    howls: HowlCues,
    crows: CrowFlock,
    spiders: SpiderSwarm,
    last_tick_order: Vec<Level1SystemId>,
    tick_count: u64,
}

impl Level1Simulation {
    pub fn new(setup: Level1Setup, mut rng: SmallRng) -> Self {
        let Level1Setup {
            viewport,
            tuning,
            hero,
            layer_widths,
            player_frames,
            crow_frames,
        } = setup;
        let parallax = ParallaxField::new(tuning.scroll, layer_widths, &mut rng);
        let crows = CrowFlock::new(tuning.crow, crow_frames, &mut rng);
        Self {
            viewport,
            parallax,
            scroll: ScrollState::new(tuning.scroll),
            player: PlayerController::new(&hero, viewport, player_frames, tuning.player),
            home_tree: HomeTree::default(),
            howls: HowlCues::default(),
            crows,
            spiders: SpiderSwarm::new(tuning.spider),
            last_tick_order: Vec::with_capacity(LEVEL1_SYSTEM_ORDER.len()),
            tick_count: 0,
            rng,
        }
    }

    pub fn spawn_initial_spiders(&mut self, frames_for: impl FnMut(f64) -> SpiderFrames) {
        self.spiders.spawn_initial(&mut self.rng, frames_for);
    }

    /// Puts the hero back on the spawn point without touching the world.
    pub fn reset_player(&mut self) {
        self.player.reset();
        debug!(x = self.player.x(), y = self.player.y(), "player_reset");
    }

    /// Back to the level start: world, hero position, landmarks and crows.
    /// Spiders are cleared; call [`Self::spawn_initial_spiders`] to repopulate.
    pub fn reset(&mut self, audio: &mut dyn AudioSink) {
        self.spiders.reset(audio);
        self.scroll.reset();
        self.parallax.reset(&mut self.rng);
        self.player.reset();
        self.home_tree.reset();
        self.howls.reset();
        self.crows.reset(&mut self.rng);
        self.last_tick_order.clear();
        self.tick_count = 0;
        info!("level1_reset");
    }

    pub fn stop_creature_sounds(&mut self, audio: &mut dyn AudioSink) {
        self.spiders.stop_all_sounds(audio);
    }

    pub fn resume_creature_sounds(&mut self, audio: &mut dyn AudioSink) {
        let hero_world_x = self.hero_world_x();
        let width = self.player.geometry().width;
        self.spiders.resume_all_sounds(audio, hero_world_x, width);
    }

    pub fn tick(&mut self, dt_ms: f64, input: &PlayerInput, audio: &mut dyn AudioSink) {
        self.last_tick_order.clear();
        for system_id in LEVEL1_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            self.run_system(system_id, dt_ms, input, &mut *audio);
        }
        self.tick_count += 1;
        if self.tick_count % 300 == 0 {
            debug!(
                tick = self.tick_count,
                offset = self.scroll.offset(),
                crows = self.crows.len(),
                spiders = self.spiders.len(),
                hp = self.player.hp().current(),
                "level1_tick"
            );
        }
    }

    fn run_system(
        &mut self,
        system_id: Level1SystemId,
        dt_ms: f64,
        input: &PlayerInput,
        audio: &mut dyn AudioSink,
    ) {
        match system_id {
            Level1SystemId::FogDrift => {
                self.parallax.drift_fog(dt_ms, &mut self.rng);
            }
            Level1SystemId::Player => {
                self.player.handle_input(input, dt_ms);
                self.player.update(dt_ms);
            }
            Level1SystemId::ScrollResolve => {
                let step = self.scroll.advance(
                    self.player.velocity_x(),
                    self.player.x(),
                    self.player.geometry().left_boundary,
                );
                self.player
                    .set_horizontal(step.player_screen_x, step.player_velocity_x);
                self.parallax.apply_scroll(step.delta);
            }
            Level1SystemId::Howls => {
                self.howls
                    .update(self.scroll.offset(), &mut self.rng, audio);
            }
            Level1SystemId::HomeTree => {
                let hero_world_x = self.hero_world_x();
                self.home_tree.update(hero_world_x);
            }
            Level1SystemId::Crows => {
                let hero_world_x = self.hero_world_x();
                let view = CrowView {
                    scroll_offset: self.scroll.offset(),
                    viewport: self.viewport,
                };
                let mut ctx = TickContext::new(dt_ms, &mut self.rng, audio);
                self.crows.update(&mut ctx, hero_world_x, &view);
            }
            Level1SystemId::Spiders => {
                let hero_world_x = self.hero_world_x();
                let player_width = self.player.geometry().width;
                let mut ctx = TickContext::new(dt_ms, &mut self.rng, audio);
                self.spiders
                    .update(&mut ctx, hero_world_x, player_width, &mut self.player);
            }
        }
    }

    /// Player's world position: screen x plus scroll offset.
    pub fn hero_world_x(&self) -> f64 {
        self.player.x() + self.scroll.offset()
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll.offset()
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn parallax(&self) -> &ParallaxField {
        &self.parallax
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn home_tree(&self) -> &HomeTree {
        &self.home_tree
    }

    pub fn howls(&self) -> &HowlCues {
        &self.howls
    }

    pub fn crows(&self) -> &CrowFlock {
        &self.crows
    }

    pub fn spiders(&self) -> &SpiderSwarm {
        &self.spiders
    }

    pub fn last_tick_order(&self) -> &[Level1SystemId] {
        &self.last_tick_order
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn system_order_text(&self) -> String {
        self.last_tick_order
            .iter()
            .map(|system_id| system_id.name())
            .collect::<Vec<_>>()
            .join(">")
    }

    #[cfg(test)]
    fn spiders_mut(&mut self) -> &mut SpiderSwarm {
        &mut self.spiders
    }
}
